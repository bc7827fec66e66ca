//! Declared SQL types for schema fields.

use serde::{Deserialize, Serialize};

/// The declared type of a schema field.
///
/// This is deliberately a small set: the core only needs enough type
/// information to validate expressions and render diagnostics. Dialect
/// mapping belongs to the store connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Boolean flag.
    Boolean,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer. Primary keys use this.
    BigInt,
    /// Double-precision float.
    Double,
    /// Unbounded text.
    Text,
    /// Date and time, whole-second precision once persisted.
    Timestamp,
}

impl SqlType {
    /// Canonical SQL name, used only for diagnostics.
    #[must_use]
    pub const fn sql_name(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Text => "TEXT",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_names() {
        assert_eq!(SqlType::BigInt.sql_name(), "BIGINT");
        assert_eq!(SqlType::Timestamp.sql_name(), "TIMESTAMP");
    }
}
