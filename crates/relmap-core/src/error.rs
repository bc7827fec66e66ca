//! Error types shared across the workspace.
//!
//! Build-time errors (`SchemaMismatch`, `RelationNotFound`) are reported
//! synchronously from the builder call that caused them. Execution-time
//! errors propagate from the execution or `save_changes` call; a write
//! failure is always surfaced to the caller, never logged and swallowed.

use thiserror::Error;

/// Result alias used throughout relmap.
pub type Result<T> = std::result::Result<T, Error>;

/// All error kinds produced by the core.
#[derive(Debug, Error)]
pub enum Error {
    /// A field reference does not belong to the table a query or expression
    /// was built against. Raised at build time, before execution.
    #[error("field `{field}` does not belong to table `{table}`")]
    SchemaMismatch {
        /// Table the query was built against.
        table: String,
        /// Offending field, qualified as `table.field`.
        field: String,
    },

    /// A join named a relation that is not declared on the target table.
    /// Raised at build time; never degrades to an unfiltered result set.
    #[error("no relation `{identifier}` is declared on table `{table}`")]
    RelationNotFound {
        /// Table whose relations were searched.
        table: String,
        /// The identifier that failed to resolve.
        identifier: String,
    },

    /// The store is unreachable, rejected the connection, or an operation
    /// was attempted on a closed connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A write violated a store-level constraint (e.g. uniqueness). The
    /// whole batch it belonged to has been rolled back.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Reserved for optimistic-concurrency support.
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),

    /// The change-set dependency graph contains a cycle; no valid save
    /// order exists.
    #[error("relation cycle detected at table `{0}`")]
    RelationCycle(String),

    /// A statement or query referenced a table the schema does not declare.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// A required column was absent from a result row.
    #[error("column `{column}` is missing from the result row")]
    MissingColumn {
        /// The column that was looked up.
        column: String,
    },

    /// A column value could not be read as the requested type.
    #[error("column `{column}` cannot be read as {expected}")]
    TypeMismatch {
        /// The column that was read.
        column: String,
        /// The type that was requested.
        expected: &'static str,
    },

    /// The schema's declared facts are inconsistent (missing primary key,
    /// dangling relation target, foreign key on the wrong side).
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A schema descriptor failed to parse or serialize.
    #[error("invalid schema descriptor: {0}")]
    Descriptor(String),
}

impl Error {
    /// Build a `SchemaMismatch` for a field used against the wrong table.
    pub fn schema_mismatch(table: impl Into<String>, field: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Build a `RelationNotFound` for a join identifier that failed to resolve.
    pub fn relation_not_found(table: impl Into<String>, identifier: impl Into<String>) -> Self {
        Error::RelationNotFound {
            table: table.into(),
            identifier: identifier.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::schema_mismatch("post", "comment.message");
        assert_eq!(
            err.to_string(),
            "field `comment.message` does not belong to table `post`"
        );

        let err = Error::relation_not_found("post", "Invalid_Class_Name");
        assert_eq!(
            err.to_string(),
            "no relation `Invalid_Class_Name` is declared on table `post`"
        );
    }
}
