//! Result rows returned by a store connector.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::value::Value;

/// One row of a result set: ordered column names and their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from (column, value) pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.push(column, value);
        }
        row
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Column names, in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values, in result order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    fn require(&self, column: &str) -> Result<&Value> {
        self.get(column).ok_or_else(|| Error::MissingColumn {
            column: column.to_string(),
        })
    }

    /// Read a column as `i64`.
    pub fn get_i64(&self, column: &str) -> Result<i64> {
        self.require(column)?
            .as_i64()
            .ok_or_else(|| Error::TypeMismatch {
                column: column.to_string(),
                expected: "i64",
            })
    }

    /// Read a column as text.
    pub fn get_text(&self, column: &str) -> Result<String> {
        self.require(column)?
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| Error::TypeMismatch {
                column: column.to_string(),
                expected: "text",
            })
    }

    /// Read a nullable column as text.
    pub fn get_opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            _ => Err(Error::TypeMismatch {
                column: column.to_string(),
                expected: "text",
            }),
        }
    }

    /// Read a column as a timestamp.
    pub fn get_timestamp(&self, column: &str) -> Result<NaiveDateTime> {
        self.require(column)?
            .as_timestamp()
            .ok_or_else(|| Error::TypeMismatch {
                column: column.to_string(),
                expected: "timestamp",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::from_pairs([
            ("id".to_string(), Value::Int(7)),
            ("title".to_string(), Value::Text("hello".to_string())),
            ("body".to_string(), Value::Null),
        ])
    }

    #[test]
    fn test_typed_getters() {
        let row = sample();
        assert_eq!(row.get_i64("id").unwrap(), 7);
        assert_eq!(row.get_text("title").unwrap(), "hello");
        assert_eq!(row.get_opt_text("body").unwrap(), None);
    }

    #[test]
    fn test_missing_column() {
        let row = sample();
        assert!(matches!(
            row.get_i64("nope"),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let row = sample();
        assert!(matches!(
            row.get_text("id"),
            Err(Error::TypeMismatch { expected: "text", .. })
        ));
    }
}
