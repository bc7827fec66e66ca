//! Structured statements handed to a store connector.
//!
//! A statement is plain data: a table name, an optional predicate tree, and
//! the operation-specific pieces. Connectors interpret it natively; the
//! `to_sql` renderings exist for logging and for `sql_command` previews and
//! are never parsed back.

use crate::expr::Expr;
use crate::order::OrderSpec;
use crate::value::Value;

/// What a select returns per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Every column of the table.
    #[default]
    AllColumns,
    /// A single named column.
    Column(String),
    /// `COUNT(*)` over the matching rows.
    Count,
}

/// A read over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Target table.
    pub table: String,
    /// Returned columns.
    pub projection: Projection,
    /// Row filter; `None` selects everything.
    pub predicate: Option<Expr>,
    /// Sort keys.
    pub order: OrderSpec,
    /// Maximum number of rows; `None` is unbounded.
    pub limit: Option<u64>,
}

impl SelectStatement {
    /// Select all columns of `table`, unfiltered.
    #[must_use]
    pub fn all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: Projection::AllColumns,
            predicate: None,
            order: OrderSpec::new(),
            limit: None,
        }
    }

    /// Render as SQL text. Diagnostics only.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let columns = match &self.projection {
            Projection::AllColumns => "*".to_string(),
            Projection::Column(name) => name.clone(),
            Projection::Count => "COUNT(*)".to_string(),
        };
        let mut sql = format!("SELECT {columns} FROM {}", self.table);
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.to_sql());
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.to_sql());
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }
}

/// An insert of one row. The primary key is never listed; the store assigns
/// it and reports it back.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table.
    pub table: String,
    /// Column/value pairs for the new row.
    pub values: Vec<(String, Value)>,
}

impl InsertStatement {
    /// Render as SQL text. Diagnostics only.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let columns: Vec<&str> = self.values.iter().map(|(c, _)| c.as_str()).collect();
        let literals: Vec<String> = self
            .values
            .iter()
            .map(|(_, v)| v.to_sql_literal())
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            literals.join(", ")
        )
    }
}

/// An update of the matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: String,
    /// Column/value assignments.
    pub assignments: Vec<(String, Value)>,
    /// Row filter; `None` updates everything.
    pub predicate: Option<Expr>,
}

impl UpdateStatement {
    /// Render as SQL text. Diagnostics only.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(c, v)| format!("{c} = {}", v.to_sql_literal()))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, sets.join(", "));
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.to_sql());
        }
        sql
    }
}

/// A delete of the matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table.
    pub table: String,
    /// Row filter; `None` deletes everything.
    pub predicate: Option<Expr>,
}

impl DeleteStatement {
    /// Render as SQL text. Diagnostics only.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = format!("DELETE FROM {}", self.table);
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.to_sql());
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::FieldRef;
    use crate::types::SqlType;

    fn post_id() -> FieldRef {
        FieldRef::new("post", "id", SqlType::BigInt)
    }

    #[test]
    fn test_select_rendering() {
        let mut stmt = SelectStatement::all("post");
        stmt.predicate = Some(post_id().gt(3));
        stmt.order = OrderSpec::by(post_id());
        stmt.limit = Some(5);
        assert_eq!(
            stmt.to_sql(),
            "SELECT * FROM post WHERE post.id > 3 ORDER BY post.id ASC LIMIT 5"
        );

        let mut count = SelectStatement::all("post");
        count.projection = Projection::Count;
        assert_eq!(count.to_sql(), "SELECT COUNT(*) FROM post");
    }

    #[test]
    fn test_insert_rendering() {
        let stmt = InsertStatement {
            table: "post".to_string(),
            values: vec![
                ("title".to_string(), Value::from("hello")),
                ("is_public".to_string(), Value::from(true)),
            ],
        };
        assert_eq!(
            stmt.to_sql(),
            "INSERT INTO post (title, is_public) VALUES ('hello', TRUE)"
        );
    }

    #[test]
    fn test_update_and_delete_rendering() {
        let update = UpdateStatement {
            table: "post".to_string(),
            assignments: vec![("title".to_string(), Value::from("new"))],
            predicate: Some(post_id().eq(1)),
        };
        assert_eq!(
            update.to_sql(),
            "UPDATE post SET title = 'new' WHERE post.id = 1"
        );

        let delete = DeleteStatement {
            table: "post".to_string(),
            predicate: None,
        };
        assert_eq!(delete.to_sql(), "DELETE FROM post");
    }
}
