//! Structural diff between two schema models.
//!
//! The diff lists what must change to take a store shaped like `self` to the
//! shape of `target`. Changes come out in a deterministic order: tables by
//! name, then fields by name within each table.

use std::collections::BTreeMap;

use crate::model::{DatabaseModel, FieldModel, TableModel};

/// One step of a schema migration.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaChange {
    /// The target declares a table the source does not.
    CreateTable(TableModel),
    /// The source declares a table the target does not.
    DropTable(String),
    /// The target adds a column to an existing table.
    AddField {
        /// Owning table.
        table: String,
        /// The added column.
        field: FieldModel,
    },
    /// The target removes a column from an existing table.
    DropField {
        /// Owning table.
        table: String,
        /// Name of the removed column.
        field: String,
    },
    /// A column exists on both sides with different declared facts.
    AlterField {
        /// Owning table.
        table: String,
        /// The column's declaration on the target side.
        field: FieldModel,
    },
}

impl DatabaseModel {
    /// Compute the changes that take this model to `target`.
    #[must_use]
    pub fn diff(&self, target: &DatabaseModel) -> Vec<SchemaChange> {
        let from: BTreeMap<&str, &TableModel> =
            self.tables.iter().map(|t| (t.name.as_str(), t)).collect();
        let to: BTreeMap<&str, &TableModel> =
            target.tables.iter().map(|t| (t.name.as_str(), t)).collect();

        let mut changes = Vec::new();
        for (name, table) in &to {
            match from.get(name) {
                None => changes.push(SchemaChange::CreateTable((*table).clone())),
                Some(existing) => diff_tables(existing, table, &mut changes),
            }
        }
        for name in from.keys() {
            if !to.contains_key(name) {
                changes.push(SchemaChange::DropTable((*name).to_string()));
            }
        }
        changes
    }
}

fn diff_tables(from: &TableModel, to: &TableModel, changes: &mut Vec<SchemaChange>) {
    let existing: BTreeMap<&str, &FieldModel> =
        from.fields.iter().map(|f| (f.name.as_str(), f)).collect();
    let wanted: BTreeMap<&str, &FieldModel> =
        to.fields.iter().map(|f| (f.name.as_str(), f)).collect();

    for (name, field) in &wanted {
        match existing.get(name) {
            None => changes.push(SchemaChange::AddField {
                table: to.name.clone(),
                field: (*field).clone(),
            }),
            Some(current) if current != field => changes.push(SchemaChange::AlterField {
                table: to.name.clone(),
                field: (*field).clone(),
            }),
            Some(_) => {}
        }
    }
    for name in existing.keys() {
        if !wanted.contains_key(name) {
            changes.push(SchemaChange::DropField {
                table: to.name.clone(),
                field: (*name).to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use relmap_core::SqlType;

    use super::*;

    fn v1() -> DatabaseModel {
        DatabaseModel::new("weblog", "1.0").table(
            TableModel::new("post")
                .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                .field(FieldModel::new("title", SqlType::Text)),
        )
    }

    #[test]
    fn test_identical_models_diff_empty() {
        assert!(v1().diff(&v1()).is_empty());
    }

    #[test]
    fn test_added_table_and_field() {
        let v2 = DatabaseModel::new("weblog", "2.0")
            .table(
                TableModel::new("post")
                    .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                    .field(FieldModel::new("title", SqlType::Text))
                    .field(FieldModel::new("points", SqlType::Integer)),
            )
            .table(
                TableModel::new("comment")
                    .field(FieldModel::new("id", SqlType::BigInt).primary_key()),
            );
        let changes = v1().diff(&v2);
        assert_eq!(changes.len(), 2);
        assert!(matches!(
            &changes[0],
            SchemaChange::CreateTable(t) if t.name == "comment"
        ));
        assert!(matches!(
            &changes[1],
            SchemaChange::AddField { table, field } if table == "post" && field.name == "points"
        ));
    }

    #[test]
    fn test_dropped_and_altered() {
        let v2 = DatabaseModel::new("weblog", "2.0").table(
            TableModel::new("post")
                .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                .field(FieldModel::new("title", SqlType::Text).nullable()),
        );
        let changes = v1().diff(&v2);
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            &changes[0],
            SchemaChange::AlterField { field, .. } if field.nullable
        ));

        let dropped = v2.diff(&v1());
        assert!(matches!(
            &dropped[0],
            SchemaChange::AlterField { field, .. } if !field.nullable
        ));
    }
}
