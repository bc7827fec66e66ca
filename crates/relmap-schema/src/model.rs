//! The declared schema: fields, relations, tables, and the database model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use relmap_core::{Error, Result, SqlType};

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModel {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub sql_type: SqlType,
    /// Whether NULL is a legal value.
    #[serde(default)]
    pub nullable: bool,
    /// Whether this column is the table's primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether the store assigns the value on insert.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether values must be unique across the table.
    #[serde(default)]
    pub unique: bool,
}

impl FieldModel {
    /// A non-null, non-key column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
        }
    }

    /// Allow NULL.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as the primary key. Keys are store-assigned, so this implies
    /// auto-increment.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = true;
        self
    }

    /// Require values to be unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Which side of a relation a declaration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// Declared on the child: this table's `foreign_key` points at one row
    /// of the target table.
    ToOne,
    /// Declared on the parent: rows of the target table point back at this
    /// table through their `foreign_key` column.
    ToMany,
}

/// One declared relation between two tables.
///
/// The foreign key column always lives on the child table, whichever side
/// declares the relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationModel {
    /// Relation name, unique within the declaring table.
    pub name: String,
    /// Which side this declaration is.
    pub kind: RelationKind,
    /// The table on the other side.
    pub target_table: String,
    /// The foreign key column on the child table.
    pub foreign_key: String,
}

impl RelationModel {
    /// Declare, on a parent table, its collection of child rows.
    #[must_use]
    pub fn to_many(
        name: impl Into<String>,
        target_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ToMany,
            target_table: target_table.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// Declare, on a child table, its reference to a parent row.
    #[must_use]
    pub fn to_one(
        name: impl Into<String>,
        target_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ToOne,
            target_table: target_table.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// One declared table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableModel {
    /// Table name.
    pub name: String,
    /// Declared columns.
    pub fields: Vec<FieldModel>,
    /// Declared relations.
    #[serde(default)]
    pub relations: Vec<RelationModel>,
}

impl TableModel {
    /// An empty table declaration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Add a column.
    #[must_use]
    pub fn field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a relation.
    #[must_use]
    pub fn relation(mut self, relation: RelationModel) -> Self {
        self.relations.push(relation);
        self
    }

    /// Look up a column by name.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a relation by its name or by the name of the table on the
    /// other side.
    #[must_use]
    pub fn find_relation(&self, identifier: &str) -> Option<&RelationModel> {
        self.relations
            .iter()
            .find(|r| r.name == identifier || r.target_table == identifier)
    }

    /// The table's primary key column, if exactly one is declared.
    #[must_use]
    pub fn primary_key(&self) -> Option<&FieldModel> {
        let mut keys = self.fields.iter().filter(|f| f.primary_key);
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }
}

impl PartialEq for TableModel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && as_map(&self.fields, |f| &f.name) == as_map(&other.fields, |f| &f.name)
            && as_map(&self.relations, |r| &r.name) == as_map(&other.relations, |r| &r.name)
    }
}

impl Eq for TableModel {}

/// The declared shape of a whole store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseModel {
    /// Model name, typically the application's name.
    pub name: String,
    /// Declared schema version, advanced by the application when the shape
    /// changes.
    pub version: String,
    /// Declared tables.
    pub tables: Vec<TableModel>,
}

impl DatabaseModel {
    /// An empty model.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tables: Vec::new(),
        }
    }

    /// Add a table.
    #[must_use]
    pub fn table(mut self, table: TableModel) -> Self {
        self.tables.push(table);
        self
    }

    /// Look up a table by name.
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&TableModel> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Check the model's declared facts for internal consistency.
    ///
    /// Every table must declare exactly one primary key, every relation must
    /// target a declared table, and every foreign key column must exist on
    /// the child table.
    pub fn validate(&self) -> Result<()> {
        for table in &self.tables {
            let keys = table.fields.iter().filter(|f| f.primary_key).count();
            if keys != 1 {
                return Err(Error::InvalidSchema(format!(
                    "table `{}` declares {keys} primary keys, expected exactly 1",
                    table.name
                )));
            }
            for relation in &table.relations {
                let Some(target) = self.find_table(&relation.target_table) else {
                    return Err(Error::InvalidSchema(format!(
                        "relation `{}` on table `{}` targets undeclared table `{}`",
                        relation.name, table.name, relation.target_table
                    )));
                };
                let child = match relation.kind {
                    RelationKind::ToMany => target,
                    RelationKind::ToOne => table,
                };
                if child.find_field(&relation.foreign_key).is_none() {
                    return Err(Error::InvalidSchema(format!(
                        "relation `{}` on table `{}` names foreign key `{}`, which table `{}` does not declare",
                        relation.name, table.name, relation.foreign_key, child.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for DatabaseModel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && as_map(&self.tables, |t| &t.name) == as_map(&other.tables, |t| &t.name)
    }
}

impl Eq for DatabaseModel {}

fn as_map<'a, T, F>(items: &'a [T], key: F) -> BTreeMap<&'a str, &'a T>
where
    F: Fn(&'a T) -> &'a String,
{
    items.iter().map(|item| (key(item).as_str(), item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_table() -> TableModel {
        TableModel::new("post")
            .field(FieldModel::new("id", SqlType::BigInt).primary_key())
            .field(FieldModel::new("title", SqlType::Text))
            .field(FieldModel::new("body", SqlType::Text).nullable())
            .relation(RelationModel::to_many("comments", "comment", "post_id"))
    }

    fn comment_table() -> TableModel {
        TableModel::new("comment")
            .field(FieldModel::new("id", SqlType::BigInt).primary_key())
            .field(FieldModel::new("message", SqlType::Text))
            .field(FieldModel::new("post_id", SqlType::BigInt))
            .relation(RelationModel::to_one("post", "post", "post_id"))
    }

    fn model() -> DatabaseModel {
        DatabaseModel::new("weblog", "1.0")
            .table(post_table())
            .table(comment_table())
    }

    #[test]
    fn test_equality_ignores_declaration_order() {
        let forward = model();
        let mut shuffled = DatabaseModel::new("weblog", "1.0")
            .table(comment_table())
            .table(post_table());
        shuffled.tables[1].fields.reverse();
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_equality_respects_content() {
        let mut other = model();
        other.tables[0].fields[1].nullable = true;
        assert_ne!(model(), other);
    }

    #[test]
    fn test_find_relation_by_name_or_target() {
        let table = post_table();
        assert!(table.find_relation("comments").is_some());
        assert!(table.find_relation("comment").is_some());
        assert!(table.find_relation("Invalid_Class_Name").is_none());
    }

    #[test]
    fn test_validate_accepts_consistent_model() {
        assert!(model().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_one_primary_key() {
        let bad = DatabaseModel::new("weblog", "1.0")
            .table(TableModel::new("post").field(FieldModel::new("title", SqlType::Text)));
        assert!(matches!(bad.validate(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_validate_requires_foreign_key_on_child() {
        let mut bad = model();
        bad.tables[0].relations[0].foreign_key = "missing".to_string();
        assert!(matches!(bad.validate(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_validate_rejects_dangling_target() {
        let bad = DatabaseModel::new("weblog", "1.0").table(
            TableModel::new("post")
                .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                .relation(RelationModel::to_many("comments", "comment", "post_id")),
        );
        assert!(matches!(bad.validate(), Err(Error::InvalidSchema(_))));
    }
}
