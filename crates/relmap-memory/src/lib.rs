//! In-memory store connector.
//!
//! `MemoryConnector` implements [`StoreConnector`] over plain `BTreeMap`
//! storage. It honors the full connector contract: schema-checked
//! statements, monotonic key assignment, unique-column enforcement,
//! whole-second timestamp precision, and atomic write batches via
//! whole-store snapshots. It exists for tests and for applications that
//! want the mapping layer without an external database.

mod eval;
mod table;

use std::collections::BTreeMap;

use tracing::debug;

use relmap_core::{
    DeleteStatement, Error, InsertStatement, Result, Row, SelectStatement, StoreConnector,
    UpdateStatement,
};
use relmap_schema::DatabaseModel;

use crate::table::MemTable;

/// A store held entirely in memory, shaped by a schema model at
/// construction.
#[derive(Debug)]
pub struct MemoryConnector {
    tables: BTreeMap<String, MemTable>,
    open: bool,
    snapshot: Option<BTreeMap<String, MemTable>>,
}

impl MemoryConnector {
    /// Build an empty store shaped like `model`. The model is validated
    /// first; an inconsistent model is rejected here rather than surfacing
    /// later as a statement error.
    pub fn new(model: &DatabaseModel) -> Result<Self> {
        model.validate()?;
        let mut tables = BTreeMap::new();
        for table in &model.tables {
            tables.insert(table.name.clone(), MemTable::from_model(table)?);
        }
        Ok(Self {
            tables,
            open: false,
            snapshot: None,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::Connection("connection is closed".to_string()))
        }
    }

    fn table(&self, name: &str) -> Result<&MemTable> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }
}

impl StoreConnector for MemoryConnector {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.snapshot = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn select(&mut self, statement: &SelectStatement) -> Result<Vec<Row>> {
        self.ensure_open()?;
        debug!(sql = %statement.to_sql(), "select");
        self.table(&statement.table)?.select(statement)
    }

    fn insert(&mut self, statement: &InsertStatement) -> Result<i64> {
        self.ensure_open()?;
        debug!(sql = %statement.to_sql(), "insert");
        self.table_mut(&statement.table)?.insert(&statement.values)
    }

    fn update(&mut self, statement: &UpdateStatement) -> Result<u64> {
        self.ensure_open()?;
        debug!(sql = %statement.to_sql(), "update");
        self.table_mut(&statement.table)?.update(statement)
    }

    fn delete(&mut self, statement: &DeleteStatement) -> Result<u64> {
        self.ensure_open()?;
        debug!(sql = %statement.to_sql(), "delete");
        Ok(self.table_mut(&statement.table)?.delete(statement))
    }

    fn begin(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.snapshot.is_some() {
            return Err(Error::Connection(
                "a transaction is already in progress".to_string(),
            ));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.snapshot.take().is_none() {
            return Err(Error::Connection("no transaction in progress".to_string()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        match self.snapshot.take() {
            Some(snapshot) => {
                self.tables = snapshot;
                Ok(())
            }
            None => Err(Error::Connection("no transaction in progress".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use relmap_core::{SqlType, Value};
    use relmap_schema::{FieldModel, TableModel};

    use super::*;

    fn model() -> DatabaseModel {
        DatabaseModel::new("weblog", "1.0").table(
            TableModel::new("post")
                .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                .field(FieldModel::new("title", SqlType::Text)),
        )
    }

    fn insert_title(title: &str) -> InsertStatement {
        InsertStatement {
            table: "post".to_string(),
            values: vec![("title".to_string(), Value::from(title))],
        }
    }

    #[test]
    fn test_closed_connection_rejects_statements() {
        let mut conn = MemoryConnector::new(&model()).unwrap();
        assert!(matches!(
            conn.select(&SelectStatement::all("post")),
            Err(Error::Connection(_))
        ));
        conn.open().unwrap();
        assert!(conn.select(&SelectStatement::all("post")).is_ok());
        conn.close().unwrap();
        assert!(!conn.is_open());
    }

    #[test]
    fn test_unknown_table() {
        let mut conn = MemoryConnector::new(&model()).unwrap();
        conn.open().unwrap();
        assert!(matches!(
            conn.select(&SelectStatement::all("nope")),
            Err(Error::UnknownTable(_))
        ));
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut conn = MemoryConnector::new(&model()).unwrap();
        conn.open().unwrap();
        conn.insert(&insert_title("kept")).unwrap();

        conn.begin().unwrap();
        conn.insert(&insert_title("discarded")).unwrap();
        conn.rollback().unwrap();

        let rows = conn.select(&SelectStatement::all("post")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_text("title").unwrap(), "kept");
    }

    #[test]
    fn test_commit_keeps_writes() {
        let mut conn = MemoryConnector::new(&model()).unwrap();
        conn.open().unwrap();
        conn.begin().unwrap();
        conn.insert(&insert_title("a")).unwrap();
        conn.commit().unwrap();
        let rows = conn.select(&SelectStatement::all("post")).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_unbalanced_transaction_calls() {
        let mut conn = MemoryConnector::new(&model()).unwrap();
        conn.open().unwrap();
        assert!(conn.commit().is_err());
        assert!(conn.rollback().is_err());
        conn.begin().unwrap();
        assert!(conn.begin().is_err());
    }
}
