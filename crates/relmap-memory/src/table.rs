//! One in-memory table: rows keyed by a monotonically assigned primary key.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Timelike;

use relmap_core::{
    DeleteStatement, Error, Expr, OrderSpec, Projection, Result, Row, SelectStatement,
    UpdateStatement, Value,
};
use relmap_schema::TableModel;

use crate::eval::eval_predicate;

/// Table storage. Cloning a table clones its rows, which is what the
/// connector's snapshot transactions rely on.
#[derive(Debug, Clone)]
pub(crate) struct MemTable {
    name: String,
    primary_key: String,
    columns: Vec<String>,
    unique: Vec<String>,
    next_key: i64,
    rows: BTreeMap<i64, BTreeMap<String, Value>>,
}

impl MemTable {
    pub(crate) fn from_model(model: &TableModel) -> Result<Self> {
        let primary_key = model
            .primary_key()
            .ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "table `{}` has no single primary key",
                    model.name
                ))
            })?
            .name
            .clone();
        Ok(Self {
            name: model.name.clone(),
            primary_key,
            columns: model.fields.iter().map(|f| f.name.clone()).collect(),
            unique: model
                .fields
                .iter()
                .filter(|f| f.unique)
                .map(|f| f.name.clone())
                .collect(),
            next_key: 1,
            rows: BTreeMap::new(),
        })
    }

    pub(crate) fn insert(&mut self, values: &[(String, Value)]) -> Result<i64> {
        let mut row = BTreeMap::new();
        for (column, value) in values {
            if !self.columns.contains(column) {
                return Err(Error::schema_mismatch(&self.name, column));
            }
            row.insert(column.clone(), normalize(value.clone()));
        }
        for column in &self.columns {
            row.entry(column.clone()).or_insert(Value::Null);
        }
        self.check_unique(&row, None)?;

        let key = self.next_key;
        self.next_key += 1;
        row.insert(self.primary_key.clone(), Value::Int(key));
        self.rows.insert(key, row);
        Ok(key)
    }

    pub(crate) fn select(&self, statement: &SelectStatement) -> Result<Vec<Row>> {
        let mut keys = self.matching_keys(statement.predicate.as_ref());
        self.sort_keys(&mut keys, &statement.order);
        if let Some(limit) = statement.limit {
            keys.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        match &statement.projection {
            Projection::Count => {
                let mut row = Row::new();
                row.push("count", Value::Int(keys.len() as i64));
                Ok(vec![row])
            }
            Projection::Column(column) => {
                if !self.columns.contains(column) {
                    return Err(Error::schema_mismatch(&self.name, column));
                }
                Ok(keys
                    .iter()
                    .map(|key| {
                        let mut row = Row::new();
                        row.push(column.clone(), self.cell(*key, column));
                        row
                    })
                    .collect())
            }
            Projection::AllColumns => Ok(keys
                .iter()
                .map(|key| {
                    let mut row = Row::new();
                    for column in &self.columns {
                        row.push(column.clone(), self.cell(*key, column));
                    }
                    row
                })
                .collect()),
        }
    }

    pub(crate) fn update(&mut self, statement: &UpdateStatement) -> Result<u64> {
        for (column, _) in &statement.assignments {
            if !self.columns.contains(column) {
                return Err(Error::schema_mismatch(&self.name, column));
            }
        }
        let keys = self.matching_keys(statement.predicate.as_ref());
        for key in &keys {
            let mut candidate = self.rows[key].clone();
            for (column, value) in &statement.assignments {
                candidate.insert(column.clone(), normalize(value.clone()));
            }
            self.check_unique(&candidate, Some(*key))?;
            self.rows.insert(*key, candidate);
        }
        Ok(keys.len() as u64)
    }

    pub(crate) fn delete(&mut self, statement: &DeleteStatement) -> u64 {
        let keys = self.matching_keys(statement.predicate.as_ref());
        for key in &keys {
            self.rows.remove(key);
        }
        keys.len() as u64
    }

    fn matching_keys(&self, predicate: Option<&Expr>) -> Vec<i64> {
        self.rows
            .iter()
            .filter(|(_, row)| predicate.is_none_or(|p| eval_predicate(p, row)))
            .map(|(key, _)| *key)
            .collect()
    }

    /// Stable sort; rows that compare equal on every key keep insertion
    /// order. NULL sorts before every non-NULL value.
    fn sort_keys(&self, keys: &mut [i64], order: &OrderSpec) {
        if order.is_empty() {
            return;
        }
        keys.sort_by(|a, b| {
            for term in order.terms() {
                let left = self.cell(*a, term.field().name());
                let right = self.cell(*b, term.field().name());
                let ordering = match (left.is_null(), right.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
                };
                let ordering = match term.direction() {
                    relmap_core::Direction::Ascending => ordering,
                    relmap_core::Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    fn cell(&self, key: i64, column: &str) -> Value {
        self.rows
            .get(&key)
            .and_then(|row| row.get(column))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn check_unique(&self, candidate: &BTreeMap<String, Value>, own_key: Option<i64>) -> Result<()> {
        for column in &self.unique {
            let Some(value) = candidate.get(column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let taken = self.rows.iter().any(|(key, row)| {
                own_key != Some(*key)
                    && row.get(column).map(|v| v.compare(value)) == Some(Some(Ordering::Equal))
            });
            if taken {
                return Err(Error::ConstraintViolation(format!(
                    "duplicate value for unique column `{}.{}`",
                    self.name, column
                )));
            }
        }
        Ok(())
    }
}

/// Stored timestamps carry whole-second precision.
fn normalize(value: Value) -> Value {
    match value {
        Value::Timestamp(ts) => Value::Timestamp(ts.with_nanosecond(0).unwrap_or(ts)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use relmap_core::{FieldRef, SqlType};
    use relmap_schema::FieldModel;

    use super::*;

    fn table() -> MemTable {
        MemTable::from_model(
            &TableModel::new("post")
                .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                .field(FieldModel::new("title", SqlType::Text).unique())
                .field(FieldModel::new("points", SqlType::Integer).nullable()),
        )
        .unwrap()
    }

    fn points() -> FieldRef {
        FieldRef::new("post", "points", SqlType::Integer)
    }

    #[test]
    fn test_keys_are_monotonic() {
        let mut t = table();
        let a = t.insert(&[("title".to_string(), Value::from("a"))]).unwrap();
        let b = t.insert(&[("title".to_string(), Value::from("b"))]).unwrap();
        assert_eq!((a, b), (1, 2));

        t.delete(&DeleteStatement {
            table: "post".to_string(),
            predicate: None,
        });
        let c = t.insert(&[("title".to_string(), Value::from("c"))]).unwrap();
        assert_eq!(c, 3);
    }

    #[test]
    fn test_unique_violation() {
        let mut t = table();
        t.insert(&[("title".to_string(), Value::from("a"))]).unwrap();
        let err = t.insert(&[("title".to_string(), Value::from("a"))]);
        assert!(matches!(err, Err(Error::ConstraintViolation(_))));
    }

    #[test]
    fn test_timestamps_truncate_to_seconds() {
        let mut t = MemTable::from_model(
            &TableModel::new("post")
                .field(FieldModel::new("id", SqlType::BigInt).primary_key())
                .field(FieldModel::new("created", SqlType::Timestamp)),
        )
        .unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_milli_opt(9, 30, 0, 250)
            .unwrap();
        t.insert(&[("created".to_string(), Value::from(ts))]).unwrap();

        let rows = t.select(&SelectStatement::all("post")).unwrap();
        let stored = rows[0].get_timestamp("created").unwrap();
        assert_eq!(stored, ts.with_nanosecond(0).unwrap());
    }

    #[test]
    fn test_order_and_limit() {
        let mut t = table();
        for (title, pts) in [("a", Some(2i64)), ("b", None), ("c", Some(5))] {
            t.insert(&[
                ("title".to_string(), Value::from(title)),
                ("points".to_string(), Value::from(pts)),
            ])
            .unwrap();
        }
        let mut stmt = SelectStatement::all("post");
        stmt.order = OrderSpec::descending(points());
        stmt.limit = Some(2);
        let rows = t.select(&stmt).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_text("title").unwrap(), "c");
        assert_eq!(rows[1].get_text("title").unwrap(), "a");
    }
}
