//! The typed query builder.
//!
//! A query is built in two phases. Builder calls (`filter`, `join`,
//! `order_by`) validate their arguments against the schema model and fail
//! immediately on a mistyped field or an undeclared relation; nothing
//! reaches the store until a terminal call (`to_list`, `first`, `count`,
//! `select`, `remove`) runs.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::debug;

use relmap_core::{
    DeleteStatement, Entity, Error, Expr, FieldRef, OrderSpec, Projection, Record, Result,
    SelectStatement, SharedRecord, SqlType, StoreConnector, Value,
};
use relmap_schema::{RelationKind, RelationModel, TableModel};

use crate::database::Database;

/// A query over the table mapped by `T`.
pub struct Query<'db, T, C> {
    db: &'db Database<C>,
    predicate: Option<Expr>,
    order: OrderSpec,
    limit: Option<u64>,
    joins: Vec<RelationModel>,
    _marker: PhantomData<fn() -> T>,
}

impl<'db, T: Entity, C: StoreConnector> Query<'db, T, C> {
    pub(crate) fn new(db: &'db Database<C>) -> Self {
        Self {
            db,
            predicate: None,
            order: OrderSpec::new(),
            limit: None,
            joins: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Set the predicate, replacing any previous one. Conjunction and
    /// disjunction are composed on the expression itself (`Expr::and`,
    /// `Expr::or`) before the call.
    ///
    /// Every field the expression references must belong to `T`'s table and
    /// exist in the model; otherwise `Error::SchemaMismatch` is returned here,
    /// before anything executes.
    pub fn filter(mut self, expr: Expr) -> Result<Self> {
        for field in expr.fields() {
            self.check_field(field)?;
        }
        self.predicate = Some(expr);
        Ok(self)
    }

    /// Eagerly load a declared relation alongside the results.
    ///
    /// `identifier` is the relation's name or the name of the table on the
    /// other side. An identifier that resolves to nothing is
    /// `Error::RelationNotFound`; it never degrades to an unjoined query.
    pub fn join(mut self, identifier: &str) -> Result<Self> {
        let relation = self
            .table_model()?
            .find_relation(identifier)
            .cloned()
            .ok_or_else(|| Error::relation_not_found(T::TABLE, identifier))?;
        if !self.joins.iter().any(|r| r.name == relation.name) {
            self.joins.push(relation);
        }
        Ok(self)
    }

    /// Set the sort order, replacing any previous one. Tie-break keys are
    /// composed on the `OrderSpec` itself (`then_by`) before the call.
    pub fn order_by(mut self, order: impl Into<OrderSpec>) -> Result<Self> {
        let order = order.into();
        for term in order.terms() {
            self.check_field(term.field())?;
        }
        self.order = order;
        Ok(self)
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Execute and return shared handles to the matching entities, joined
    /// relations populated. The handles are tracked, so later field changes
    /// are picked up by `save_changes`.
    pub fn to_list(&self) -> Result<Vec<Rc<RefCell<T>>>> {
        let entities = self.fetch(self.limit)?;
        Ok(entities.into_iter().map(|e| self.track(e)).collect())
    }

    /// Execute with a limit of one and return the first match, if any.
    pub fn first(&self) -> Result<Option<Rc<RefCell<T>>>> {
        let entities = self.fetch(Some(1))?;
        Ok(entities.into_iter().next().map(|e| self.track(e)))
    }

    /// Count the matching rows without materializing them.
    pub fn count(&self) -> Result<u64> {
        let mut statement = self.build_select(None);
        statement.projection = Projection::Count;
        let rows = self.db.with_connector(|c| c.select(&statement))?;
        let count = rows
            .first()
            .ok_or_else(|| Error::MissingColumn {
                column: "count".to_string(),
            })?
            .get_i64("count")?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Project a single field from the matching rows.
    pub fn select(&self, field: FieldRef) -> Result<Vec<Value>> {
        self.check_field(&field)?;
        let mut statement = self.build_select(self.limit);
        statement.projection = Projection::Column(field.name().to_string());
        let rows = self.db.with_connector(|c| c.select(&statement))?;
        Ok(rows
            .into_iter()
            .map(|row| row.get(field.name()).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Delete the matching rows immediately and return how many went away.
    /// This bypasses the change set; no `save_changes` call is involved.
    pub fn remove(&self) -> Result<u64> {
        let statement = DeleteStatement {
            table: T::TABLE.to_string(),
            predicate: self.predicate.clone(),
        };
        debug!(sql = %statement.to_sql(), "remove");
        self.db.with_connector(|c| c.delete(&statement))
    }

    /// The statements this query would run, as SQL text. For logging and
    /// debugging; the text is never executed.
    #[must_use]
    pub fn sql_command(&self) -> String {
        let mut parts = vec![self.build_select(self.limit).to_sql()];
        if let Ok(table) = self.table_model() {
            if let Some(pk) = table.primary_key() {
                for relation in &self.joins {
                    let (inner_column, outer_column) = match relation.kind {
                        RelationKind::ToMany => (pk.name.clone(), relation.foreign_key.clone()),
                        RelationKind::ToOne => (relation.foreign_key.clone(), pk.name.clone()),
                    };
                    let mut inner = self.build_select(None);
                    inner.projection = Projection::Column(inner_column);
                    parts.push(format!(
                        "SELECT * FROM {target} WHERE {target}.{outer_column} IN ({})",
                        inner.to_sql(),
                        target = relation.target_table,
                    ));
                }
            }
        }
        parts.join("; ")
    }

    fn table_model(&self) -> Result<&'db TableModel> {
        self.db
            .model()
            .find_table(T::TABLE)
            .ok_or_else(|| Error::UnknownTable(T::TABLE.to_string()))
    }

    fn check_field(&self, field: &FieldRef) -> Result<()> {
        if field.table() != T::TABLE {
            return Err(Error::schema_mismatch(T::TABLE, field.qualified()));
        }
        if self.table_model()?.find_field(field.name()).is_none() {
            return Err(Error::schema_mismatch(T::TABLE, field.qualified()));
        }
        Ok(())
    }

    fn build_select(&self, limit: Option<u64>) -> SelectStatement {
        SelectStatement {
            table: T::TABLE.to_string(),
            projection: Projection::AllColumns,
            predicate: self.predicate.clone(),
            order: self.order.clone(),
            limit,
        }
    }

    fn fetch(&self, limit: Option<u64>) -> Result<Vec<T>> {
        let statement = self.build_select(limit);
        debug!(sql = %statement.to_sql(), "select");
        let rows = self.db.with_connector(|c| c.select(&statement))?;
        let mut entities: Vec<T> = rows.iter().map(T::from_row).collect::<Result<_>>()?;
        self.eager_load(&mut entities)?;
        Ok(entities)
    }

    /// Fetch each joined relation in one keyed follow-up select and let the
    /// entities claim their own rows.
    fn eager_load(&self, entities: &mut [T]) -> Result<()> {
        for relation in &self.joins {
            let rows = match relation.kind {
                RelationKind::ToMany => {
                    let ids: Vec<i64> = entities.iter().map(Record::id).collect();
                    if ids.is_empty() {
                        continue;
                    }
                    let foreign_key = FieldRef::named(
                        relation.target_table.clone(),
                        relation.foreign_key.clone(),
                        SqlType::BigInt,
                    );
                    let statement = SelectStatement {
                        table: relation.target_table.clone(),
                        projection: Projection::AllColumns,
                        predicate: Some(foreign_key.in_values(ids)),
                        order: OrderSpec::new(),
                        limit: None,
                    };
                    self.db.with_connector(|c| c.select(&statement))?
                }
                RelationKind::ToOne => {
                    let mut keys: Vec<i64> = entities
                        .iter()
                        .filter_map(|e| e.field_value(&relation.foreign_key))
                        .filter_map(|v| v.as_i64())
                        .collect();
                    keys.sort_unstable();
                    keys.dedup();
                    if keys.is_empty() {
                        continue;
                    }
                    let target = self
                        .db
                        .model()
                        .find_table(&relation.target_table)
                        .ok_or_else(|| Error::UnknownTable(relation.target_table.clone()))?;
                    let pk = target.primary_key().ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "table `{}` has no single primary key",
                            target.name
                        ))
                    })?;
                    let pk_field = FieldRef::named(
                        relation.target_table.clone(),
                        pk.name.clone(),
                        SqlType::BigInt,
                    );
                    let statement = SelectStatement {
                        table: relation.target_table.clone(),
                        projection: Projection::AllColumns,
                        predicate: Some(pk_field.in_values(keys)),
                        order: OrderSpec::new(),
                        limit: None,
                    };
                    self.db.with_connector(|c| c.select(&statement))?
                }
            };
            for entity in entities.iter_mut() {
                entity.load_related(&relation.name, &rows)?;
            }
        }
        Ok(())
    }

    fn track(&self, entity: T) -> Rc<RefCell<T>> {
        let shared = Rc::new(RefCell::new(entity));
        let record: SharedRecord = Rc::clone(&shared) as SharedRecord;
        self.db.track_loaded(&record);
        shared
    }
}
