//! The database facade: one connector, one schema model, one change set.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use relmap_core::{
    Entity, Error, FieldRef, InsertStatement, Result, SharedRecord, SqlType, StoreConnector,
    UpdateStatement, Value,
};
use relmap_schema::DatabaseModel;

use crate::config::DatabaseConfig;
use crate::plan::compute_save_order;
use crate::tableset::TableSet;
use crate::tracker::ChangeTracker;

/// Foreign-key assignments a pending insert needs before it runs: for each
/// node, the key column and the parent whose store key fills it.
type Wiring = Vec<Vec<(&'static str, SharedRecord)>>;

/// Foreign-key values overwritten while a batch ran, with the value each
/// field held before. Replayed in reverse when the batch rolls back.
type WiredKeys = Vec<(SharedRecord, &'static str, Value)>;

/// A live database: the declared model, a store connector, and the set of
/// tracked entities.
///
/// The database is single-threaded by design; entities are shared through
/// `Rc<RefCell<..>>` handles and every statement runs on the one connector,
/// blocking until the store answers.
pub struct Database<C> {
    config: DatabaseConfig,
    model: DatabaseModel,
    connector: RefCell<C>,
    tracker: RefCell<ChangeTracker>,
}

impl<C: StoreConnector> Database<C> {
    /// Validate `model`, open `connector`, and wrap them as a database.
    pub fn open(config: DatabaseConfig, model: DatabaseModel, mut connector: C) -> Result<Self> {
        model.validate()?;
        connector.open()?;
        info!(model = %model.name, version = %model.version, "database opened");
        Ok(Self {
            config,
            model,
            connector: RefCell::new(connector),
            tracker: RefCell::new(ChangeTracker::default()),
        })
    }

    /// The declared schema model.
    #[must_use]
    pub fn model(&self) -> &DatabaseModel {
        &self.model
    }

    /// The connection configuration.
    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The typed table set for `T`. Fails if the model does not declare
    /// `T`'s table.
    pub fn table<T: Entity>(&self) -> Result<TableSet<'_, T, C>> {
        if self.model.find_table(T::TABLE).is_none() {
            return Err(Error::UnknownTable(T::TABLE.to_string()));
        }
        Ok(TableSet::new(self))
    }

    /// Persist every tracked change as one atomic batch.
    ///
    /// Pending entities insert parents-first, each child receiving its
    /// parent's store key just before its own insert. Loaded entities with
    /// dirty fields update, touching only those fields. On any failure the
    /// batch rolls back, entities inserted so far return to the transient
    /// state, foreign keys wired during the batch return to their prior
    /// values, and dirty flags stay set so the next call retries the same
    /// changes.
    pub fn save_changes(&self) -> Result<()> {
        let (nodes, wiring, edges, updates) = self.collect_change_set();
        if nodes.is_empty() && updates.is_empty() {
            return Ok(());
        }
        let labels: Vec<&str> = nodes.iter().map(|n| n.borrow().table()).collect();
        let order = compute_save_order(&labels, &edges)?;
        debug!(
            inserts = nodes.len(),
            updates = updates.len(),
            "saving change set"
        );

        self.with_connector(StoreConnector::begin)?;
        let mut inserted: Vec<SharedRecord> = Vec::new();
        let mut wired: WiredKeys = Vec::new();
        let outcome = self
            .apply_change_set(&nodes, &wiring, &order, &updates, &mut inserted, &mut wired)
            .and_then(|()| self.with_connector(StoreConnector::commit));
        match outcome {
            Ok(()) => {
                for record in inserted.iter().chain(updates.iter()) {
                    record.borrow_mut().state_mut().clear_dirty();
                }
                let mut tracker = self.tracker.borrow_mut();
                tracker.promote_pending();
                tracker.purge();
                Ok(())
            }
            Err(error) => {
                if let Err(rollback_error) = self.with_connector(StoreConnector::rollback) {
                    warn!(error = %rollback_error, "rollback after failed save also failed");
                }
                for record in &inserted {
                    record.borrow_mut().state_mut().set_id(0);
                }
                for (record, foreign_key, prior) in wired.iter().rev() {
                    if let Err(restore_error) =
                        record.borrow_mut().set_field(foreign_key, prior.clone())
                    {
                        warn!(error = %restore_error, "failed to restore a wired foreign key");
                    }
                }
                Err(error)
            }
        }
    }

    /// Forget every loaded entity, so later queries re-fetch and later saves
    /// no longer see their field changes. Pending inserts are untouched.
    pub fn clean_up(&self) {
        self.tracker.borrow_mut().release_loaded();
    }

    /// Number of live tracked entities.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracker.borrow().len()
    }

    /// Close the connector. Tracked entities stay tracked; reopening is the
    /// connector's business.
    pub fn close(&self) -> Result<()> {
        self.connector.borrow_mut().close()
    }

    pub(crate) fn with_connector<R>(&self, f: impl FnOnce(&mut C) -> Result<R>) -> Result<R> {
        f(&mut self.connector.borrow_mut())
    }

    pub(crate) fn track_pending(&self, record: SharedRecord) {
        self.tracker.borrow_mut().track_pending(record);
    }

    pub(crate) fn track_loaded(&self, record: &SharedRecord) {
        self.tracker.borrow_mut().track_loaded(record);
    }

    /// Walk the tracked entities and their relation graphs, splitting the
    /// change set into pending inserts (with dependency edges and foreign
    /// key wiring) and dirty updates.
    fn collect_change_set(
        &self,
    ) -> (
        Vec<SharedRecord>,
        Wiring,
        Vec<(usize, usize)>,
        Vec<SharedRecord>,
    ) {
        let mut worklist: Vec<SharedRecord> = {
            let tracker = self.tracker.borrow();
            tracker
                .pending()
                .iter()
                .map(Rc::clone)
                .chain(tracker.live_loaded())
                .collect()
        };

        let mut visited: Vec<SharedRecord> = Vec::new();
        let mut nodes: Vec<SharedRecord> = Vec::new();
        let mut wiring: Wiring = Vec::new();
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut updates: Vec<SharedRecord> = Vec::new();

        while let Some(record) = worklist.pop() {
            if index_of(&visited, &record).is_some() {
                continue;
            }
            visited.push(Rc::clone(&record));

            let (transient, dirty, attachments) = {
                let r = record.borrow();
                (r.state().is_transient(), r.state().is_dirty(), r.children())
            };
            if transient {
                if index_of(&nodes, &record).is_none() {
                    nodes.push(Rc::clone(&record));
                    wiring.push(Vec::new());
                }
            } else if dirty {
                updates.push(Rc::clone(&record));
            }

            for attachment in attachments {
                for child in attachment.children {
                    if child.borrow().state().is_transient() {
                        let child_idx = match index_of(&nodes, &child) {
                            Some(idx) => idx,
                            None => {
                                nodes.push(Rc::clone(&child));
                                wiring.push(Vec::new());
                                nodes.len() - 1
                            }
                        };
                        wiring[child_idx].push((attachment.foreign_key, Rc::clone(&record)));
                        if transient {
                            if let Some(parent_idx) = index_of(&nodes, &record) {
                                edges.push((parent_idx, child_idx));
                            }
                        }
                    }
                    worklist.push(child);
                }
            }
        }
        (nodes, wiring, edges, updates)
    }

    fn apply_change_set(
        &self,
        nodes: &[SharedRecord],
        wiring: &Wiring,
        order: &[usize],
        updates: &[SharedRecord],
        inserted: &mut Vec<SharedRecord>,
        wired: &mut WiredKeys,
    ) -> Result<()> {
        for &idx in order {
            let record = &nodes[idx];
            for (foreign_key, parent) in &wiring[idx] {
                let parent_id = parent.borrow().id();
                let prior = record
                    .borrow()
                    .field_value(foreign_key)
                    .unwrap_or(Value::Null);
                wired.push((Rc::clone(record), *foreign_key, prior));
                record
                    .borrow_mut()
                    .set_field(foreign_key, Value::Int(parent_id))?;
            }
            let (table, values) = {
                let r = record.borrow();
                let row = r.to_row();
                let values: Vec<(String, Value)> = row
                    .columns()
                    .iter()
                    .cloned()
                    .zip(row.values().iter().cloned())
                    .collect();
                (r.table(), values)
            };
            let statement = InsertStatement {
                table: table.to_string(),
                values,
            };
            let key = self.with_connector(|c| c.insert(&statement))?;
            record.borrow_mut().state_mut().set_id(key);
            inserted.push(Rc::clone(record));
        }

        for record in updates {
            let (table, primary_key, id, assignments) = {
                let r = record.borrow();
                let row = r.to_row();
                let assignments: Vec<(String, Value)> = r
                    .state()
                    .dirty_fields()
                    .filter_map(|field| row.get(field).map(|v| (field.to_string(), v.clone())))
                    .collect();
                (r.table(), r.primary_key(), r.id(), assignments)
            };
            if assignments.is_empty() {
                continue;
            }
            let statement = UpdateStatement {
                table: table.to_string(),
                assignments,
                predicate: Some(FieldRef::named(table, primary_key, SqlType::BigInt).eq(id)),
            };
            self.with_connector(|c| c.update(&statement))?;
        }
        Ok(())
    }
}

fn index_of(list: &[SharedRecord], record: &SharedRecord) -> Option<usize> {
    list.iter().position(|item| Rc::ptr_eq(item, record))
}
