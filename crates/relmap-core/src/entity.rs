//! The entity runtime: identity, dirty tracking, and the traits mapped
//! types implement.
//!
//! An entity is transient until its first successful save assigns a store
//! key. Field setters mark the field dirty; the persistence engine reads the
//! dirty set to build minimal updates and clears it after a commit.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::Result;
use crate::relation::ChildAttachment;
use crate::row::Row;
use crate::value::Value;

/// A type-erased, shared handle to a tracked entity.
pub type SharedRecord = Rc<RefCell<dyn Record>>;

/// Identity and change state carried by every entity.
///
/// A key of zero means transient: the entity has never been stored. Any
/// other value is the store-assigned primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityState {
    id: i64,
    dirty: BTreeSet<&'static str>,
}

impl EntityState {
    /// State for a freshly constructed, unstored entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The store key, or zero if transient.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Assign the store key. Passing zero returns the entity to the
    /// transient state (used when a failed batch is rolled back).
    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    /// True if the entity has never been stored.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.id == 0
    }

    /// Record that a field changed since the last save.
    pub fn mark_dirty(&mut self, field: &'static str) {
        self.dirty.insert(field);
    }

    /// True if any field changed since the last save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// The changed fields, in name order.
    pub fn dirty_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.dirty.iter().copied()
    }

    /// Forget all recorded changes. Called after a successful commit.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

/// The object-safe half of the entity contract.
///
/// The persistence engine works against `dyn Record` so one change set can
/// hold entities of different types. Implementations are usually written
/// alongside the typed [`Entity`] impl.
pub trait Record {
    /// The table this entity maps to.
    fn table(&self) -> &'static str;

    /// The primary key column.
    fn primary_key(&self) -> &'static str;

    /// Identity and dirty state, read side.
    fn state(&self) -> &EntityState;

    /// Identity and dirty state, write side.
    fn state_mut(&mut self) -> &mut EntityState;

    /// The entity's data columns as a row. The primary key is excluded; it
    /// lives in [`EntityState`], not in the row.
    fn to_row(&self) -> Row;

    /// Overwrite one field by column name. The engine uses this to wire
    /// foreign keys into children before their insert. Does not mark the
    /// field dirty.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// The child collections reachable from this entity, with the foreign
    /// key column each child stores.
    fn children(&self) -> Vec<ChildAttachment> {
        Vec::new()
    }

    /// The store key, or zero if transient.
    fn id(&self) -> i64 {
        self.state().id()
    }

    /// Read one data column by name.
    fn field_value(&self, name: &str) -> Option<Value> {
        self.to_row().get(name).cloned()
    }
}

/// The typed half of the entity contract.
///
/// Adds what the query layer needs and `dyn Record` cannot carry: the table
/// name as a constant, row materialization, and relation population for
/// eager loads.
pub trait Entity: Record + Sized + 'static {
    /// The table this entity maps to.
    const TABLE: &'static str;

    /// Materialize an entity from a result row. The returned entity is
    /// clean: its key is taken from the row and no field is dirty.
    fn from_row(row: &Row) -> Result<Self>;

    /// Populate a relation collection from eagerly fetched child rows.
    /// `relation` is the relation's declared name; rows not belonging to
    /// this entity must be skipped by the implementation.
    fn load_related(&mut self, relation: &str, rows: &[Row]) -> Result<()> {
        let _ = (relation, rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_until_keyed() {
        let mut state = EntityState::new();
        assert!(state.is_transient());
        state.set_id(12);
        assert!(!state.is_transient());
        state.set_id(0);
        assert!(state.is_transient());
    }

    #[test]
    fn test_dirty_set_is_ordered_and_deduped() {
        let mut state = EntityState::new();
        state.mark_dirty("title");
        state.mark_dirty("body");
        state.mark_dirty("title");
        let fields: Vec<&str> = state.dirty_fields().collect();
        assert_eq!(fields, vec!["body", "title"]);
        state.clear_dirty();
        assert!(!state.is_dirty());
    }
}
