//! Typed table sets: the entry point for appending and querying entities.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use relmap_core::{Entity, SharedRecord, StoreConnector};

use crate::database::Database;
use crate::query::Query;

/// A typed view of one table, borrowed from the database.
///
/// Appending hands ownership of the entity to the change set and returns a
/// shared handle; the entity stays pending until the next
/// [`Database::save_changes`].
pub struct TableSet<'db, T, C> {
    db: &'db Database<C>,
    _marker: PhantomData<fn() -> T>,
}

impl<'db, T: Entity, C: StoreConnector> TableSet<'db, T, C> {
    pub(crate) fn new(db: &'db Database<C>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// Track `entity` for insertion and return a shared handle to it.
    pub fn append(&self, entity: T) -> Rc<RefCell<T>> {
        let shared = Rc::new(RefCell::new(entity));
        self.append_shared(&shared);
        shared
    }

    /// Track an already-shared entity for insertion. Appending the same
    /// handle twice tracks it once.
    pub fn append_shared(&self, entity: &Rc<RefCell<T>>) {
        let record: SharedRecord = Rc::clone(entity) as SharedRecord;
        self.db.track_pending(record);
    }

    /// Start a query over this table.
    #[must_use]
    pub fn query(&self) -> Query<'db, T, C> {
        Query::new(self.db)
    }
}
