//! Change tracking for the persistence engine.
//!
//! The tracker holds two lists: owning handles to entities appended but not
//! yet stored, and weak handles to entities handed out by queries. Weak
//! tracking means the tracker never keeps a loaded entity alive; once the
//! caller drops its handle, the entity silently leaves the change set.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use relmap_core::{Record, SharedRecord};

#[derive(Default)]
pub(crate) struct ChangeTracker {
    pending: Vec<SharedRecord>,
    loaded: Vec<Weak<RefCell<dyn Record>>>,
}

impl ChangeTracker {
    /// Register an entity awaiting its first insert. Registering the same
    /// handle twice is a no-op.
    pub(crate) fn track_pending(&mut self, record: SharedRecord) {
        if !self.pending.iter().any(|p| Rc::ptr_eq(p, &record)) {
            self.pending.push(record);
        }
    }

    /// Register a query-loaded entity for dirty-update discovery.
    pub(crate) fn track_loaded(&mut self, record: &SharedRecord) {
        if !self
            .loaded
            .iter()
            .any(|w| w.upgrade().is_some_and(|r| Rc::ptr_eq(&r, record)))
        {
            self.loaded.push(Rc::downgrade(record));
        }
    }

    /// Owning handles to the entities awaiting insert.
    pub(crate) fn pending(&self) -> &[SharedRecord] {
        &self.pending
    }

    /// Loaded entities still alive in the caller's hands.
    pub(crate) fn live_loaded(&self) -> Vec<SharedRecord> {
        self.loaded.iter().filter_map(Weak::upgrade).collect()
    }

    /// Move the pending entities into the loaded list. Called after a
    /// successful commit, when every pending entity holds a store key.
    pub(crate) fn promote_pending(&mut self) {
        for record in self.pending.drain(..) {
            self.loaded.push(Rc::downgrade(&record));
        }
    }

    /// Drop weak handles whose entities are gone.
    pub(crate) fn purge(&mut self) {
        self.loaded.retain(|w| w.strong_count() > 0);
    }

    /// Forget every loaded entity. Pending entities stay tracked.
    pub(crate) fn release_loaded(&mut self) {
        self.loaded.clear();
    }

    /// Number of live tracked entities, pending included.
    pub(crate) fn len(&self) -> usize {
        self.pending.len() + self.loaded.iter().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use relmap_core::{EntityState, Result, Row, Value};

    use super::*;

    struct Stub {
        state: EntityState,
    }

    impl Record for Stub {
        fn table(&self) -> &'static str {
            "stub"
        }
        fn primary_key(&self) -> &'static str {
            "id"
        }
        fn state(&self) -> &EntityState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut EntityState {
            &mut self.state
        }
        fn to_row(&self) -> Row {
            Row::new()
        }
        fn set_field(&mut self, _name: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    fn stub() -> SharedRecord {
        Rc::new(RefCell::new(Stub {
            state: EntityState::new(),
        }))
    }

    #[test]
    fn test_pending_dedupes_by_identity() {
        let mut tracker = ChangeTracker::default();
        let record = stub();
        tracker.track_pending(Rc::clone(&record));
        tracker.track_pending(record);
        assert_eq!(tracker.pending().len(), 1);
    }

    #[test]
    fn test_loaded_tracking_is_weak() {
        let mut tracker = ChangeTracker::default();
        let record = stub();
        tracker.track_loaded(&record);
        assert_eq!(tracker.live_loaded().len(), 1);

        drop(record);
        assert!(tracker.live_loaded().is_empty());
        tracker.purge();
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn test_promote_moves_pending_to_loaded() {
        let mut tracker = ChangeTracker::default();
        let record = stub();
        tracker.track_pending(Rc::clone(&record));
        tracker.promote_pending();
        assert!(tracker.pending().is_empty());
        assert_eq!(tracker.live_loaded().len(), 1);
    }
}
