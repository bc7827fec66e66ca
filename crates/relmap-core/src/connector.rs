//! The contract between the facade and a storage backend.

use crate::error::Result;
use crate::row::Row;
use crate::statement::{DeleteStatement, InsertStatement, SelectStatement, UpdateStatement};

/// A synchronous connection to one store.
///
/// The facade owns exactly one connector and drives it from a single thread;
/// implementations do not need interior synchronization. Statements arrive as
/// structured data, not SQL text, so a connector is free to interpret them
/// natively.
///
/// Transaction semantics: `begin`/`commit`/`rollback` bracket a batch of
/// writes. A connector must make the batch atomic; after `rollback`, no
/// statement issued since `begin` may remain visible.
pub trait StoreConnector {
    /// Establish the connection. Idempotent if already open.
    fn open(&mut self) -> Result<()>;

    /// Release the connection. Statements after `close` fail with
    /// `Error::Connection`.
    fn close(&mut self) -> Result<()>;

    /// True between a successful `open` and the next `close`.
    fn is_open(&self) -> bool;

    /// Run a read and return the matching rows, already projected, ordered,
    /// and limited.
    fn select(&mut self, statement: &SelectStatement) -> Result<Vec<Row>>;

    /// Insert one row and return the key the store assigned to it.
    fn insert(&mut self, statement: &InsertStatement) -> Result<i64>;

    /// Update the matching rows; returns how many were changed.
    fn update(&mut self, statement: &UpdateStatement) -> Result<u64>;

    /// Delete the matching rows; returns how many were removed.
    fn delete(&mut self, statement: &DeleteStatement) -> Result<u64>;

    /// Start a write batch.
    fn begin(&mut self) -> Result<()>;

    /// Make the current batch durable.
    fn commit(&mut self) -> Result<()>;

    /// Discard every statement since `begin`.
    fn rollback(&mut self) -> Result<()>;
}
