//! relmap: entity mapping and persistence over pluggable store connectors.
//!
//! The facade crate ties the workspace together. A [`Database`] owns one
//! [`StoreConnector`](relmap_core::StoreConnector) and the schema model it
//! was opened with; typed [`TableSet`]s append entities into its change set
//! and start [`Query`] builders; [`Database::save_changes`] persists the
//! whole change set as one atomic, dependency-ordered batch.
//!
//! # Example
//!
//! ```ignore
//! let db = Database::open(config, weblog_model(), connector)?;
//! let posts = db.table::<Post>()?;
//!
//! let post = posts.append(Post::new("First post"));
//! post.borrow_mut().comments_mut().append(Comment::new("Hi!"));
//! db.save_changes()?; // post first, then its comment with post_id wired
//!
//! let recent = posts
//!     .query()
//!     .filter(Post::id_field().gt(10))?
//!     .order_by(Post::created_field().desc())?
//!     .to_list()?;
//! ```
//!
//! Entity types implement the [`Record`](relmap_core::Record) and
//! [`Entity`](relmap_core::Entity) traits from `relmap-core`; connectors are
//! separate crates (see `relmap-memory`).

mod config;
mod database;
mod plan;
mod query;
mod tableset;
mod tracker;

pub use config::DatabaseConfig;
pub use database::Database;
pub use query::Query;
pub use tableset::TableSet;

pub use relmap_core::{
    ChildAttachment, Direction, Entity, EntityState, Error, Expr, FieldRef, OrderSpec, OrderTerm,
    Record, RelationMany, RelationOne, Result, Row, SharedRecord, SqlType, StoreConnector, Value,
};
pub use relmap_schema::{
    DatabaseModel, FieldModel, RelationKind, RelationModel, SchemaChange, TableModel,
};

/// Everything an application typically imports.
pub mod prelude {
    pub use crate::{
        Database, DatabaseConfig, DatabaseModel, Entity, EntityState, Error, Expr, FieldModel,
        FieldRef, OrderSpec, Record, RelationMany, RelationModel, RelationOne, Result, Row,
        SqlType, StoreConnector, TableModel, Value,
    };
}
