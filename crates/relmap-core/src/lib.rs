//! Core types and traits for relmap.
//!
//! `relmap-core` is the foundation layer for the workspace. It defines the
//! value and row types shared across all crates, the expression AST used to
//! describe predicates and sort keys, the structured statements handed to a
//! store connector, and the entity runtime (identity, dirty state, relation
//! collections).
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `StoreConnector` is the trait implemented by store
//!   backends; `Record`/`Entity` are the traits implemented by mapped types.
//! - **Data model**: `Row` and `Value` carry query inputs/outputs between the
//!   facade and the connector.
//! - **Expression AST**: `FieldRef`, `Expr`, and `OrderSpec` are pure values;
//!   building them never touches storage.
//!
//! Most applications should use the `relmap` facade; reach for `relmap-core`
//! directly when writing a connector.

pub mod connector;
pub mod entity;
pub mod error;
pub mod expr;
pub mod order;
pub mod relation;
pub mod row;
pub mod statement;
pub mod types;
pub mod value;

pub use connector::StoreConnector;
pub use entity::{Entity, EntityState, Record, SharedRecord};
pub use error::{Error, Result};
pub use expr::{Expr, FieldRef, Operand, Operator};
pub use order::{Direction, OrderSpec, OrderTerm};
pub use relation::{ChildAttachment, RelationMany, RelationOne};
pub use row::Row;
pub use statement::{
    DeleteStatement, InsertStatement, Projection, SelectStatement, UpdateStatement,
};
pub use types::SqlType;
pub use value::Value;
