//! Schema model for relmap.
//!
//! A [`DatabaseModel`] is the declared shape of a store: tables, fields, and
//! relations. It is pure data with three jobs:
//!
//! - **Validation**: queries and expressions are checked against the model
//!   before execution, so a mistyped field or relation fails at build time.
//! - **Descriptors**: a model serializes to a JSON descriptor and parses back
//!   without loss, so the declared schema can be stored next to the data it
//!   describes and compared across application versions.
//! - **Diffing**: two models diff into a change list a migration layer can
//!   apply.
//!
//! Model equality is order-independent: two models declaring the same
//! tables, fields, and relations are equal no matter the declaration order.

pub mod descriptor;
pub mod diff;
pub mod model;

pub use diff::SchemaChange;
pub use model::{DatabaseModel, FieldModel, RelationKind, RelationModel, TableModel};
