//! Schema model
//!
//! Pure data describing how each entity maps to a table: [`EntitySchema`] per
//! mapped type, [`ColumnSchema`] per property. Schemas are normally produced by
//! [`SchemaBuilder`] (or an external generator emitting the same structures) and
//! consumed read-only through [`SchemaProvider`].

pub mod builder;
pub mod column;
pub mod entity;
pub mod naming;
pub mod provider;

pub use builder::{ColumnDefinition, EntityDefinition, SchemaBuilder};
pub use column::{ColumnSchema, ColumnType, LogicalType, Relation, RelationKind};
pub use entity::EntitySchema;
pub use naming::Case;
pub use provider::{Schema, SchemaProvider};
