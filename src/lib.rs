//! # Mooring
//!
//! Schema-driven object-relational mapping core: statement builders, a value
//! mapper, an identity-mapped entity materializer and lazy relation handles,
//! on top of a minimal prepare/execute/fetch connection interface.
//!
//! ```rust,no_run
//! # #[cfg(feature = "sqlite")]
//! # fn demo() -> mooring::Result<()> {
//! use mooring::connection::SqliteConnection;
//! use mooring::schema::{ColumnDefinition, EntityDefinition, SchemaBuilder};
//! use mooring::Orm;
//!
//! let schema = SchemaBuilder::new()
//!     .entity(
//!         EntityDefinition::new("Country")
//!             .column(ColumnDefinition::int("id").primary().auto_increment())
//!             .column(ColumnDefinition::string("name")),
//!     )
//!     .build()?;
//! let orm = Orm::builder(schema).connect(SqliteConnection::open_in_memory()?)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod orm;
pub mod query;
pub mod relation;
pub mod repository;
pub mod schema;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;
pub mod value;

#[cfg(test)]
pub(crate) mod tests_cfg;

pub use entity::Entity;
pub use error::{OrmError, Result};
pub use orm::{CacheScope, Orm, OrmBuilder};
pub use relation::{Collection, Reference};
pub use repository::Repository;
pub use value::{BackedEnum, EnumType, Property, PropertyType, Value};
