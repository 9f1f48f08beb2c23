//! Query builders and execution.
//!
//! Every builder renders MySQL-style SQL with backtick-quoted identifiers and
//! positional `?` placeholders (update uses named `:property` placeholders,
//! bound in order of appearance).
//!
//! - [`Select`]: typed select producing entities or associative rows
//! - [`SelectStatement`]: the untyped statement behind it, also usable as a subquery
//! - [`Insert`], [`Update`], [`Delete`]: write builders over entity instances
//! - [`WhereBuilder`]: nested AND/OR predicate tree
//! - [`JoinSet`]: implicit joins derived from dotted property paths
//!
//! # Examples
//!
//! ```no_run
//! # fn demo<User: mooring::Entity>(orm: &mooring::Orm) -> mooring::Result<()> {
//! use mooring::query::Direction;
//!
//! let users = orm
//!     .select::<User>()
//!     .and_where(("address.city", "Prague"))
//!     .order_by("lastName", Direction::Asc)
//!     .limit(10)
//!     .fetch_all()?;
//! # Ok(())
//! # }
//! ```

pub mod delete;
pub mod insert;
pub mod join;
pub mod select;
pub mod update;
pub mod where_builder;

pub(crate) mod error_handling;
pub(crate) mod execution;

#[doc(inline)]
pub use delete::Delete;
#[doc(inline)]
pub use insert::Insert;
#[doc(inline)]
pub use join::{ColumnResolver, Join, JoinSet};
#[doc(inline)]
pub use select::{Direction, Select, SelectStatement};
#[doc(inline)]
pub use update::Update;
#[doc(inline)]
pub use where_builder::{Criteria, WhereBuilder, WhereValue};
