//! Relation handles.
//!
//! Relation columns are never loaded eagerly. A ManyToOne property holds a
//! [`Reference`], a OneToMany property holds a [`Collection`]; both wrap a
//! [`Lazy`] state machine that issues the deferred select on first access and
//! keeps the result afterwards.
//!
//! The typed wrappers are what entities store. The erased [`RelationRef`] and
//! [`CollectionRef`] are what travels through [`crate::Property`].

pub mod collection;
pub mod lazy;
pub mod reference;

#[doc(inline)]
pub use collection::{Collection, CollectionRef};
#[doc(inline)]
pub use lazy::{Lazy, Loader};
#[doc(inline)]
pub use reference::{Reference, RelationRef};
