//! ManyToOne relation handles.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::lazy::{Lazy, Loader};
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::value::Value;

/// Type-erased ManyToOne handle.
///
/// Carries the related entity name and, when known, the foreign-key value. The
/// target instance is produced lazily and shared by every clone of the handle.
#[derive(Clone)]
pub struct RelationRef {
    inner: Rc<RefInner>,
}

struct RefInner {
    entity: String,
    id: Option<Value>,
    target: Lazy<Rc<dyn Any>>,
}

impl RelationRef {
    /// Handle that runs `loader` on first access.
    pub fn lazy(entity: impl Into<String>, id: Value, loader: Loader<Rc<dyn Any>>) -> Self {
        let entity = entity.into();
        Self {
            inner: Rc::new(RefInner {
                target: Lazy::new(entity.clone(), loader),
                entity,
                id: Some(id),
            }),
        }
    }

    /// Handle around an instance that is already in memory.
    pub fn resolved(entity: impl Into<String>, id: Option<Value>, target: Rc<dyn Any>) -> Self {
        let entity = entity.into();
        Self {
            inner: Rc::new(RefInner {
                target: Lazy::resolved(entity.clone(), target),
                entity,
                id,
            }),
        }
    }

    pub fn entity(&self) -> &str {
        &self.inner.entity
    }

    /// Foreign-key value this handle was built from, if any.
    pub fn id(&self) -> Option<&Value> {
        self.inner.id.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.target.is_resolved()
    }

    pub fn get(&self) -> Result<Rc<dyn Any>> {
        self.inner.target.get()
    }

    pub fn ptr_eq(&self, other: &RelationRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RelationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationRef")
            .field("entity", &self.inner.entity)
            .field("id", &self.inner.id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Typed ManyToOne field.
///
/// Materialized entities receive either a resolved handle (the target was in
/// the identity cache) or a lazy one that selects the target by primary key
/// the first time [`Reference::get`] is called.
pub struct Reference<T> {
    raw: RelationRef,
    _marker: PhantomData<T>,
}

impl<T: Entity> Reference<T> {
    /// Reference an instance held in memory, typically one that was just
    /// inserted. Its primary key is read when the owner is written.
    pub fn new(entity: Rc<T>) -> Self {
        Self::from_raw(RelationRef::resolved(T::NAME, None, entity))
    }

    /// The referenced entity, loading it on first access.
    pub fn get(&self) -> Result<Rc<T>> {
        self.raw.get()?.downcast::<T>().map_err(|_| {
            OrmError::Usage(format!(
                "Reference to {} resolved to another entity type",
                T::NAME
            ))
        })
    }

    pub fn id(&self) -> Option<&Value> {
        self.raw.id()
    }

    pub fn is_resolved(&self) -> bool {
        self.raw.is_resolved()
    }

    pub fn as_raw(&self) -> &RelationRef {
        &self.raw
    }

    pub fn into_raw(self) -> RelationRef {
        self.raw
    }

    pub fn from_raw(raw: RelationRef) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}
