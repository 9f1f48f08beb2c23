//! OneToMany relation handles.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::lazy::{Lazy, Loader};
use crate::entity::Entity;
use crate::error::{OrmError, Result};

/// Type-erased OneToMany handle.
#[derive(Clone)]
pub struct CollectionRef {
    inner: Rc<CollectionInner>,
}

struct CollectionInner {
    entity: String,
    items: Lazy<Vec<Rc<dyn Any>>>,
}

impl CollectionRef {
    pub fn lazy(entity: impl Into<String>, loader: Loader<Vec<Rc<dyn Any>>>) -> Self {
        let entity = entity.into();
        Self {
            inner: Rc::new(CollectionInner {
                items: Lazy::new(entity.clone(), loader),
                entity,
            }),
        }
    }

    pub fn resolved(entity: impl Into<String>, items: Vec<Rc<dyn Any>>) -> Self {
        let entity = entity.into();
        Self {
            inner: Rc::new(CollectionInner {
                items: Lazy::resolved(entity.clone(), items),
                entity,
            }),
        }
    }

    pub fn entity(&self) -> &str {
        &self.inner.entity
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.items.is_resolved()
    }

    pub fn get(&self) -> Result<Vec<Rc<dyn Any>>> {
        self.inner.items.get()
    }

    pub fn ptr_eq(&self, other: &CollectionRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRef")
            .field("entity", &self.inner.entity)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Typed OneToMany field.
///
/// The rows are selected on the first [`Collection::get`] and kept for the
/// lifetime of the owning entity. No ordering is applied.
pub struct Collection<T> {
    raw: CollectionRef,
    _marker: PhantomData<T>,
}

impl<T: Entity> Collection<T> {
    /// Resolved, empty collection for entities built in memory.
    pub fn empty() -> Self {
        Self::from_raw(CollectionRef::resolved(T::NAME, Vec::new()))
    }

    pub fn from_items(items: Vec<Rc<T>>) -> Self {
        let items = items.into_iter().map(|item| item as Rc<dyn Any>).collect();
        Self::from_raw(CollectionRef::resolved(T::NAME, items))
    }

    pub fn get(&self) -> Result<Vec<Rc<T>>> {
        self.raw
            .get()?
            .into_iter()
            .map(|item| {
                item.downcast::<T>().map_err(|_| {
                    OrmError::Usage(format!(
                        "Collection of {} holds another entity type",
                        T::NAME
                    ))
                })
            })
            .collect()
    }

    pub fn is_resolved(&self) -> bool {
        self.raw.is_resolved()
    }

    pub fn as_raw(&self) -> &CollectionRef {
        &self.raw
    }

    pub fn into_raw(self) -> CollectionRef {
        self.raw
    }

    pub fn from_raw(raw: CollectionRef) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}
