//! Identity map.
//!
//! One materialized instance per `(entity, primary key)`. The cache owns the
//! canonical `Rc`; callers get clones of it. Entries live until they are
//! removed or the cache is cleared, never on a timer.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use super::Entity;
use crate::value::Value;

/// Cache key. Primary keys are compared by their textual form, so an integer
/// key read back as numeric text still hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    entity: String,
    id: String,
}

impl EntityKey {
    pub fn new(entity: &str, id: &Value) -> Self {
        Self {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }
}

#[derive(Default)]
pub struct EntityCache {
    entries: HashMap<EntityKey, Rc<dyn Any>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: &str, id: &Value) -> Option<Rc<dyn Any>> {
        let hit = self.entries.get(&EntityKey::new(entity, id)).cloned();
        if hit.is_some() {
            trace!("identity cache hit for {entity}#{id}");
        }
        hit
    }

    /// Typed lookup; `None` on a miss or when the cached instance is not a `T`.
    pub fn get_typed<T: Entity>(&self, id: &Value) -> Option<Rc<T>> {
        self.get(T::NAME, id).and_then(|any| any.downcast::<T>().ok())
    }

    pub fn contains(&self, entity: &str, id: &Value) -> bool {
        self.entries.contains_key(&EntityKey::new(entity, id))
    }

    /// Register `instance`; an existing entry for the same key is replaced.
    pub fn insert(&mut self, entity: &str, id: &Value, instance: Rc<dyn Any>) {
        self.entries.insert(EntityKey::new(entity, id), instance);
    }

    pub fn remove(&mut self, entity: &str, id: &Value) -> Option<Rc<dyn Any>> {
        self.entries.remove(&EntityKey::new(entity, id))
    }

    pub fn clear(&mut self) {
        trace!("clearing identity cache ({} entries)", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
