//! Pluggable converters for extension columns.
//!
//! An extension column names a converter; the [`ExtensionProvider`] creates
//! that converter the first time a column asks for it and hands the same
//! instance to every later column with the same name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::json::JsonMapper;
use crate::error::{OrmError, Result};
use crate::schema::{ColumnSchema, EntitySchema};
use crate::value::{Property, Value};

/// Two-directional converter for one custom column type.
///
/// Nulls never reach a converter; the mapper handles them from the column's
/// nullable flag.
pub trait ExtensionMapper {
    fn to_property(&self, schema: &EntitySchema, column: &ColumnSchema, value: &Value) -> Result<Property>;

    fn to_column(&self, column: &ColumnSchema, property: &Property) -> Result<Value>;
}

pub type ExtensionFactory = Box<dyn Fn() -> Rc<dyn ExtensionMapper>>;

/// Registry of converter factories with per-name instance caching.
pub struct ExtensionProvider {
    factories: HashMap<String, ExtensionFactory>,
    instances: RefCell<HashMap<String, Rc<dyn ExtensionMapper>>>,
}

impl ExtensionProvider {
    /// Provider with the built-in `json` extension registered.
    pub fn new() -> Self {
        let mut provider = Self::empty();
        provider.register(JsonMapper::NAME, || Rc::new(JsonMapper));
        provider
    }

    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            instances: RefCell::new(HashMap::new()),
        }
    }

    /// Register `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Rc<dyn ExtensionMapper> + 'static,
    {
        let name = name.into();
        self.instances.get_mut().remove(&name);
        self.factories.insert(name, Box::new(factory));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// The converter registered as `name`, created on first use.
    pub fn get(&self, name: &str) -> Result<Rc<dyn ExtensionMapper>> {
        if let Some(instance) = self.instances.borrow().get(name) {
            return Ok(Rc::clone(instance));
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| OrmError::ExtensionNotFound(name.to_string()))?;
        let instance = factory();
        self.instances
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&instance));
        Ok(instance)
    }
}

impl Default for ExtensionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtensionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ExtensionProvider")
            .field("registered", &names)
            .finish()
    }
}
