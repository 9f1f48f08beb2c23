//! Entities and their materialization.
//!
//! An entity is a plain Rust struct bound to one [`crate::schema::EntitySchema`].
//! It is built in two phases, both driven by the schema's property order:
//!
//! 1. [`Entity::construct`] receives the constructor-bound properties in the
//!    declared order
//! 2. [`Entity::set_property`] is called for every remaining property
//!
//! [`Entity::get_property`] is the reverse direction, used by the insert,
//! update and delete builders.
//!
//! # Example
//!
//! ```rust
//! use mooring::entity::{ConstructorArgs, Entity};
//! use mooring::{OrmError, Property, PropertyType, Result};
//!
//! struct Country {
//!     id: Option<i64>,
//!     name: String,
//! }
//!
//! impl Entity for Country {
//!     const NAME: &'static str = "Country";
//!
//!     fn construct(args: &mut ConstructorArgs) -> Result<Self> {
//!         Ok(Country { id: None, name: args.take("name")? })
//!     }
//!
//!     fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
//!         match property {
//!             "id" => self.id = value.extract(property)?,
//!             "name" => self.name = value.extract(property)?,
//!             _ => return Err(OrmError::column_not_found_for::<Self>(property)),
//!         }
//!         Ok(())
//!     }
//!
//!     fn get_property(&self, property: &str) -> Result<Property> {
//!         match property {
//!             "id" => Ok(self.id.into_property()),
//!             "name" => Ok(self.name.clone().into_property()),
//!             _ => Err(OrmError::column_not_found_for::<Self>(property)),
//!         }
//!     }
//! }
//! ```

use std::any::Any;

use crate::error::{OrmError, Result};
use crate::value::{BackedEnum, Property, PropertyType};

pub mod cache;
pub mod factory;

#[doc(inline)]
pub use cache::{EntityCache, EntityKey};
#[doc(inline)]
pub use factory::EntityFactory;

/// A Rust type mapped to one entity schema.
pub trait Entity: Any + Sized {
    /// Entity name the schema is registered under.
    const NAME: &'static str;

    /// Build an instance from the constructor-bound properties.
    fn construct(args: &mut ConstructorArgs) -> Result<Self>;

    /// Assign one property that is not part of the constructor.
    fn set_property(&mut self, property: &str, value: Property) -> Result<()>;

    /// Read one property.
    fn get_property(&self, property: &str) -> Result<Property>;
}

/// Constructor-bound properties, in declared order.
#[derive(Debug, Default)]
pub struct ConstructorArgs {
    entity: String,
    args: Vec<(String, Property)>,
}

impl ConstructorArgs {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            args: Vec::new(),
        }
    }

    pub fn push(&mut self, property: impl Into<String>, value: Property) {
        self.args.push((property.into(), value));
    }

    pub fn with(mut self, property: impl Into<String>, value: impl PropertyType) -> Self {
        self.push(property, value.into_property());
        self
    }

    /// Remove the raw property named `property`.
    pub fn take_property(&mut self, property: &str) -> Result<Property> {
        let index = self
            .args
            .iter()
            .position(|(name, _)| name == property)
            .ok_or_else(|| {
                OrmError::Usage(format!(
                    "Constructor argument \"{property}\" was not supplied for {}",
                    self.entity
                ))
            })?;
        Ok(self.args.remove(index).1)
    }

    /// Remove `property` and convert it.
    pub fn take<V: PropertyType>(&mut self, property: &str) -> Result<V> {
        self.take_property(property)?.extract(property)
    }

    pub fn take_enum<E: BackedEnum>(&mut self, property: &str) -> Result<E> {
        self.take_property(property)?.into_enum(property)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl OrmError {
    /// Error for a property name `T` does not declare.
    pub fn column_not_found_for<T: Entity>(property: &str) -> Self {
        OrmError::column_not_found(T::NAME, property)
    }
}
