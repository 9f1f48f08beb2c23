//! Typed property values.
//!
//! `Property` is the entity-side counterpart of [`Value`]: what the mapper hands
//! to an entity when materializing it, and what the entity hands back when it
//! is written.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::enums::BackedEnum;
use super::scalar::Value;
use super::types::PropertyType;
use crate::error::{OrmError, Result};
use crate::relation::{CollectionRef, RelationRef};

/// A typed property value.
#[derive(Clone)]
pub enum Property {
    Null,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
    /// Both datetime logical types map here (UTC wall clock).
    DateTime(NaiveDateTime),
    /// Backing value of an enum case.
    Enum(Value),
    /// ManyToOne relation handle.
    Reference(RelationRef),
    /// OneToMany relation handle.
    Collection(CollectionRef),
    /// Value produced by an extension mapper.
    Extension(Rc<dyn Any>),
}

impl Property {
    pub fn is_null(&self) -> bool {
        matches!(self, Property::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Property::Null => "null",
            Property::String(_) => "string",
            Property::Int(_) => "int",
            Property::Float(_) => "float",
            Property::Bool(_) => "bool",
            Property::Uuid(_) => "uuid",
            Property::DateTime(_) => "datetime",
            Property::Enum(_) => "enum",
            Property::Reference(_) => "reference",
            Property::Collection(_) => "collection",
            Property::Extension(_) => "extension",
        }
    }

    /// Convert into a concrete Rust type, reporting `property` on mismatch.
    pub fn extract<T: PropertyType>(self, property: &str) -> Result<T> {
        let actual = self.type_name();
        T::from_property(self)
            .ok_or_else(|| OrmError::invalid_value(property, T::type_name(), actual))
    }

    /// Wrap an enum case.
    pub fn from_enum<E: BackedEnum>(value: &E) -> Self {
        Property::Enum(value.backing())
    }

    /// Convert an enum property back into its Rust variant.
    pub fn into_enum<E: BackedEnum>(self, property: &str) -> Result<E> {
        match &self {
            Property::Enum(backing) => E::from_backing(backing)
                .ok_or_else(|| OrmError::invalid_value(property, E::NAME, &backing.to_string())),
            other => Err(OrmError::invalid_value(property, E::NAME, other.type_name())),
        }
    }

    /// Like [`Property::into_enum`] but maps `Null` to `None`.
    pub fn into_optional_enum<E: BackedEnum>(self, property: &str) -> Result<Option<E>> {
        if self.is_null() {
            return Ok(None);
        }
        self.into_enum(property).map(Some)
    }

    /// Wrap an arbitrary value for an extension column.
    pub fn extension<T: Any>(value: T) -> Self {
        Property::Extension(Rc::new(value))
    }

    /// Borrow the payload of an extension property as `T`.
    pub fn downcast_extension<T: Any>(&self) -> Option<&T> {
        match self {
            Property::Extension(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Null => write!(f, "Null"),
            Property::String(s) => f.debug_tuple("String").field(s).finish(),
            Property::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Property::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Property::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Property::Uuid(u) => f.debug_tuple("Uuid").field(u).finish(),
            Property::DateTime(d) => f.debug_tuple("DateTime").field(d).finish(),
            Property::Enum(v) => f.debug_tuple("Enum").field(v).finish(),
            Property::Reference(r) => f
                .debug_struct("Reference")
                .field("entity", &r.entity())
                .field("id", &r.id())
                .finish(),
            Property::Collection(c) => f
                .debug_struct("Collection")
                .field("entity", &c.entity())
                .finish(),
            Property::Extension(_) => write!(f, "Extension(..)"),
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Property::Null, Property::Null) => true,
            (Property::String(a), Property::String(b)) => a == b,
            (Property::Int(a), Property::Int(b)) => a == b,
            (Property::Float(a), Property::Float(b)) => a == b,
            (Property::Bool(a), Property::Bool(b)) => a == b,
            (Property::Uuid(a), Property::Uuid(b)) => a == b,
            (Property::DateTime(a), Property::DateTime(b)) => a == b,
            (Property::Enum(a), Property::Enum(b)) => a == b,
            (Property::Reference(a), Property::Reference(b)) => {
                a.ptr_eq(b) || (a.entity() == b.entity() && a.id().is_some() && a.id() == b.id())
            }
            (Property::Collection(a), Property::Collection(b)) => a.ptr_eq(b),
            (Property::Extension(a), Property::Extension(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
