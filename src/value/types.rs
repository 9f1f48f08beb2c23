//! PropertyType trait for type-safe property conversions
//!
//! The `PropertyType` trait maps Rust field types to their corresponding
//! [`Property`] variant. Entity implementations use it to move field values in
//! and out of the mapper without matching on `Property` by hand.
//!
//! ## Usage
//!
//! ```rust
//! use mooring::{Property, PropertyType};
//!
//! let property = PropertyType::into_property(42i64);
//! assert_eq!(property, Property::Int(42));
//!
//! let name: Option<String> = Property::Null.extract("middle_name").unwrap();
//! assert_eq!(name, None);
//! ```
//!
//! ## Implementation
//!
//! The trait is implemented for:
//!
//! - Integers: `i32`, `i64`
//! - Floating point: `f64`
//! - Boolean: `bool`
//! - String: `String`
//! - UUID: `uuid::Uuid`
//! - Date/time: `chrono::NaiveDateTime`, `chrono::DateTime<Utc>`
//! - JSON: `serde_json::Value` (through the `json` extension)
//! - Relations: `Reference<T>`, `Collection<T>`
//! - `Option<T>` for all of the above

use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use super::property::Property;
use crate::entity::Entity;
use crate::relation::{Collection, Reference};

/// Trait for mapping Rust field types to their corresponding [`Property`] variant.
pub trait PropertyType: Sized {
    /// Convert this value into a [`Property`].
    fn into_property(self) -> Property;

    /// Convert a [`Property`] into this type, if possible.
    ///
    /// Returns `None` if the property doesn't match the expected variant. Only
    /// `Option<T>` accepts `Property::Null`.
    fn from_property(property: Property) -> Option<Self>;

    /// Name of the expected type, used in mapping errors.
    fn type_name() -> &'static str;
}

impl PropertyType for String {
    fn into_property(self) -> Property {
        Property::String(self)
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::String(s) => Some(s),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "string"
    }
}

impl PropertyType for i64 {
    fn into_property(self) -> Property {
        Property::Int(self)
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Int(i) => Some(i),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "int"
    }
}

impl PropertyType for i32 {
    fn into_property(self) -> Property {
        Property::Int(i64::from(self))
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Int(i) => i32::try_from(i).ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "int"
    }
}

impl PropertyType for f64 {
    fn into_property(self) -> Property {
        Property::Float(self)
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Float(v) => Some(v),
            Property::Int(i) => Some(i as f64),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "float"
    }
}

impl PropertyType for bool {
    fn into_property(self) -> Property {
        Property::Bool(self)
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "bool"
    }
}

impl PropertyType for Uuid {
    fn into_property(self) -> Property {
        Property::Uuid(self)
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Uuid(u) => Some(u),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "uuid"
    }
}

impl PropertyType for NaiveDateTime {
    fn into_property(self) -> Property {
        Property::DateTime(self)
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::DateTime(d) => Some(d),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "datetime"
    }
}

impl PropertyType for DateTime<Utc> {
    fn into_property(self) -> Property {
        Property::DateTime(self.naive_utc())
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::DateTime(d) => Some(d.and_utc()),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "datetime"
    }
}

impl PropertyType for serde_json::Value {
    fn into_property(self) -> Property {
        Property::Extension(Rc::new(self))
    }

    fn from_property(property: Property) -> Option<Self> {
        property.downcast_extension::<serde_json::Value>().cloned()
    }

    fn type_name() -> &'static str {
        "json"
    }
}

impl<T: Entity> PropertyType for Reference<T> {
    fn into_property(self) -> Property {
        Property::Reference(self.into_raw())
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Reference(raw) if raw.entity() == T::NAME => Some(Reference::from_raw(raw)),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "reference"
    }
}

impl<T: Entity> PropertyType for Collection<T> {
    fn into_property(self) -> Property {
        Property::Collection(self.into_raw())
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Collection(raw) if raw.entity() == T::NAME => {
                Some(Collection::from_raw(raw))
            }
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "collection"
    }
}

impl<T: PropertyType> PropertyType for Option<T> {
    fn into_property(self) -> Property {
        match self {
            Some(v) => v.into_property(),
            None => Property::Null,
        }
    }

    fn from_property(property: Property) -> Option<Self> {
        match property {
            Property::Null => Some(None),
            other => T::from_property(other).map(Some),
        }
    }

    fn type_name() -> &'static str {
        T::type_name()
    }
}
