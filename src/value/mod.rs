//! Value type system for Mooring
//!
//! Two layers of values flow through the engine:
//!
//! - **`Value`** - wire-level scalar exchanged with the driver (parameters, row cells)
//! - **`Property`** - typed value exchanged with entities
//!
//! ## Traits
//!
//! - **`PropertyType`** - Maps Rust field types to their `Property` variant
//! - **`BackedEnum`** - Maps Rust enums to their scalar backing values

pub mod enums;
pub mod property;
pub mod scalar;
pub mod types;

pub use enums::{BackedEnum, EnumType};
pub use property::Property;
pub use scalar::Value;
pub use types::PropertyType;
