//! Value mapper
//!
//! Converts between driver scalars ([`Value`]) and entity properties
//! ([`Property`]) according to a column's schema.
//!
//! ## Null handling
//!
//! A null is accepted only for nullable columns. OneToMany columns never take
//! a null: their raw value is the owning entity's primary key.
//!
//! ## Relations
//!
//! - ManyToOne: the identity cache is consulted first; on a miss the property
//!   becomes a lazy handle that selects the target by primary key when
//!   dereferenced, failing with [`OrmError::EntityNotFound`] if the row is gone
//! - OneToMany: always a lazy collection selecting the related rows whose
//!   relation column equals the owner's primary key
//!
//! ## Date/time
//!
//! Reading accepts a unix timestamp (integer) or text. Writing formats by the
//! column's storage type: `Timestamp` as a unix timestamp, `Date` as
//! `YYYY-MM-DD`, anything else as `YYYY-MM-DD HH:MM:SS`.

use std::rc::Rc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{OrmError, Result};
use crate::orm::Session;
use crate::query::where_builder::DATETIME_FORMAT;
use crate::relation::RelationRef;
use crate::schema::{ColumnSchema, ColumnType, EntitySchema, LogicalType, Relation};
use crate::value::{Property, Value};

pub mod extension;
pub mod json;

#[doc(inline)]
pub use extension::{ExtensionFactory, ExtensionMapper, ExtensionProvider};
#[doc(inline)]
pub use json::JsonMapper;

const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Bidirectional column/property converter bound to one engine instance.
pub struct Mapper<'s> {
    session: &'s Session,
}

impl<'s> Mapper<'s> {
    pub(crate) fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Convert a raw column value into the property `column` declares.
    pub fn map_to_property(
        &self,
        schema: &EntitySchema,
        column: &ColumnSchema,
        value: &Value,
    ) -> Result<Property> {
        if value.is_null() {
            return if column.nullable && !column.is_one_to_many() {
                Ok(Property::Null)
            } else {
                Err(OrmError::NotNullable(column.column_name.clone()))
            };
        }

        match column.logical_type {
            LogicalType::String => match value {
                Value::Text(s) => Ok(Property::String(s.clone())),
                other => Ok(Property::String(other.to_string())),
            },
            LogicalType::Int => value
                .as_int()
                .map(Property::Int)
                .ok_or_else(|| mismatch(column, value.type_name())),
            LogicalType::Float => match value {
                Value::Float(v) => Ok(Property::Float(*v)),
                Value::Int(i) => Ok(Property::Float(*i as f64)),
                Value::Text(s) => s
                    .trim()
                    .parse()
                    .map(Property::Float)
                    .map_err(|_| mismatch(column, "string")),
                Value::Null => Err(mismatch(column, "null")),
            },
            LogicalType::Bool => match value {
                Value::Int(i) => Ok(Property::Bool(*i != 0)),
                Value::Text(s) => match s.trim() {
                    "1" | "true" => Ok(Property::Bool(true)),
                    "0" | "false" | "" => Ok(Property::Bool(false)),
                    _ => Err(mismatch(column, "string")),
                },
                other => Err(mismatch(column, other.type_name())),
            },
            LogicalType::Uuid => value
                .as_str()
                .and_then(|s| uuid::Uuid::parse_str(s).ok())
                .map(Property::Uuid)
                .ok_or_else(|| mismatch(column, value.type_name())),
            LogicalType::DateTime | LogicalType::DateTimeImmutable => {
                parse_datetime(column, value).map(Property::DateTime)
            }
            LogicalType::Enum => {
                let enum_type = column.enum_type.as_ref().ok_or_else(|| {
                    OrmError::InvalidSchema(format!(
                        "Enum column \"{}\" has no enum type",
                        column.column_name
                    ))
                })?;
                enum_type.resolve(value).map(Property::Enum).ok_or_else(|| {
                    OrmError::invalid_value(&column.column_name, &enum_type.name, &value.to_string())
                })
            }
            LogicalType::Relation => self.relation_to_property(column, value),
            LogicalType::Extension => self.extension(column)?.to_property(schema, column, value),
        }
    }

    /// Convert a property back into the raw value stored in `column`.
    pub fn map_to_column(&self, column: &ColumnSchema, property: &Property) -> Result<Value> {
        if property.is_null() {
            return if column.nullable {
                Ok(Value::Null)
            } else {
                Err(OrmError::NotNullable(column.column_name.clone()))
            };
        }

        match (column.logical_type, property) {
            (LogicalType::String, Property::String(s)) => Ok(Value::Text(s.clone())),
            (LogicalType::Int, Property::Int(i)) => Ok(Value::Int(*i)),
            (LogicalType::Float, Property::Float(v)) => Ok(Value::Float(*v)),
            (LogicalType::Float, Property::Int(i)) => Ok(Value::Float(*i as f64)),
            (LogicalType::Bool, Property::Bool(b)) => Ok(Value::from(*b)),
            (LogicalType::Uuid, Property::Uuid(u)) => Ok(Value::Text(u.hyphenated().to_string())),
            (LogicalType::DateTime | LogicalType::DateTimeImmutable, Property::DateTime(d)) => {
                Ok(format_datetime(column.column_type, d))
            }
            (LogicalType::Enum, Property::Enum(backing)) => Ok(backing.clone()),
            (LogicalType::Relation, Property::Reference(reference)) if column.is_many_to_one() => {
                self.reference_to_column(reference)
            }
            (LogicalType::Extension, _) => self.extension(column)?.to_column(column, property),
            (expected, actual) => Err(OrmError::invalid_value(
                &column.column_name,
                expected.as_str(),
                actual.type_name(),
            )),
        }
    }

    fn extension(&self, column: &ColumnSchema) -> Result<Rc<dyn ExtensionMapper>> {
        let name = column.extension.as_deref().ok_or_else(|| {
            OrmError::InvalidSchema(format!(
                "Extension column \"{}\" names no extension",
                column.column_name
            ))
        })?;
        self.session.extensions().get(name)
    }

    fn relation_to_property(&self, column: &ColumnSchema, value: &Value) -> Result<Property> {
        match &column.relation {
            Some(Relation::ManyToOne { entity }) => Ok(Property::Reference(
                self.session.reference(entity, value.clone()),
            )),
            Some(Relation::OneToMany {
                entity,
                relation_column,
            }) => Ok(Property::Collection(self.session.collection(
                entity,
                relation_column,
                value.clone(),
            ))),
            None => Err(OrmError::InvalidSchema(format!(
                "Relation column \"{}\" declares no related entity",
                column.column_name
            ))),
        }
    }

    fn reference_to_column(&self, reference: &RelationRef) -> Result<Value> {
        if let Some(id) = reference.id() {
            return Ok(id.clone());
        }
        let target = reference.get()?;
        self.session.primary_value(reference.entity(), &*target)
    }
}

fn mismatch(column: &ColumnSchema, actual: &str) -> OrmError {
    OrmError::invalid_value(&column.column_name, column.logical_type.as_str(), actual)
}

fn parse_datetime(column: &ColumnSchema, value: &Value) -> Result<NaiveDateTime> {
    match value {
        Value::Int(timestamp) => DateTime::from_timestamp(*timestamp, 0)
            .map(|d| d.naive_utc())
            .ok_or_else(|| mismatch(column, "int")),
        Value::Text(text) => {
            let text = text.trim();
            DATETIME_PARSE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(text, DATE_FORMAT)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .or_else(|| {
                    DateTime::parse_from_rfc3339(text)
                        .ok()
                        .map(|d| d.naive_utc())
                })
                .ok_or_else(|| mismatch(column, "string"))
        }
        other => Err(mismatch(column, other.type_name())),
    }
}

fn format_datetime(column_type: ColumnType, value: &NaiveDateTime) -> Value {
    match column_type {
        ColumnType::Timestamp => Value::Int(value.and_utc().timestamp()),
        ColumnType::Date => Value::Text(value.format(DATE_FORMAT).to_string()),
        _ => Value::Text(value.format(DATETIME_FORMAT).to_string()),
    }
}
