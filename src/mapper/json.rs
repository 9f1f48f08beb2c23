//! Built-in `json` extension: text column to `serde_json::Value`.

use std::rc::Rc;

use super::extension::ExtensionMapper;
use crate::error::{OrmError, Result};
use crate::schema::{ColumnSchema, EntitySchema};
use crate::value::{Property, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMapper;

impl JsonMapper {
    pub const NAME: &'static str = "json";
}

impl ExtensionMapper for JsonMapper {
    fn to_property(&self, _schema: &EntitySchema, column: &ColumnSchema, value: &Value) -> Result<Property> {
        let text = value
            .as_str()
            .ok_or_else(|| OrmError::invalid_value(&column.column_name, "json", value.type_name()))?;
        let json: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            OrmError::invalid_value(&column.column_name, "json", &format!("invalid json ({e})"))
        })?;
        Ok(Property::Extension(Rc::new(json)))
    }

    fn to_column(&self, column: &ColumnSchema, property: &Property) -> Result<Value> {
        let json = property
            .downcast_extension::<serde_json::Value>()
            .ok_or_else(|| OrmError::invalid_value(&column.column_name, "json", property.type_name()))?;
        Ok(Value::Text(json.to_string()))
    }
}
