use std::collections::BTreeMap;

use super::entity::EntitySchema;
use super::column::ColumnSchema;
use crate::error::{OrmError, Result};

/// The complete mapping: every entity schema, keyed by entity name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    entities: BTreeMap<String, EntitySchema>,
}

impl Schema {
    /// Assemble a schema, rejecting duplicate entities or aliases and
    /// relations that point at undeclared entities.
    pub fn new(entities: Vec<EntitySchema>) -> Result<Self> {
        let mut map = BTreeMap::new();
        let mut aliases: Vec<&str> = Vec::new();
        for entity in &entities {
            if aliases.contains(&entity.table_alias.as_str()) {
                return Err(OrmError::InvalidSchema(format!(
                    "table alias \"{}\" is used twice",
                    entity.table_alias
                )));
            }
            aliases.push(&entity.table_alias);
        }

        for entity in &entities {
            for column in entity.columns() {
                if let Some(relation) = &column.relation {
                    if !entities.iter().any(|e| e.entity == relation.entity()) {
                        return Err(OrmError::InvalidSchema(format!(
                            "column \"{}\" of {} relates to undeclared entity {}",
                            column.property_name,
                            entity.entity,
                            relation.entity()
                        )));
                    }
                }
            }
        }

        for entity in entities {
            let name = entity.entity.clone();
            if map.insert(name.clone(), entity).is_some() {
                return Err(OrmError::InvalidSchema(format!(
                    "entity {name} is declared twice"
                )));
            }
        }
        Ok(Self { entities: map })
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }
}

/// Lookup façade over a [`Schema`]. Every lookup is total: a missing mapping
/// is an error, never `None`.
#[derive(Debug, Clone)]
pub struct SchemaProvider {
    schema: Schema,
}

impl SchemaProvider {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn entity_schema(&self, entity: &str) -> Result<&EntitySchema> {
        self.schema
            .entities
            .get(entity)
            .ok_or_else(|| OrmError::SchemaNotFound(entity.to_string()))
    }

    pub fn primary_column(&self, entity: &str) -> Result<&ColumnSchema> {
        self.entity_schema(entity)?.primary_column()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
