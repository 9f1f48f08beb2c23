//! Entity schema: one mapped type and its ordered columns.

use std::collections::HashMap;

use super::column::ColumnSchema;
use crate::error::{OrmError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    pub entity: String,
    pub table: String,
    /// Short alias used to qualify this table's columns in rendered SQL.
    pub table_alias: String,
    /// Name of the repository binding, if the entity declares one.
    pub repository: Option<String>,
    /// Properties set through the entity's constructor, in parameter order.
    pub constructor: Vec<String>,
    columns: Vec<ColumnSchema>,
    by_property: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
}

impl EntitySchema {
    /// Build a schema, checking that property and column names are unique and
    /// that exactly one column is primary.
    pub fn new(
        entity: impl Into<String>,
        table: impl Into<String>,
        table_alias: impl Into<String>,
        columns: Vec<ColumnSchema>,
    ) -> Result<Self> {
        let entity = entity.into();
        let mut by_property = HashMap::with_capacity(columns.len());
        let mut by_column = HashMap::with_capacity(columns.len());

        for (idx, column) in columns.iter().enumerate() {
            if by_property.insert(column.property_name.clone(), idx).is_some() {
                return Err(OrmError::InvalidSchema(format!(
                    "duplicate property \"{}\" on entity {entity}",
                    column.property_name
                )));
            }
            if by_column.insert(column.column_name.clone(), idx).is_some() {
                return Err(OrmError::InvalidSchema(format!(
                    "duplicate column \"{}\" on entity {entity}",
                    column.column_name
                )));
            }
        }

        match columns.iter().filter(|c| c.primary).count() {
            1 => {}
            0 => return Err(OrmError::PrimaryColumnNotFound(entity)),
            n => {
                return Err(OrmError::InvalidSchema(format!(
                    "entity {entity} declares {n} primary columns"
                )))
            }
        }

        Ok(Self {
            entity,
            table: table.into(),
            table_alias: table_alias.into(),
            repository: None,
            constructor: Vec::new(),
            columns,
            by_property,
            by_column,
        })
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_constructor<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor = properties.into_iter().map(Into::into).collect();
        self
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn primary_column(&self) -> Result<&ColumnSchema> {
        self.columns
            .iter()
            .find(|c| c.primary)
            .ok_or_else(|| OrmError::PrimaryColumnNotFound(self.entity.clone()))
    }

    pub fn column_by_property(&self, property: &str) -> Result<&ColumnSchema> {
        self.by_property
            .get(property)
            .map(|&idx| &self.columns[idx])
            .ok_or_else(|| OrmError::column_not_found(&self.entity, property))
    }

    pub fn column_by_column_name(&self, column: &str) -> Result<&ColumnSchema> {
        self.by_column
            .get(column)
            .map(|&idx| &self.columns[idx])
            .ok_or_else(|| OrmError::column_not_found(&self.entity, column))
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.by_property.contains_key(property)
    }

    /// Columns written by INSERT and UPDATE: everything except the primary key
    /// and OneToMany relations.
    pub fn insertable_columns(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.is_insertable()).collect()
    }

    /// Columns read by a default SELECT projection.
    pub fn selectable_columns(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.is_selectable()).collect()
    }

    /// Properties not set through the constructor, in declaration order.
    pub fn post_construction_properties(&self) -> Vec<&ColumnSchema> {
        self.columns
            .iter()
            .filter(|c| !self.constructor.contains(&c.property_name))
            .collect()
    }
}
