//! Programmatic schema construction.
//!
//! `SchemaBuilder` applies the naming conventions (table pluralisation, column
//! case, relation column defaults), assigns table aliases and validates the
//! result. It produces exactly the structures an external schema generator
//! would hand to the engine.
//!
//! ## Example
//!
//! ```rust
//! use mooring::schema::{ColumnDefinition, EntityDefinition, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .entity(
//!         EntityDefinition::new("User")
//!             .column(ColumnDefinition::int("id").primary().auto_increment())
//!             .column(ColumnDefinition::string("firstName"))
//!             .column(ColumnDefinition::many_to_one("address", "Address").nullable()),
//!     )
//!     .entity(
//!         EntityDefinition::new("Address")
//!             .column(ColumnDefinition::int("id").primary())
//!             .column(ColumnDefinition::one_to_many("users", "User")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let provider = mooring::schema::SchemaProvider::new(schema);
//! let user = provider.entity_schema("User").unwrap();
//! assert_eq!(user.table, "users");
//! assert_eq!(user.table_alias, "u");
//! assert_eq!(user.column_by_property("address").unwrap().column_name, "address_id");
//! ```

use super::column::{ColumnSchema, ColumnType, LogicalType, Relation};
use super::entity::EntitySchema;
use super::naming::{self, Case};
use super::provider::Schema;
use crate::config::DatabaseConfig;
use crate::error::{OrmError, Result};
use crate::value::{EnumType, Value};

#[derive(Debug, Clone)]
enum RelationDefinition {
    ManyToOne(String),
    OneToMany {
        entity: String,
        relation_column: Option<String>,
    },
}

/// Declaration of one mapped property.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    property: String,
    name: Option<String>,
    logical_type: LogicalType,
    column_type: ColumnType,
    relation: Option<RelationDefinition>,
    primary: bool,
    auto_increment: bool,
    nullable: bool,
    size: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    default: Option<Value>,
    enum_type: Option<EnumType>,
    extension: Option<String>,
    extension_options: serde_json::Value,
}

impl ColumnDefinition {
    pub fn new(property: impl Into<String>, logical_type: LogicalType, column_type: ColumnType) -> Self {
        Self {
            property: property.into(),
            name: None,
            logical_type,
            column_type,
            relation: None,
            primary: false,
            auto_increment: false,
            nullable: false,
            size: None,
            precision: None,
            scale: None,
            default: None,
            enum_type: None,
            extension: None,
            extension_options: serde_json::Value::Null,
        }
    }

    pub fn string(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::String, ColumnType::String)
    }

    pub fn int(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::Int, ColumnType::Int)
    }

    pub fn float(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::Float, ColumnType::Float)
    }

    pub fn bool(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::Bool, ColumnType::Boolean)
    }

    pub fn uuid(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::Uuid, ColumnType::Uuid)
    }

    pub fn datetime(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::DateTime, ColumnType::DateTime)
    }

    pub fn datetime_immutable(property: impl Into<String>) -> Self {
        Self::new(property, LogicalType::DateTimeImmutable, ColumnType::DateTime)
    }

    pub fn enumeration(property: impl Into<String>, enum_type: EnumType) -> Self {
        let mut column = Self::new(property, LogicalType::Enum, ColumnType::Enum);
        column.enum_type = Some(enum_type);
        column
    }

    /// Column converted by the extension mapper registered under `extension`.
    pub fn extension(property: impl Into<String>, extension: impl Into<String>, column_type: ColumnType) -> Self {
        let mut column = Self::new(property, LogicalType::Extension, column_type);
        column.extension = Some(extension.into());
        column
    }

    /// Reference to one `entity`; stored in `<property>Id` unless renamed.
    pub fn many_to_one(property: impl Into<String>, entity: impl Into<String>) -> Self {
        let mut column = Self::new(property, LogicalType::Relation, ColumnType::Int);
        column.size = Some(11);
        column.relation = Some(RelationDefinition::ManyToOne(entity.into()));
        column
    }

    /// Collection of `entity` rows whose relation column holds this entity's key.
    pub fn one_to_many(property: impl Into<String>, entity: impl Into<String>) -> Self {
        let mut column = Self::new(property, LogicalType::Relation, ColumnType::Int);
        column.relation = Some(RelationDefinition::OneToMany {
            entity: entity.into(),
            relation_column: None,
        });
        column
    }

    /// Explicit column name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark a scalar column as a foreign key to `entity` so dotted paths can
    /// traverse it. The property keeps its scalar type.
    pub fn foreign_key(mut self, entity: impl Into<String>) -> Self {
        self.relation = Some(RelationDefinition::ManyToOne(entity.into()));
        self
    }

    /// Foreign-key column on the related table of a OneToMany relation.
    pub fn relation_column(mut self, column: impl Into<String>) -> Self {
        if let Some(RelationDefinition::OneToMany { relation_column, .. }) = &mut self.relation {
            *relation_column = Some(column.into());
        }
        self
    }

    /// Options handed to the extension mapper.
    pub fn options(mut self, options: serde_json::Value) -> Self {
        self.extension_options = options;
        self
    }

    fn into_schema(self, owner: &str, column_case: Case) -> Result<ColumnSchema> {
        let column_name = match (&self.name, &self.relation) {
            (Some(name), _) => name.clone(),
            (None, Some(RelationDefinition::ManyToOne(_))) if self.logical_type == LogicalType::Relation => {
                column_case.apply(&format!("{}Id", self.property))
            }
            _ => column_case.apply(&self.property),
        };

        let relation = match self.relation {
            None => None,
            Some(RelationDefinition::ManyToOne(entity)) => Some(Relation::ManyToOne { entity }),
            Some(RelationDefinition::OneToMany {
                entity,
                relation_column,
            }) => Some(Relation::OneToMany {
                entity,
                relation_column: relation_column
                    .unwrap_or_else(|| column_case.apply(&naming::relation_column_name(owner))),
            }),
        };

        if self.logical_type == LogicalType::Relation && relation.is_none() {
            return Err(OrmError::InvalidSchema(format!(
                "relation property \"{}\" of {owner} has no related entity",
                self.property
            )));
        }
        if self.logical_type == LogicalType::Enum && self.enum_type.is_none() {
            return Err(OrmError::InvalidSchema(format!(
                "enum property \"{}\" of {owner} has no enum type",
                self.property
            )));
        }
        if self.logical_type == LogicalType::Extension && self.extension.is_none() {
            return Err(OrmError::InvalidSchema(format!(
                "extension property \"{}\" of {owner} names no extension",
                self.property
            )));
        }

        Ok(ColumnSchema {
            property_name: self.property,
            column_name,
            logical_type: self.logical_type,
            column_type: self.column_type,
            relation,
            primary: self.primary,
            auto_increment: self.auto_increment,
            nullable: self.nullable,
            size: self.size,
            precision: self.precision,
            scale: self.scale,
            default: self.default,
            enum_type: self.enum_type,
            extension: self.extension,
            extension_options: self.extension_options,
        })
    }
}

/// Declaration of one mapped entity.
#[derive(Debug, Clone)]
pub struct EntityDefinition {
    name: String,
    table: Option<String>,
    alias: Option<String>,
    repository: Option<String>,
    constructor: Vec<String>,
    columns: Vec<ColumnDefinition>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            alias: None,
            repository: None,
            constructor: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Fixed table alias instead of an assigned one.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Properties passed to the entity constructor, in parameter order.
    pub fn constructor<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }
}

/// Builds a validated [`Schema`] from entity definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    table_case: Case,
    column_case: Case,
    entities: Vec<EntityDefinition>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder using the naming cases from configuration.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new()
            .table_case(config.table_case)
            .column_case(config.column_case)
    }

    pub fn table_case(mut self, case: Case) -> Self {
        self.table_case = case;
        self
    }

    pub fn column_case(mut self, case: Case) -> Self {
        self.column_case = case;
        self
    }

    pub fn entity(mut self, entity: EntityDefinition) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut used_aliases: Vec<String> = self
            .entities
            .iter()
            .filter_map(|e| e.alias.clone())
            .collect();
        let mut schemas = Vec::with_capacity(self.entities.len());

        for definition in self.entities {
            let table = definition
                .table
                .clone()
                .unwrap_or_else(|| naming::table_name(&self.table_case.apply(&definition.name)));
            let alias = match definition.alias {
                Some(alias) => alias,
                None => {
                    let alias = assign_alias(&table, &used_aliases);
                    used_aliases.push(alias.clone());
                    alias
                }
            };

            let columns = definition
                .columns
                .into_iter()
                .map(|c| c.into_schema(&definition.name, self.column_case))
                .collect::<Result<Vec<_>>>()?;

            let mut schema = EntitySchema::new(definition.name, table, alias, columns)?;
            for property in &definition.constructor {
                if !schema.has_property(property) {
                    return Err(OrmError::InvalidSchema(format!(
                        "constructor property \"{property}\" is not declared on {}",
                        schema.entity
                    )));
                }
            }
            schema = schema.with_constructor(definition.constructor);
            if let Some(repository) = definition.repository {
                schema = schema.with_repository(repository);
            }
            schemas.push(schema);
        }

        Schema::new(schemas)
    }
}

/// Shortest prefix of `table` not in `used`; `table2`, `table3`, ... once
/// every prefix is taken.
fn assign_alias(table: &str, used: &[String]) -> String {
    let prefixes = table
        .char_indices()
        .map(|(idx, ch)| &table[..idx + ch.len_utf8()]);
    for prefix in prefixes {
        if !used.iter().any(|u| u == prefix) {
            return prefix.to_string();
        }
    }
    (2..)
        .map(|n| format!("{table}{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| table.to_string())
}
