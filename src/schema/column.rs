//! Column schema: how one entity property maps to one table column.

use crate::value::{EnumType, Value};

/// Type of the property on the entity side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    String,
    Int,
    Float,
    Bool,
    Uuid,
    DateTime,
    DateTimeImmutable,
    Enum,
    Relation,
    Extension,
}

impl LogicalType {
    pub fn is_datetime(self) -> bool {
        matches!(self, LogicalType::DateTime | LogicalType::DateTimeImmutable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Int => "int",
            LogicalType::Float => "float",
            LogicalType::Bool => "bool",
            LogicalType::Uuid => "uuid",
            LogicalType::DateTime => "datetime",
            LogicalType::DateTimeImmutable => "datetime_immutable",
            LogicalType::Enum => "enum",
            LogicalType::Relation => "relation",
            LogicalType::Extension => "extension",
        }
    }
}

/// Storage type of the column. Only used as a hint, except that date/time
/// values are formatted according to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    SmallInt,
    Int,
    BigInt,
    Decimal,
    Float,
    Double,
    String,
    TinyText,
    Text,
    MediumText,
    LongText,
    Boolean,
    Uuid,
    Binary,
    Blob,
    Date,
    DateTime,
    Time,
    Timestamp,
    Enum,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    ManyToOne,
    OneToMany,
}

/// Relation carried by a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// The column stores the primary key of `entity`.
    ManyToOne { entity: String },
    /// `relation_column` on `entity`'s table stores this entity's primary key.
    /// Nothing is stored on this side.
    OneToMany {
        entity: String,
        relation_column: String,
    },
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::ManyToOne { .. } => RelationKind::ManyToOne,
            Relation::OneToMany { .. } => RelationKind::OneToMany,
        }
    }

    pub fn entity(&self) -> &str {
        match self {
            Relation::ManyToOne { entity } | Relation::OneToMany { entity, .. } => entity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub property_name: String,
    pub column_name: String,
    pub logical_type: LogicalType,
    pub column_type: ColumnType,
    pub relation: Option<Relation>,
    pub primary: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default: Option<Value>,
    pub enum_type: Option<EnumType>,
    /// Name of the extension mapper for `Extension` columns.
    pub extension: Option<String>,
    pub extension_options: serde_json::Value,
}

impl ColumnSchema {
    pub fn new(
        property_name: impl Into<String>,
        column_name: impl Into<String>,
        logical_type: LogicalType,
        column_type: ColumnType,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            column_name: column_name.into(),
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

    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.relation.as_ref().map(Relation::kind)
    }

    pub fn is_one_to_many(&self) -> bool {
        self.relation_kind() == Some(RelationKind::OneToMany)
    }

    pub fn is_many_to_one(&self) -> bool {
        self.relation_kind() == Some(RelationKind::ManyToOne)
    }

    /// Included in INSERT and UPDATE value lists.
    pub fn is_insertable(&self) -> bool {
        !self.primary && !self.is_one_to_many()
    }

    /// Backed by a real column of the table.
    pub fn is_selectable(&self) -> bool {
        !self.is_one_to_many()
    }
}
