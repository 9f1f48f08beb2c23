//! Error types for the mapping and query engine.
//!
//! Every failure the engine can report is a variant of [`OrmError`]. Nothing in
//! the core retries or swallows an error: it is returned from the call that
//! triggered it.

use crate::connection::DriverError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OrmError>;

/// Error type for schema lookups, value mapping, query execution and relation resolution.
#[derive(Debug, Error)]
pub enum OrmError {
    /// No schema is registered for the entity.
    #[error("Entity schema not found: {0}")]
    SchemaNotFound(String),

    /// The entity schema has no column with the given property or column name.
    #[error("Column \"{column}\" not found on entity {entity}")]
    ColumnNotFound { entity: String, column: String },

    /// The entity schema declares no primary column.
    #[error("Primary column schema not found on entity {0}")]
    PrimaryColumnNotFound(String),

    /// The schema description violates a structural invariant.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A schema exists but no Rust type was bound to it.
    #[error("Entity {0} is not registered with this engine")]
    EntityNotRegistered(String),

    /// A null value was supplied for a column that is not nullable.
    #[error("Column \"{0}\" is not nullable")]
    NotNullable(String),

    /// A value does not match the logical type declared for its column.
    #[error("Invalid value type for column {column}: expected {expected}, got {actual}")]
    InvalidValueType {
        column: String,
        expected: String,
        actual: String,
    },

    /// An extension column names a converter nobody registered.
    #[error("Extension mapper not registered: {0}")]
    ExtensionNotFound(String),

    /// The driver reported an integrity constraint violation.
    #[error("Constraint violation: {source} [{sql}]")]
    Constraint {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// The driver failed to prepare or execute a statement.
    #[error("Query failed: {source} [{sql}]")]
    Query {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// A driver call that is not tied to a statement failed.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A lazily referenced entity does not exist.
    #[error("Entity \"{entity}\" with id \"{id}\" not found")]
    EntityNotFound { entity: String, id: String },

    /// A lazy handle was dereferenced after its engine was dropped.
    #[error("The session that created this relation has been closed")]
    SessionClosed,

    /// A lazy handle was dereferenced while it was already resolving.
    #[error("Relation to {0} was dereferenced while it was being resolved")]
    RelationCycle(String),

    /// A builder was rendered or executed without its required state.
    #[error("{0}")]
    Usage(String),
}

impl OrmError {
    pub(crate) fn column_not_found(entity: &str, column: &str) -> Self {
        OrmError::ColumnNotFound {
            entity: entity.to_string(),
            column: column.to_string(),
        }
    }

    pub(crate) fn invalid_value(column: &str, expected: &str, actual: &str) -> Self {
        OrmError::InvalidValueType {
            column: column.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether this error is a constraint violation reported by the driver.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, OrmError::Constraint { .. })
    }

    /// SQL text of the statement that failed, for query errors.
    pub fn sql(&self) -> Option<&str> {
        match self {
            OrmError::Constraint { sql, .. } | OrmError::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
