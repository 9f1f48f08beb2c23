//! Connection Module
//!
//! The engine never talks to a database library directly. It sees a connection
//! only through the [`Connection`] and [`Statement`] traits defined here:
//!
//! - `prepare(sql)` returns a statement
//! - `Statement::execute(params)` binds positional parameters and runs it
//! - `Statement::fetch_row()` pulls the next result row, `None` at the end
//! - `last_insert_id()` returns the identifier generated by the last insert
//!
//! Connection lifecycle and transactions belong to the caller.

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use thiserror::Error;

use crate::value::Value;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockConnection;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

/// Error reported by a driver.
///
/// `sql_state` follows the SQLSTATE convention; class `23` marks an integrity
/// constraint violation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub sql_state: Option<String>,
    pub code: Option<i64>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            code: None,
        }
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// True for SQLSTATE class 23 (integrity constraint violation).
    pub fn is_integrity_violation(&self) -> bool {
        self.sql_state
            .as_deref()
            .is_some_and(|state| state.starts_with("23"))
    }
}

/// One fetched result row: column label to raw value, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    /// Builder-style [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_vec(self) -> Vec<(String, Value)> {
        self.columns
    }
}

impl From<Vec<(String, Value)>> for Row {
    fn from(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }
}

/// A database connection as seen by the engine.
pub trait Connection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError>;

    fn last_insert_id(&self) -> Result<Value, DriverError>;
}

/// A prepared statement.
pub trait Statement {
    /// Bind `params` positionally and run the statement.
    fn execute(&mut self, params: &[Value]) -> Result<(), DriverError>;

    /// Next row produced by the last [`Statement::execute`].
    fn fetch_row(&mut self) -> Result<Option<Row>, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_violation_by_sql_state_class() {
        assert!(DriverError::new("x").with_sql_state("23000").is_integrity_violation());
        assert!(DriverError::new("x").with_sql_state("23505").is_integrity_violation());
        assert!(!DriverError::new("x").with_sql_state("42000").is_integrity_violation());
        assert!(!DriverError::new("x").is_integrity_violation());
    }

    #[test]
    fn test_row_lookup_by_name() {
        let row = Row::new().with("id", 1i64).with("first_name", "Jane");
        assert_eq!(row.get("first_name"), Some(&Value::Text("Jane".into())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
    }
}
