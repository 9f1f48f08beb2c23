//! SQLite driver adapter over `rusqlite`.

use std::collections::VecDeque;
use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, ErrorCode};

use super::{Connection, DriverError, Row, Statement};
use crate::config::DatabaseConfig;
use crate::value::Value;

/// SQLSTATE reported for SQLite constraint failures.
const INTEGRITY_CONSTRAINT_VIOLATION: &str = "23000";

/// A [`Connection`] backed by a `rusqlite::Connection`.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let conn = rusqlite::Connection::open(path).map_err(driver_error)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, DriverError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(driver_error)?;
        Ok(Self { conn })
    }

    /// Open the database named by `config.path` (`:memory:` for an in-memory database).
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DriverError> {
        if config.path == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(&config.path)
        }
    }

    /// Run one or more `;`-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        self.conn.execute_batch(sql).map_err(driver_error)
    }

    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl From<rusqlite::Connection> for SqliteConnection {
    fn from(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }
}

impl Connection for SqliteConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError> {
        let stmt = self.conn.prepare(sql).map_err(driver_error)?;
        Ok(Box::new(SqliteStatement {
            stmt,
            rows: VecDeque::new(),
        }))
    }

    fn last_insert_id(&self) -> Result<Value, DriverError> {
        Ok(Value::Int(self.conn.last_insert_rowid()))
    }
}

struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    rows: VecDeque<Row>,
}

impl Statement for SqliteStatement<'_> {
    fn execute(&mut self, params: &[Value]) -> Result<(), DriverError> {
        self.rows.clear();
        if self.stmt.column_count() == 0 {
            self.stmt
                .execute(params_from_iter(params.iter()))
                .map_err(driver_error)?;
            return Ok(());
        }

        // Rows are buffered so the connection is free for nested relation queries.
        let names: Vec<String> = self
            .stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = self
            .stmt
            .query(params_from_iter(params.iter()))
            .map_err(driver_error)?;
        while let Some(row) = rows.next().map_err(driver_error)? {
            let mut fetched = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let value = row.get_ref(idx).map_err(driver_error)?;
                fetched.push(name.clone(), from_value_ref(value));
            }
            self.rows.push_back(fetched);
        }
        Ok(())
    }

    fn fetch_row(&mut self) -> Result<Option<Row>, DriverError> {
        Ok(self.rows.pop_front())
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(r) => Value::Float(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

fn driver_error(err: rusqlite::Error) -> DriverError {
    let mut driver = DriverError::new(err.to_string());
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        driver = driver.with_code(i64::from(failure.extended_code));
        if failure.code == ErrorCode::ConstraintViolation {
            driver = driver.with_sql_state(INTEGRITY_CONSTRAINT_VIOLATION);
        }
    }
    driver
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE `items` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `name` TEXT NOT NULL UNIQUE);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_insert_and_fetch() {
        let conn = connection();
        let mut insert = conn.prepare("INSERT INTO `items` (`name`) VALUES (?)").unwrap();
        insert.execute(&[Value::from("bolt")]).unwrap();
        drop(insert);
        assert_eq!(conn.last_insert_id().unwrap(), Value::Int(1));

        let mut select = conn.prepare("SELECT `id`, `name` FROM `items`").unwrap();
        select.execute(&[]).unwrap();
        let row = select.fetch_row().unwrap().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert_eq!(row.get("name"), Some(&Value::from("bolt")));
        assert!(select.fetch_row().unwrap().is_none());
    }

    #[test]
    fn test_unique_violation_maps_to_integrity_state() {
        let conn = connection();
        let mut insert = conn.prepare("INSERT INTO `items` (`name`) VALUES (?)").unwrap();
        insert.execute(&[Value::from("nut")]).unwrap();
        let err = insert.execute(&[Value::from("nut")]).unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(err.sql_state.as_deref(), Some("23000"));
    }

    #[test]
    fn test_prepare_error_is_not_integrity_violation() {
        let conn = connection();
        let err = conn.prepare("SELECT * FROM `missing`").err().unwrap();
        assert!(!err.is_integrity_violation());
    }
}
