//! Scripted in-memory connection for tests.
//!
//! `MockConnection` records every statement it prepares and every parameter
//! list bound to it, and answers queries with canned rows. Clones share state,
//! so a test can keep one handle for assertions after moving another into the
//! engine.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Connection, DriverError, Row, Statement};
use crate::value::Value;

#[derive(Default)]
struct MockState {
    prepared: Vec<String>,
    executed: Vec<(String, Vec<Value>)>,
    queued: VecDeque<Vec<Row>>,
    rules: Vec<(String, Vec<Row>)>,
    failures: VecDeque<Option<DriverError>>,
    last_insert_id: Value,
    next_id: Option<i64>,
}

#[derive(Clone, Default)]
pub struct MockConnection {
    state: Rc<RefCell<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for the next executed query that no rule matched.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.borrow_mut().queued.push_back(rows);
    }

    /// Rows served to every query whose SQL contains `fragment`.
    pub fn when_sql_contains(&self, fragment: impl Into<String>, rows: Vec<Row>) {
        self.state.borrow_mut().rules.push((fragment.into(), rows));
    }

    /// Fail the next `execute` call with `error`.
    ///
    /// Queued after [`succeed_next`](Self::succeed_next), the failure hits a
    /// later call instead.
    pub fn fail_next(&self, error: DriverError) {
        self.state.borrow_mut().failures.push_back(Some(error));
    }

    /// Let the next `execute` call through before any queued failure.
    pub fn succeed_next(&self) {
        self.state.borrow_mut().failures.push_back(None);
    }

    pub fn set_last_insert_id(&self, id: impl Into<Value>) {
        self.state.borrow_mut().last_insert_id = id.into();
    }

    /// Generate ids `start`, `start + 1`, ... for successive INSERT statements.
    pub fn auto_increment(&self, start: i64) {
        self.state.borrow_mut().next_id = Some(start);
    }

    pub fn prepared(&self) -> Vec<String> {
        self.state.borrow().prepared.clone()
    }

    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.state.borrow().executed.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.state
            .borrow()
            .executed
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }
}

impl Connection for MockConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError> {
        self.state.borrow_mut().prepared.push(sql.to_string());
        Ok(Box::new(MockStatement {
            state: Rc::clone(&self.state),
            sql: sql.to_string(),
            rows: VecDeque::new(),
        }))
    }

    fn last_insert_id(&self) -> Result<Value, DriverError> {
        Ok(self.state.borrow().last_insert_id.clone())
    }
}

struct MockStatement {
    state: Rc<RefCell<MockState>>,
    sql: String,
    rows: VecDeque<Row>,
}

impl Statement for MockStatement {
    fn execute(&mut self, params: &[Value]) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        if let Some(Some(error)) = state.failures.pop_front() {
            return Err(error);
        }
        state.executed.push((self.sql.clone(), params.to_vec()));

        if self.sql.starts_with("INSERT") {
            if let Some(id) = state.next_id {
                state.last_insert_id = Value::Int(id);
                state.next_id = Some(id + 1);
            }
        }

        if self.sql.starts_with("SELECT") {
            let matched = state
                .rules
                .iter()
                .find(|(fragment, _)| self.sql.contains(fragment.as_str()))
                .map(|(_, rows)| rows.clone());
            let rows = match matched {
                Some(rows) => rows,
                None => state.queued.pop_front().unwrap_or_default(),
            };
            self.rows = rows.into();
        }
        Ok(())
    }

    fn fetch_row(&mut self) -> Result<Option<Row>, DriverError> {
        Ok(self.rows.pop_front())
    }
}
