//! Select query builder.
//!
//! [`SelectStatement`] is the untyped statement: it names its root entity and
//! renders against a [`SchemaProvider`]. [`Select`] wraps one for a bound
//! entity type and executes it on the session that created it.
//!
//! Rendered shape:
//!
//! ```text
//! SELECT <cols> FROM `table` `alias` [LEFT JOIN ...]* [WHERE ...]
//!     [GROUP BY ...] [ORDER BY ...] [LIMIT n] [OFFSET n]
//! ```
//!
//! # Example
//!
//! ```rust
//! use mooring::query::{Direction, SelectStatement};
//!
//! let statement = SelectStatement::new("User")
//!     .and_where(("firstName", "Jane"))
//!     .order_by("last_name", Direction::Desc)
//!     .limit(10);
//! assert_eq!(statement.params().len(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;

use super::execution;
use super::join::{ColumnResolver, Join, JoinSet};
use super::where_builder::{Criteria, WhereBuilder, WhereValue};
use crate::connection::Row;
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::orm::Session;
use crate::schema::naming::escape;
use crate::schema::SchemaProvider;
use crate::value::Value;

/// Sort direction of an `ORDER BY` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(OrmError::Usage(format!("Invalid order direction \"{s}\""))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped select over one root entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    entity: String,
    columns: Vec<String>,
    joins: Vec<Join>,
    where_builder: WhereBuilder,
    group_by: Vec<String>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectStatement {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            where_builder: WhereBuilder::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Replace the projection. Column paths are resolved like where columns;
    /// expressions containing `(` are emitted as written.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Left join `reference_table` on `reference_column` = root `column`.
    pub fn join(
        self,
        column: &str,
        reference_table: &str,
        reference_alias: &str,
        reference_column: &str,
    ) -> Self {
        self.join_from("", column, reference_table, reference_alias, reference_column)
    }

    /// Like [`SelectStatement::join`] but joins from the table under
    /// `table_alias`. An empty alias means the root table.
    pub fn join_from(
        mut self,
        table_alias: &str,
        column: &str,
        reference_table: &str,
        reference_alias: &str,
        reference_column: &str,
    ) -> Self {
        self.joins.push(Join {
            table_alias: table_alias.to_string(),
            column: column.to_string(),
            reference_table: reference_table.to_string(),
            reference_alias: reference_alias.to_string(),
            reference_column: reference_column.to_string(),
        });
        self
    }

    pub fn and_where(mut self, criteria: impl Into<Criteria>) -> Self {
        self.where_builder = std::mem::take(&mut self.where_builder).and_where(criteria);
        self
    }

    pub fn and_where_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(WhereBuilder) -> WhereBuilder,
    {
        self.where_builder = std::mem::take(&mut self.where_builder).and_where_group(build);
        self
    }

    pub fn or_where(mut self, criteria: impl Into<Criteria>) -> Self {
        self.where_builder = std::mem::take(&mut self.where_builder).or_where(criteria);
        self
    }

    pub fn or_where_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(WhereBuilder) -> WhereBuilder,
    {
        self.where_builder = std::mem::take(&mut self.where_builder).or_where_group(build);
        self
    }

    pub fn where_builder(&self) -> &WhereBuilder {
        &self.where_builder
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render the statement. Relation paths in the projection, conditions,
    /// grouping and ordering add their joins in that order.
    pub fn to_sql(&self, provider: &SchemaProvider) -> Result<String> {
        let schema = provider.entity_schema(&self.entity)?;

        let mut joins = JoinSet::new();
        for join in &self.joins {
            let mut join = join.clone();
            if join.table_alias.is_empty() {
                join.table_alias = schema.table_alias.clone();
            }
            joins.add((join.table_alias.clone(), join.column.clone()), join);
        }

        let (columns, where_sql, group_by, order_by) = {
            let mut resolver = ColumnResolver::new(provider, schema, &mut joins);

            let columns = if self.columns.is_empty() {
                schema
                    .selectable_columns()
                    .iter()
                    .map(|column| resolver.resolve(&column.column_name))
                    .collect::<Result<Vec<_>>>()?
            } else {
                self.columns
                    .iter()
                    .map(|column| resolver.resolve(column))
                    .collect::<Result<Vec<_>>>()?
            };
            let where_sql = self.where_builder.build(&mut resolver)?;
            let group_by = self
                .group_by
                .iter()
                .map(|column| resolver.resolve(column))
                .collect::<Result<Vec<_>>>()?;
            let order_by = self
                .order_by
                .iter()
                .map(|(column, direction)| -> Result<String> {
                    Ok(format!("{} {direction}", resolver.resolve(column)?))
                })
                .collect::<Result<Vec<_>>>()?;
            (columns, where_sql, group_by, order_by)
        };

        let mut sql = format!(
            "SELECT {} FROM {} {}",
            columns.join(","),
            escape(&schema.table),
            escape(&schema.table_alias)
        );
        if !joins.is_empty() {
            sql.push(' ');
            sql.push_str(&joins.to_sql());
        }
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.where_builder.params()
    }
}

/// Select over the entity type `T`, executed on its session.
pub struct Select<T> {
    session: Rc<Session>,
    statement: SelectStatement,
    _marker: PhantomData<T>,
}

impl<T: Entity> Select<T> {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self {
            session,
            statement: SelectStatement::new(T::NAME),
            _marker: PhantomData,
        }
    }

    fn map(mut self, f: impl FnOnce(SelectStatement) -> SelectStatement) -> Self {
        self.statement = f(self.statement);
        self
    }

    pub fn columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|s| s.columns(columns))
    }

    pub fn join(
        self,
        column: &str,
        reference_table: &str,
        reference_alias: &str,
        reference_column: &str,
    ) -> Self {
        self.map(|s| s.join(column, reference_table, reference_alias, reference_column))
    }

    pub fn and_where(self, criteria: impl Into<Criteria>) -> Self {
        self.map(|s| s.and_where(criteria))
    }

    pub fn and_where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(WhereBuilder) -> WhereBuilder,
    {
        self.map(|s| s.and_where_group(build))
    }

    pub fn or_where(self, criteria: impl Into<Criteria>) -> Self {
        self.map(|s| s.or_where(criteria))
    }

    pub fn or_where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(WhereBuilder) -> WhereBuilder,
    {
        self.map(|s| s.or_where_group(build))
    }

    pub fn group_by<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|s| s.group_by(columns))
    }

    pub fn order_by(self, column: impl Into<String>, direction: Direction) -> Self {
        self.map(|s| s.order_by(column, direction))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.map(|s| s.limit(limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.map(|s| s.offset(offset))
    }

    pub fn get_sql(&self) -> Result<String> {
        self.statement.to_sql(self.session.provider())
    }

    pub fn params(&self) -> Vec<Value> {
        self.statement.params()
    }

    /// First matching entity; the statement is limited to one row.
    pub fn fetch_one(&self) -> Result<Option<Rc<T>>> {
        match self.fetch_assoc_one()? {
            Some(row) => self.session.factory().create::<T>(&row).map(Some),
            None => Ok(None),
        }
    }

    pub fn fetch_all(&self) -> Result<Vec<Rc<T>>> {
        let factory = self.session.factory();
        self.fetch_assoc_all()?
            .iter()
            .map(|row| factory.create::<T>(row))
            .collect()
    }

    /// First matching row, unmapped.
    pub fn fetch_assoc_one(&self) -> Result<Option<Row>> {
        let statement = self.statement.clone().limit(1);
        Ok(self.session.fetch_rows(&statement)?.into_iter().next())
    }

    pub fn fetch_assoc_all(&self) -> Result<Vec<Row>> {
        self.session.fetch_rows(&self.statement)
    }

    /// Number of matching rows, selected as `count(*) as c`.
    pub fn count(&self) -> Result<i64> {
        let statement = self.statement.clone().columns(["count(*) as c"]);
        let sql = statement.to_sql(self.session.provider())?;
        let rows = execution::query(self.session.connection(), &sql, &statement.params())?;
        rows.first()
            .and_then(|row| row.get("c"))
            .and_then(Value::as_int)
            .ok_or_else(|| OrmError::Usage(format!("Count query returned no count [{sql}]")))
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    pub fn into_statement(self) -> SelectStatement {
        self.statement
    }
}

impl<T> Clone for Select<T> {
    fn clone(&self) -> Self {
        Self {
            session: Rc::clone(&self.session),
            statement: self.statement.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Select<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("statement", &self.statement)
            .finish()
    }
}

impl<T: Entity> From<Select<T>> for WhereValue {
    fn from(select: Select<T>) -> Self {
        WhereValue::Subquery(Box::new(select.into_statement()))
    }
}
