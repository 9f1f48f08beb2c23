//! Where-expression builder
//!
//! A [`WhereBuilder`] accumulates an AND group of predicates plus any number of
//! OR alternatives, then renders them to SQL with `?` placeholders. Parameters
//! come out of [`WhereBuilder::params`] depth-first, left to right, in exactly
//! the order their placeholders appear in the rendered text.
//!
//! ## Rendering
//!
//! - AND group: `a AND b AND c`
//! - OR alternatives: appended as ` OR x`; an empty AND group becomes `1`,
//!   an empty alternative is dropped
//! - nested groups render parenthesized
//! - `IN` with a list: `col IN (?,?,?)`; with a subquery: `col IN (<sql>)`
//! - symbolic operators render tight (`col=?`), word operators spaced (`col LIKE ?`)
//!
//! ## Example
//!
//! ```rust
//! use mooring::query::WhereBuilder;
//!
//! let builder = WhereBuilder::new()
//!     .and_where(("id", 1))
//!     .and_where_group(|b| b.and_where(("name", "John")).or_where(("name", "Jane")));
//! assert_eq!(builder.params().len(), 3);
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use super::join::ColumnResolver;
use super::select::SelectStatement;
use crate::error::{OrmError, Result};
use crate::value::{BackedEnum, Value};

/// Format used for date/time parameters.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static OPERATOR: Lazy<std::result::Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"(?i)^(=|!=|<>|<=|>=|<|>|(NOT\s+)?(IN|LIKE|GLOB|REGEXP)|IS(\s+NOT)?)$")
});

/// Right-hand side of a predicate.
///
/// Conversions normalize values as they are built: UUIDs become their
/// canonical string, date/times are formatted with [`DATETIME_FORMAT`], enums
/// unwrap to their backing scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    Scalar(Value),
    List(Vec<WhereValue>),
    Subquery(Box<SelectStatement>),
}

impl WhereValue {
    pub fn from_enum<E: BackedEnum>(value: &E) -> Self {
        WhereValue::Scalar(value.backing())
    }

    fn collect_params(&self, out: &mut Vec<Value>) {
        match self {
            WhereValue::Scalar(value) => out.push(value.clone()),
            WhereValue::List(items) => items.iter().for_each(|item| item.collect_params(out)),
            WhereValue::Subquery(select) => out.extend(select.params()),
        }
    }
}

impl From<Value> for WhereValue {
    fn from(value: Value) -> Self {
        WhereValue::Scalar(value)
    }
}

macro_rules! scalar_where_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for WhereValue {
                fn from(value: $ty) -> Self {
                    WhereValue::Scalar(Value::from(value))
                }
            }
        )*
    };
}

scalar_where_value!(i64, i32, u32, f64, bool, String, &str);

impl From<Uuid> for WhereValue {
    fn from(value: Uuid) -> Self {
        WhereValue::Scalar(Value::Text(value.to_string()))
    }
}

impl From<NaiveDateTime> for WhereValue {
    fn from(value: NaiveDateTime) -> Self {
        WhereValue::Scalar(Value::Text(value.format(DATETIME_FORMAT).to_string()))
    }
}

impl From<DateTime<Utc>> for WhereValue {
    fn from(value: DateTime<Utc>) -> Self {
        WhereValue::from(value.naive_utc())
    }
}

impl<T: Into<WhereValue>> From<Option<T>> for WhereValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(WhereValue::Scalar(Value::Null), Into::into)
    }
}

impl<T: Into<WhereValue>> From<Vec<T>> for WhereValue {
    fn from(values: Vec<T>) -> Self {
        WhereValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<WhereValue>, const N: usize> From<[T; N]> for WhereValue {
    fn from(values: [T; N]) -> Self {
        WhereValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<SelectStatement> for WhereValue {
    fn from(select: SelectStatement) -> Self {
        WhereValue::Subquery(Box::new(select))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Condition {
        column: String,
        operator: String,
        value: WhereValue,
    },
    Group(WhereBuilder),
}

/// One or more `(column, operator, value)` conditions joined by AND.
///
/// Built from a triple `(column, operator, value)`, a pair `(column, value)`
/// meaning `=`, or an array/`Vec` of either.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Criteria(Vec<(String, String, WhereValue)>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, column: &str, operator: &str, value: impl Into<WhereValue>) -> Self {
        self.0.push((column.to_string(), operator.to_string(), value.into()));
        self
    }

    pub fn eq(self, column: &str, value: impl Into<WhereValue>) -> Self {
        self.add(column, "=", value)
    }
}

impl<V: Into<WhereValue>> From<(&str, &str, V)> for Criteria {
    fn from((column, operator, value): (&str, &str, V)) -> Self {
        Criteria::new().add(column, operator, value)
    }
}

impl<V: Into<WhereValue>> From<(&str, V)> for Criteria {
    fn from((column, value): (&str, V)) -> Self {
        Criteria::new().eq(column, value)
    }
}

impl<V: Into<WhereValue>> From<Vec<(&str, V)>> for Criteria {
    fn from(pairs: Vec<(&str, V)>) -> Self {
        pairs
            .into_iter()
            .fold(Criteria::new(), |criteria, (column, value)| criteria.eq(column, value))
    }
}

impl<V: Into<WhereValue>, const N: usize> From<[(&str, V); N]> for Criteria {
    fn from(pairs: [(&str, V); N]) -> Self {
        Criteria::from(Vec::from(pairs))
    }
}

impl<V: Into<WhereValue>> From<Vec<(&str, &str, V)>> for Criteria {
    fn from(triples: Vec<(&str, &str, V)>) -> Self {
        triples
            .into_iter()
            .fold(Criteria::new(), |criteria, (column, operator, value)| {
                criteria.add(column, operator, value)
            })
    }
}

impl<V: Into<WhereValue>, const N: usize> From<[(&str, &str, V); N]> for Criteria {
    fn from(triples: [(&str, &str, V); N]) -> Self {
        Criteria::from(Vec::from(triples))
    }
}

/// Composable boolean predicate tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereBuilder {
    conditions: Vec<Predicate>,
    alternatives: Vec<WhereBuilder>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.alternatives.is_empty()
    }

    /// No condition anywhere in the tree, only empty groups.
    fn is_vacuous(&self) -> bool {
        self.alternatives.is_empty()
            && self
                .conditions
                .iter()
                .all(|predicate| matches!(predicate, Predicate::Group(group) if group.is_vacuous()))
    }

    /// Append conditions to the AND group.
    pub fn and_where(mut self, criteria: impl Into<Criteria>) -> Self {
        let Criteria(conditions) = criteria.into();
        self.conditions
            .extend(conditions.into_iter().map(|(column, operator, value)| {
                Predicate::Condition {
                    column,
                    operator,
                    value,
                }
            }));
        self
    }

    /// Append a parenthesized sub-expression to the AND group.
    pub fn and_where_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(WhereBuilder) -> WhereBuilder,
    {
        self.conditions.push(Predicate::Group(build(WhereBuilder::new())));
        self
    }

    /// Add an OR alternative made of `criteria` joined by AND.
    ///
    /// An alternative without conditions is dropped.
    pub fn or_where(mut self, criteria: impl Into<Criteria>) -> Self {
        let alternative = WhereBuilder::new().and_where(criteria);
        if !alternative.is_empty() {
            self.alternatives.push(alternative);
        }
        self
    }

    /// Add a parenthesized OR alternative. An empty group is dropped.
    pub fn or_where_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(WhereBuilder) -> WhereBuilder,
    {
        let group = build(WhereBuilder::new());
        if !group.is_vacuous() {
            self.alternatives.push(WhereBuilder {
                conditions: vec![Predicate::Group(group)],
                alternatives: Vec::new(),
            });
        }
        self
    }

    /// Render the expression; `""` when nothing was added.
    ///
    /// Dotted column paths register joins on `resolver`.
    pub fn build(&self, resolver: &mut ColumnResolver<'_>) -> Result<String> {
        let mut parts = Vec::with_capacity(self.conditions.len());
        for predicate in &self.conditions {
            parts.push(render_predicate(predicate, resolver)?);
        }
        let mut sql = parts.join(" AND ");

        let mut alternatives = Vec::with_capacity(self.alternatives.len());
        for alternative in &self.alternatives {
            let rendered = alternative.build(resolver)?;
            if !rendered.is_empty() {
                alternatives.push(rendered);
            }
        }
        if !alternatives.is_empty() {
            // `1` is only the neutral AND group in front of OR alternatives.
            if sql.is_empty() {
                sql.push('1');
            }
            for rendered in alternatives {
                sql.push_str(" OR ");
                sql.push_str(&rendered);
            }
        }
        Ok(sql)
    }

    /// Flattened parameters in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params(&self, out: &mut Vec<Value>) {
        for predicate in &self.conditions {
            match predicate {
                Predicate::Condition { value, .. } => value.collect_params(out),
                Predicate::Group(group) => group.collect_params(out),
            }
        }
        for alternative in &self.alternatives {
            alternative.collect_params(out);
        }
    }
}

fn render_predicate(predicate: &Predicate, resolver: &mut ColumnResolver<'_>) -> Result<String> {
    let (column, operator, value) = match predicate {
        Predicate::Group(group) => {
            let inner = group.build(resolver)?;
            return Ok(if inner.is_empty() {
                "1".to_string()
            } else {
                format!("({inner})")
            });
        }
        Predicate::Condition {
            column,
            operator,
            value,
        } => (column, operator.trim(), value),
    };

    let pattern = OPERATOR
        .as_ref()
        .map_err(|e| OrmError::Usage(format!("Invalid operator pattern: {e}")))?;
    if !pattern.is_match(operator) {
        return Err(OrmError::Usage(format!("Unsupported operator \"{operator}\"")));
    }
    let operator = operator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    let column = resolver.resolve(column)?;
    let is_in = operator == "IN" || operator == "NOT IN";

    match value {
        WhereValue::List(items) if is_in => {
            if items.is_empty() {
                // No rows match an empty IN list; every row matches an empty NOT IN list.
                return Ok(if operator == "IN" { "1=0" } else { "1=1" }.to_string());
            }
            if items.iter().any(|item| !matches!(item, WhereValue::Scalar(_))) {
                return Err(OrmError::Usage(format!(
                    "{operator} list on {column} may only hold scalar values"
                )));
            }
            let placeholders = vec!["?"; items.len()].join(",");
            Ok(format!("{column} {operator} ({placeholders})"))
        }
        WhereValue::Subquery(select) if is_in => {
            let sql = select.to_sql(resolver.provider())?;
            Ok(format!("{column} {operator} ({sql})"))
        }
        WhereValue::Scalar(_) if is_in => Err(OrmError::Usage(format!(
            "{operator} condition on {column} needs a list or a subquery"
        ))),
        WhereValue::Scalar(_) => {
            if operator.starts_with(|c: char| c.is_ascii_alphabetic()) {
                Ok(format!("{column} {operator} ?"))
            } else {
                Ok(format!("{column}{operator}?"))
            }
        }
        _ => Err(OrmError::Usage(format!(
            "operator {operator} on {column} needs a single value"
        ))),
    }
}
