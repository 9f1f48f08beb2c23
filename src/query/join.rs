//! Joins and column-path resolution.
//!
//! [`ColumnResolver`] turns the column references a query is written with into
//! qualified, quoted SQL identifiers. A dotted path such as `address.country.name`
//! walks relation properties one segment at a time and registers a `LEFT JOIN`
//! for every hop; each hop is joined at most once per query.

use crate::error::{OrmError, Result};
use crate::schema::naming::escape;
use crate::schema::{EntitySchema, Relation, SchemaProvider};

/// One `LEFT JOIN`, rendered as
/// `LEFT JOIN <reference_table> <reference_alias> ON <reference_alias>.<reference_column>=<table_alias>.<column>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table_alias: String,
    pub column: String,
    pub reference_table: String,
    pub reference_alias: String,
    pub reference_column: String,
}

impl Join {
    pub fn to_sql(&self) -> String {
        format!(
            "LEFT JOIN {} {} ON {}.{}={}.{}",
            escape(&self.reference_table),
            escape(&self.reference_alias),
            escape(&self.reference_alias),
            escape(&self.reference_column),
            escape(&self.table_alias),
            escape(&self.column),
        )
    }
}

/// Ordered set of joins keyed by `(source alias, relation column)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinSet {
    joins: Vec<((String, String), Join)>,
}

impl JoinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `join` under `key` unless the key is already present.
    /// Returns the alias the joined table is reachable under.
    pub fn add(&mut self, key: (String, String), join: Join) -> String {
        if let Some((_, existing)) = self.joins.iter().find(|(k, _)| *k == key) {
            return existing.reference_alias.clone();
        }
        let alias = join.reference_alias.clone();
        self.joins.push((key, join));
        alias
    }

    pub fn get(&self, table_alias: &str, column: &str) -> Option<&Join> {
        self.joins
            .iter()
            .find(|((a, c), _)| a == table_alias && c == column)
            .map(|(_, join)| join)
    }

    fn alias_in_use(&self, alias: &str) -> bool {
        self.joins.iter().any(|(_, j)| j.reference_alias == alias)
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter().map(|(_, join)| join)
    }

    /// All joins separated by spaces; `""` when empty.
    pub fn to_sql(&self) -> String {
        self.iter().map(Join::to_sql).collect::<Vec<_>>().join(" ")
    }
}

/// Resolves column references against a root entity schema.
pub struct ColumnResolver<'a> {
    provider: &'a SchemaProvider,
    root: &'a EntitySchema,
    joins: &'a mut JoinSet,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(provider: &'a SchemaProvider, root: &'a EntitySchema, joins: &'a mut JoinSet) -> Self {
        Self {
            provider,
            root,
            joins,
        }
    }

    pub fn provider(&self) -> &'a SchemaProvider {
        self.provider
    }

    /// Qualified SQL for a column reference.
    ///
    /// - a raw expression containing `(` is returned unchanged
    /// - a single name is qualified with the root alias; it may be a column
    ///   name or a property name
    /// - `alias.column` is qualified as written when `alias` is the root alias
    ///   or the alias of a join added explicitly
    /// - a dotted path joins every relation segment and qualifies the last
    ///   segment with the alias of the final joined table
    pub fn resolve(&mut self, path: &str) -> Result<String> {
        if path.contains('(') {
            return Ok(path.to_string());
        }

        let segments: Vec<&str> = path.split('.').collect();
        let Some((&terminal, relations)) = segments.split_last() else {
            return Ok(path.to_string());
        };

        if relations.is_empty() {
            let column = self
                .root
                .column_by_column_name(terminal)
                .or_else(|_| self.root.column_by_property(terminal))
                .map(|c| c.column_name.as_str())
                .unwrap_or(terminal);
            return Ok(qualify(&self.root.table_alias, column));
        }

        // `alias.column` naming the root or an already joined table.
        if let [alias] = relations {
            if !self.root.has_property(alias) {
                if *alias == self.root.table_alias {
                    let column = self
                        .root
                        .column_by_column_name(terminal)
                        .or_else(|_| self.root.column_by_property(terminal))?;
                    return Ok(qualify(alias, &column.column_name));
                }
                if self.joins.alias_in_use(alias) {
                    return Ok(qualify(alias, terminal));
                }
            }
        }

        let mut schema = self.root;
        let mut alias = self.root.table_alias.clone();
        for segment in relations {
            let column = schema.column_by_property(segment)?;
            let Some(relation) = &column.relation else {
                return Err(OrmError::Usage(format!(
                    "Column \"{segment}\" of {} is not a relation",
                    schema.entity
                )));
            };
            let target = self.provider.entity_schema(relation.entity())?;

            let (join_column, reference_column) = match relation {
                Relation::ManyToOne { .. } => (
                    column.column_name.clone(),
                    target.primary_column()?.column_name.clone(),
                ),
                Relation::OneToMany {
                    relation_column, ..
                } => (
                    schema.primary_column()?.column_name.clone(),
                    relation_column.clone(),
                ),
            };

            let key = (alias.clone(), column.column_name.clone());
            let reference_alias = match self.joins.get(&key.0, &key.1) {
                Some(existing) => existing.reference_alias.clone(),
                None => self.unique_alias(&target.table_alias),
            };
            alias = self.joins.add(
                key,
                Join {
                    table_alias: alias.clone(),
                    column: join_column,
                    reference_table: target.table.clone(),
                    reference_alias,
                    reference_column,
                },
            );
            schema = target;
        }

        let column = schema
            .column_by_column_name(terminal)
            .or_else(|_| schema.column_by_property(terminal))?;
        Ok(qualify(&alias, &column.column_name))
    }

    /// `preferred`, or `preferred2`, `preferred3`, ... when the root table or
    /// another join already uses it.
    fn unique_alias(&self, preferred: &str) -> String {
        let taken = |alias: &str| alias == self.root.table_alias || self.joins.alias_in_use(alias);
        if !taken(preferred) {
            return preferred.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{preferred}{n}");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn qualify(alias: &str, column: &str) -> String {
    format!("{}.{}", escape(alias), escape(column))
}
