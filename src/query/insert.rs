//! Insert query builder.
//!
//! Renders one multi-row statement over the insertable columns:
//!
//! ```text
//! INSERT INTO `table` (`col1`,`col2`) VALUES (?,?),(?,?)
//! ```
//!
//! When the primary key is auto-increment, [`Insert::execute`] runs one
//! single-row statement per entity instead, so each entity receives its own
//! generated key.

use std::rc::Rc;

use log::debug;

use super::execution;
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::orm::Session;
use crate::schema::naming::escape;
use crate::schema::EntitySchema;
use crate::value::Value;

pub struct Insert<'a, T> {
    session: Rc<Session>,
    entities: Vec<&'a mut T>,
}

impl<'a, T: Entity> Insert<'a, T> {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self {
            session,
            entities: Vec::new(),
        }
    }

    pub fn entity(mut self, entity: &'a mut T) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn entities<I>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = &'a mut T>,
    {
        self.entities.extend(entities);
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// SQL for every attached entity; an error when none is attached.
    ///
    /// With an auto-increment primary key [`execute`](Self::execute) does not
    /// run this statement. It runs one single-row statement per entity so each
    /// one gets its generated key. If one of them fails, the entities before it
    /// stay inserted and keep the keys already assigned.
    pub fn get_sql(&self) -> Result<String> {
        self.ensure_entities()?;
        Ok(render(self.schema()?, self.entities.len()))
    }

    /// Column values of every attached entity, row after row.
    pub fn params(&self) -> Result<Vec<Value>> {
        let schema = self.schema()?;
        let mut params = Vec::new();
        for entity in &self.entities {
            params.extend(row_values(&self.session, schema, &**entity)?);
        }
        Ok(params)
    }

    pub fn execute(self) -> Result<()> {
        self.ensure_entities()?;
        let Insert { session, entities } = self;
        let schema = session.provider().entity_schema(T::NAME)?;
        let primary = schema.primary_column()?;

        if !primary.auto_increment {
            let mut params = Vec::new();
            for entity in &entities {
                params.extend(row_values(&session, schema, &**entity)?);
            }
            return execution::execute(
                session.connection(),
                &render(schema, entities.len()),
                &params,
            );
        }

        let sql = render(schema, 1);
        let mapper = session.mapper();
        for entity in entities {
            let params = row_values(&session, schema, &*entity)?;
            execution::execute(session.connection(), &sql, &params)?;
            let id = session.connection().last_insert_id()?;
            debug!("inserted {} with generated key {id}", T::NAME);
            let property = mapper.map_to_property(schema, primary, &id)?;
            entity.set_property(&primary.property_name, property)?;
        }
        Ok(())
    }

    fn schema(&self) -> Result<&EntitySchema> {
        self.session.provider().entity_schema(T::NAME)
    }

    fn ensure_entities(&self) -> Result<()> {
        if self.entities.is_empty() {
            return Err(OrmError::Usage(format!(
                "No entities to insert into {}",
                T::NAME
            )));
        }
        Ok(())
    }
}

fn render(schema: &EntitySchema, rows: usize) -> String {
    let columns = schema.insertable_columns();
    let names = columns
        .iter()
        .map(|column| escape(&column.column_name))
        .collect::<Vec<_>>()
        .join(",");
    let tuple = format!("({})", vec!["?"; columns.len()].join(","));
    format!(
        "INSERT INTO {} ({names}) VALUES {}",
        escape(&schema.table),
        vec![tuple; rows].join(",")
    )
}

fn row_values<T: Entity>(session: &Session, schema: &EntitySchema, entity: &T) -> Result<Vec<Value>> {
    let mapper = session.mapper();
    schema
        .insertable_columns()
        .into_iter()
        .map(|column| {
            let property = entity.get_property(&column.property_name)?;
            mapper.map_to_column(column, &property)
        })
        .collect()
}
