//! Update query builder.
//!
//! ```text
//! UPDATE `table` SET `col1`=:prop1,`col2`=:prop2 WHERE `pk`=:pk_prop
//! ```
//!
//! Placeholders are named after the properties; values are bound in order of
//! appearance (the SET list, then the key).

use std::rc::Rc;

use super::execution;
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::orm::Session;
use crate::schema::naming::escape;
use crate::schema::EntitySchema;
use crate::value::Value;

pub struct Update<'a, T> {
    session: Rc<Session>,
    entity: Option<&'a T>,
}

impl<'a, T: Entity> Update<'a, T> {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self {
            session,
            entity: None,
        }
    }

    pub fn entity(mut self, entity: &'a T) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn get_sql(&self) -> Result<String> {
        self.attached()?;
        let schema = self.schema()?;
        let primary = schema.primary_column()?;
        let set = schema
            .insertable_columns()
            .iter()
            .map(|column| format!("{}=:{}", escape(&column.column_name), column.property_name))
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!(
            "UPDATE {} SET {set} WHERE {}=:{}",
            escape(&schema.table),
            escape(&primary.column_name),
            primary.property_name
        ))
    }

    pub fn params(&self) -> Result<Vec<Value>> {
        let entity = self.attached()?;
        let schema = self.schema()?;
        let mapper = self.session.mapper();
        let mut params = Vec::new();
        for column in schema.insertable_columns() {
            let property = entity.get_property(&column.property_name)?;
            params.push(mapper.map_to_column(column, &property)?);
        }
        let primary = schema.primary_column()?;
        params.push(mapper.map_to_column(primary, &entity.get_property(&primary.property_name)?)?);
        Ok(params)
    }

    /// Write the entity. The identity cache entry for its key is dropped, so
    /// the next select materializes the stored state.
    pub fn execute(self) -> Result<()> {
        let sql = self.get_sql()?;
        let params = self.params()?;
        execution::execute(self.session.connection(), &sql, &params)?;
        if let Some(id) = params.last() {
            self.session.cache().borrow_mut().remove(T::NAME, id);
        }
        Ok(())
    }

    fn attached(&self) -> Result<&'a T> {
        self.entity
            .ok_or_else(|| OrmError::Usage(format!("No {} entity to update", T::NAME)))
    }

    fn schema(&self) -> Result<&EntitySchema> {
        self.session.provider().entity_schema(T::NAME)
    }
}
