//! Delete query builder.
//!
//! ```text
//! DELETE FROM `table` WHERE `pk` IN (?,?,?)
//! ```
//!
//! Targets are entities or raw primary-key values. With no target nothing is
//! prepared or executed.

use std::rc::Rc;

use log::debug;

use super::execution;
use crate::entity::Entity;
use crate::error::Result;
use crate::orm::Session;
use crate::schema::naming::escape;
use crate::value::Value;

enum Target<'a, T> {
    Entity(&'a T),
    Id(Value),
}

pub struct Delete<'a, T> {
    session: Rc<Session>,
    targets: Vec<Target<'a, T>>,
}

impl<'a, T: Entity> Delete<'a, T> {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self {
            session,
            targets: Vec::new(),
        }
    }

    pub fn entity(mut self, entity: &'a T) -> Self {
        self.targets.push(Target::Entity(entity));
        self
    }

    pub fn id(mut self, id: impl Into<Value>) -> Self {
        self.targets.push(Target::Id(id.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get_sql(&self) -> Result<String> {
        let schema = self.session.provider().entity_schema(T::NAME)?;
        let primary = schema.primary_column()?;
        Ok(format!(
            "DELETE FROM {} WHERE {} IN ({})",
            escape(&schema.table),
            escape(&primary.column_name),
            vec!["?"; self.targets.len()].join(",")
        ))
    }

    /// Primary keys of the targets, in the order they were added.
    pub fn params(&self) -> Result<Vec<Value>> {
        let primary = self.session.provider().primary_column(T::NAME)?;
        let mapper = self.session.mapper();
        self.targets
            .iter()
            .map(|target| match target {
                Target::Entity(entity) => {
                    mapper.map_to_column(primary, &entity.get_property(&primary.property_name)?)
                }
                Target::Id(id) => Ok(id.clone()),
            })
            .collect()
    }

    /// Delete the targets and drop them from the identity cache.
    pub fn execute(self) -> Result<()> {
        if self.targets.is_empty() {
            debug!("nothing to delete from {}", T::NAME);
            return Ok(());
        }
        let sql = self.get_sql()?;
        let ids = self.params()?;
        execution::execute(self.session.connection(), &sql, &ids)?;

        let mut cache = self.session.cache().borrow_mut();
        for id in &ids {
            cache.remove(T::NAME, id);
        }
        Ok(())
    }
}
