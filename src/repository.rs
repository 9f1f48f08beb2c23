//! Repository façade over one entity type.
//!
//! ```rust,no_run
//! # fn demo<User: mooring::Entity>(orm: &mooring::Orm, mut user: User) -> mooring::Result<()> {
//! let users = orm.repository::<User>();
//! let jane = users.find_one([("firstName", "Jane")])?;
//! users.persist(&mut user)?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::orm::Orm;
use crate::query::{Criteria, Select};
use crate::value::Value;

pub struct Repository<T> {
    orm: Orm,
    _entity: PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub(crate) fn new(orm: Orm) -> Self {
        Self {
            orm,
            _entity: PhantomData,
        }
    }

    pub fn select(&self) -> Select<T> {
        self.orm.select::<T>()
    }

    /// The entity with primary key `id`.
    ///
    /// Fails with [`OrmError::EntityNotFound`] when no row matches.
    pub fn find(&self, id: impl Into<Value>) -> Result<Rc<T>> {
        let id = id.into();
        let instance = self.orm.session().find_by_id(T::NAME, &id)?;
        instance
            .downcast::<T>()
            .map_err(|_| OrmError::Usage(format!("Cached instance is not a {}", T::NAME)))
    }

    pub fn find_all(&self) -> Result<Vec<Rc<T>>> {
        self.select().fetch_all()
    }

    /// First entity matching `criteria`, if any.
    pub fn find_one(&self, criteria: impl Into<Criteria>) -> Result<Option<Rc<T>>> {
        self.select().and_where(criteria).fetch_one()
    }

    /// Insert `entity` when its primary key is null, update it otherwise.
    pub fn persist(&self, entity: &mut T) -> Result<()> {
        let primary = self.orm.schema_provider().primary_column(T::NAME)?;
        if entity.get_property(&primary.property_name)?.is_null() {
            self.orm.insert::<T>().entity(entity).execute()
        } else {
            self.orm.update::<T>().entity(entity).execute()
        }
    }

    pub fn delete(&self, entity: &T) -> Result<()> {
        self.orm.delete::<T>().entity(entity).execute()
    }
}

impl<T> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<T>())
            .finish()
    }
}
