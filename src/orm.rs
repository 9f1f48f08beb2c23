//! Engine instance.
//!
//! An [`Orm`] is one session: it owns the schema provider, the connection, the
//! identity cache and the extension provider, and knows which Rust type is
//! bound to each entity schema. Every builder and lazy handle it creates
//! points back at it.
//!
//! ```rust,no_run
//! # #[cfg(feature = "sqlite")]
//! # fn demo(schema: mooring::schema::Schema) -> mooring::Result<()> {
//! use mooring::connection::SqliteConnection;
//! use mooring::Orm;
//!
//! let connection = SqliteConnection::open_in_memory()?;
//! let orm = Orm::builder(schema).connect(connection)?;
//! {
//!     let _scope = orm.scope();
//!     // materialized entities are shared until the scope ends
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The engine is single-threaded: handles are `Rc` based and the session is
//! neither `Send` nor `Sync`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, trace};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

#[cfg(feature = "sqlite")]
use crate::config::DatabaseConfig;
#[cfg(feature = "sqlite")]
use crate::connection::SqliteConnection;

use crate::connection::{Connection, Row};
use crate::entity::{Entity, EntityCache, EntityFactory};
use crate::error::{OrmError, Result};
use crate::mapper::{ExtensionMapper, ExtensionProvider, Mapper};
use crate::query::execution;
use crate::query::{Delete, Insert, Select, SelectStatement, Update};
use crate::relation::{CollectionRef, Reference, RelationRef};
use crate::repository::Repository;
use crate::schema::{LogicalType, Schema, SchemaProvider};
use crate::value::{Property, Value};

type Materialize = fn(&Session, &Row) -> Result<Rc<dyn Any>>;
type Probe = fn(&dyn Any, &str) -> Result<Property>;

/// Type-erased hooks for one bound entity type.
#[derive(Clone, Copy)]
struct EntityBinding {
    materialize: Materialize,
    property: Probe,
}

impl EntityBinding {
    fn of<T: Entity>() -> Self {
        Self {
            materialize: materialize_as::<T>,
            property: property_of::<T>,
        }
    }
}

fn materialize_as<T: Entity>(session: &Session, row: &Row) -> Result<Rc<dyn Any>> {
    let entity: Rc<dyn Any> = EntityFactory::new(session).create::<T>(row)?;
    Ok(entity)
}

fn property_of<T: Entity>(instance: &dyn Any, property: &str) -> Result<Property> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| OrmError::Usage(format!("Instance is not a {}", T::NAME)))?
        .get_property(property)
}

/// Shared state behind an [`Orm`] and everything it hands out.
pub(crate) struct Session {
    this: Weak<Session>,
    provider: SchemaProvider,
    connection: Box<dyn Connection>,
    cache: RefCell<EntityCache>,
    extensions: ExtensionProvider,
    bindings: HashMap<String, EntityBinding>,
}

impl Session {
    pub(crate) fn provider(&self) -> &SchemaProvider {
        &self.provider
    }

    pub(crate) fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub(crate) fn cache(&self) -> &RefCell<EntityCache> {
        &self.cache
    }

    pub(crate) fn extensions(&self) -> &ExtensionProvider {
        &self.extensions
    }

    pub(crate) fn mapper(&self) -> Mapper<'_> {
        Mapper::new(self)
    }

    pub(crate) fn factory(&self) -> EntityFactory<'_> {
        EntityFactory::new(self)
    }

    fn binding(&self, entity: &str) -> Result<EntityBinding> {
        self.bindings
            .get(entity)
            .copied()
            .ok_or_else(|| OrmError::EntityNotRegistered(entity.to_string()))
    }

    /// Materialize `row` as the type bound to `entity`.
    pub(crate) fn materialize(&self, entity: &str, row: &Row) -> Result<Rc<dyn Any>> {
        (self.binding(entity)?.materialize)(self, row)
    }

    /// Primary-key column value of an in-memory instance of `entity`.
    pub(crate) fn primary_value(&self, entity: &str, instance: &dyn Any) -> Result<Value> {
        let primary = self.provider.primary_column(entity)?;
        let property = (self.binding(entity)?.property)(instance, &primary.property_name)?;
        self.mapper().map_to_column(primary, &property)
    }

    pub(crate) fn fetch_rows(&self, statement: &SelectStatement) -> Result<Vec<Row>> {
        let sql = statement.to_sql(&self.provider)?;
        execution::query(self.connection(), &sql, &statement.params())
    }

    /// The `entity` whose primary key is `id`, from the cache or the database.
    pub(crate) fn find_by_id(&self, entity: &str, id: &Value) -> Result<Rc<dyn Any>> {
        if let Some(cached) = self.cache.borrow().get(entity, id) {
            return Ok(cached);
        }
        let primary = self.provider.primary_column(entity)?;
        let statement = SelectStatement::new(entity)
            .and_where((primary.column_name.as_str(), id.clone()))
            .limit(1);
        let rows = self.fetch_rows(&statement)?;
        let row = rows.first().ok_or_else(|| OrmError::EntityNotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        })?;
        self.materialize(entity, row)
    }

    /// Every `entity` whose `relation_column` equals `owner`.
    pub(crate) fn find_related(
        &self,
        entity: &str,
        relation_column: &str,
        owner: &Value,
    ) -> Result<Vec<Rc<dyn Any>>> {
        let statement = SelectStatement::new(entity).and_where((relation_column, owner.clone()));
        self.fetch_rows(&statement)?
            .iter()
            .map(|row| self.materialize(entity, row))
            .collect()
    }

    /// ManyToOne handle: resolved when the target is cached, lazy otherwise.
    pub(crate) fn reference(&self, entity: &str, id: Value) -> RelationRef {
        if let Some(cached) = self.cache.borrow().get(entity, &id) {
            return RelationRef::resolved(entity, Some(id), cached);
        }

        let session = self.this.clone();
        let target = entity.to_string();
        let key = id.clone();
        RelationRef::lazy(
            entity,
            id,
            Box::new(move || {
                #[cfg(feature = "tracing")]
                let _span = tracing_helpers::resolve_relation_span(&target, "many_to_one").entered();

                trace!("resolving {target}#{key}");
                let session = session.upgrade().ok_or(OrmError::SessionClosed)?;
                session.find_by_id(&target, &key)
            }),
        )
    }

    /// OneToMany handle selecting `entity` rows by `relation_column`.
    pub(crate) fn collection(&self, entity: &str, relation_column: &str, owner: Value) -> CollectionRef {
        let session = self.this.clone();
        let target = entity.to_string();
        let relation_column = relation_column.to_string();
        CollectionRef::lazy(
            entity,
            Box::new(move || {
                #[cfg(feature = "tracing")]
                let _span = tracing_helpers::resolve_relation_span(&target, "one_to_many").entered();

                trace!("resolving {target} where {relation_column}={owner}");
                let session = session.upgrade().ok_or(OrmError::SessionClosed)?;
                session.find_related(&target, &relation_column, &owner)
            }),
        )
    }
}

/// Binds entity types and extensions to a schema, then connects.
pub struct OrmBuilder {
    schema: Schema,
    bindings: HashMap<String, EntityBinding>,
    extensions: ExtensionProvider,
}

impl OrmBuilder {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            bindings: HashMap::new(),
            extensions: ExtensionProvider::new(),
        }
    }

    /// Bind `T` to the schema entry named [`Entity::NAME`].
    pub fn entity<T: Entity>(mut self) -> Self {
        self.bindings.insert(T::NAME.to_string(), EntityBinding::of::<T>());
        self
    }

    /// Register an extension mapper factory under `name`.
    pub fn extension<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Rc<dyn ExtensionMapper> + 'static,
    {
        self.extensions.register(name, factory);
        self
    }

    /// Validate the bindings and create the engine on `connection`.
    pub fn connect<C: Connection + 'static>(self, connection: C) -> Result<Orm> {
        let provider = SchemaProvider::new(self.schema);
        for entity in self.bindings.keys() {
            provider.entity_schema(entity)?;
        }
        for schema in provider.schema().entities() {
            for column in schema.columns() {
                if column.logical_type != LogicalType::Extension {
                    continue;
                }
                match column.extension.as_deref() {
                    Some(name) if self.extensions.is_registered(name) => {}
                    Some(name) => return Err(OrmError::ExtensionNotFound(name.to_string())),
                    None => {
                        return Err(OrmError::InvalidSchema(format!(
                            "Extension column \"{}\" of {} names no extension",
                            column.column_name, schema.entity
                        )))
                    }
                }
            }
        }

        debug!(
            "mooring session ready: {} entity schema(s), {} bound type(s)",
            provider.schema().entities().count(),
            self.bindings.len()
        );
        let session = Rc::new_cyclic(|this| Session {
            this: this.clone(),
            provider,
            connection: Box::new(connection),
            cache: RefCell::new(EntityCache::new()),
            extensions: self.extensions,
            bindings: self.bindings,
        });
        Ok(Orm { session })
    }

    /// Connect to the SQLite database named in `config`.
    #[cfg(feature = "sqlite")]
    pub fn connect_with_config(self, config: &DatabaseConfig) -> Result<Orm> {
        let connection = SqliteConnection::from_config(config)?;
        self.connect(connection)
    }
}

impl fmt::Debug for OrmBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrmBuilder")
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Engine instance and query provider.
#[derive(Clone)]
pub struct Orm {
    session: Rc<Session>,
}

impl Orm {
    pub fn builder(schema: Schema) -> OrmBuilder {
        OrmBuilder::new(schema)
    }

    pub fn select<T: Entity>(&self) -> Select<T> {
        Select::new(Rc::clone(&self.session))
    }

    pub fn insert<'a, T: Entity>(&self) -> Insert<'a, T> {
        Insert::new(Rc::clone(&self.session))
    }

    pub fn update<'a, T: Entity>(&self) -> Update<'a, T> {
        Update::new(Rc::clone(&self.session))
    }

    pub fn delete<'a, T: Entity>(&self) -> Delete<'a, T> {
        Delete::new(Rc::clone(&self.session))
    }

    pub fn repository<T: Entity>(&self) -> Repository<T> {
        Repository::new(self.clone())
    }

    pub fn mapper(&self) -> Mapper<'_> {
        self.session.mapper()
    }

    pub fn factory(&self) -> EntityFactory<'_> {
        self.session.factory()
    }

    pub fn schema_provider(&self) -> &SchemaProvider {
        self.session.provider()
    }

    pub fn connection(&self) -> &dyn Connection {
        self.session.connection()
    }

    /// Reference to the `T` with primary key `id`, for assigning to a
    /// ManyToOne field without loading the target.
    pub fn reference<T: Entity>(&self, id: impl Into<Value>) -> Reference<T> {
        Reference::from_raw(self.session.reference(T::NAME, id.into()))
    }

    /// The cached `T` with primary key `id`, if one was materialized.
    pub fn cached<T: Entity>(&self, id: impl Into<Value>) -> Option<Rc<T>> {
        self.session.cache().borrow().get_typed::<T>(&id.into())
    }

    pub fn cache_len(&self) -> usize {
        self.session.cache().borrow().len()
    }

    /// Forget every materialized instance.
    pub fn clear(&self) {
        self.session.cache().borrow_mut().clear();
    }

    /// Guard that clears the identity cache when dropped.
    pub fn scope(&self) -> CacheScope<'_> {
        CacheScope { orm: self }
    }

    pub(crate) fn session(&self) -> &Rc<Session> {
        &self.session
    }
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("entities", &self.session.bindings.keys().collect::<Vec<_>>())
            .field("cache", &self.session.cache.borrow())
            .finish()
    }
}

/// Session boundary; see [`Orm::scope`].
pub struct CacheScope<'a> {
    orm: &'a Orm,
}

impl Drop for CacheScope<'_> {
    fn drop(&mut self) {
        self.orm.clear();
    }
}
