//! Entity materializer.
//!
//! Turns one fetched [`Row`] into an entity instance, reusing the instance
//! already in the identity cache when the primary key matches.

use std::rc::Rc;

use log::trace;

use super::{ConstructorArgs, Entity};
use crate::connection::Row;
use crate::error::{OrmError, Result};
use crate::orm::Session;
use crate::schema::{ColumnSchema, EntitySchema};
use crate::value::{Property, Value};

pub struct EntityFactory<'s> {
    session: &'s Session,
}

impl<'s> EntityFactory<'s> {
    pub(crate) fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Materialize `row` as a `T`.
    ///
    /// Cells are looked up by column name, then by property name. A missing
    /// cell reads as null.
    pub fn create<T: Entity>(&self, row: &Row) -> Result<Rc<T>> {
        let schema = self.session.provider().entity_schema(T::NAME)?;
        let primary = schema.primary_column()?;
        let id = cell(row, primary).clone();

        if !id.is_null() {
            if let Some(cached) = self.session.cache().borrow().get(T::NAME, &id) {
                return cached.downcast::<T>().map_err(|_| {
                    OrmError::Usage(format!(
                        "Identity cache holds another type under {}#{id}",
                        T::NAME
                    ))
                });
            }
        }

        let mut args = ConstructorArgs::new(T::NAME);
        for property in &schema.constructor {
            let column = schema.column_by_property(property)?;
            args.push(property.clone(), self.property(schema, column, row, &id)?);
        }
        let mut entity = T::construct(&mut args)?;

        for column in schema.post_construction_properties() {
            let value = self.property(schema, column, row, &id)?;
            entity.set_property(&column.property_name, value)?;
        }

        let entity = Rc::new(entity);
        if !id.is_null() {
            trace!("registering {}#{id} in identity cache", T::NAME);
            self.session
                .cache()
                .borrow_mut()
                .insert(T::NAME, &id, Rc::clone(&entity) as Rc<dyn std::any::Any>);
        }
        Ok(entity)
    }

    fn property(
        &self,
        schema: &EntitySchema,
        column: &ColumnSchema,
        row: &Row,
        id: &Value,
    ) -> Result<Property> {
        // OneToMany columns are not stored; they are keyed by the owner's id.
        let raw = if column.is_one_to_many() {
            id
        } else {
            cell(row, column)
        };
        self.session.mapper().map_to_property(schema, column, raw)
    }
}

fn cell<'r>(row: &'r Row, column: &ColumnSchema) -> &'r Value {
    static NULL: Value = Value::Null;
    row.get(&column.column_name)
        .or_else(|| row.get(&column.property_name))
        .unwrap_or(&NULL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MockConnection;
    use crate::tests_cfg::{self, User, UserType};

    fn user_row(id: i64) -> Row {
        Row::new()
            .with("id", id)
            .with("created_at", "2024-01-01 00:00:00")
            .with("first_name", "Jane")
            .with("middle_name", Value::Null)
            .with("last_name", "Doe")
            .with("email", "jane@example.com")
            .with("is_active", 1i64)
            .with("type", "admin")
            .with("address_id", 1i64)
            .with("second_address_id", Value::Null)
    }

    #[test]
    fn test_materialize_user() {
        let conn = MockConnection::new();
        let orm = tests_cfg::orm(conn.clone());
        let user = orm.factory().create::<User>(&user_row(2)).unwrap();
        assert_eq!(user.id, Some(2));
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.middle_name, None);
        assert_eq!(user.last_name, "Doe");
        assert!(user.is_active);
        assert_eq!(user.user_type, UserType::Admin);
        assert_eq!(user.address.id(), Some(&Value::Int(1)));
        assert!(user.second_address.is_none());
        assert!(conn.prepared().is_empty());

        // address 1 has no row; the lookup happens on first access
        let err = user.address.get().unwrap_err();
        assert!(matches!(err, OrmError::EntityNotFound { .. }));
        assert_eq!(conn.prepared().len(), 1);
    }

    #[test]
    fn test_same_primary_key_same_instance() {
        let orm = tests_cfg::orm(MockConnection::new());
        let first = orm.factory().create::<User>(&user_row(2)).unwrap();
        let mut changed = user_row(2);
        changed.push("first_name", Value::from("Other"));
        let second = orm.factory().create::<User>(&changed).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.first_name, "Jane");

        let third = orm.factory().create::<User>(&user_row(3)).unwrap();
        assert!(!Rc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_clear_drops_identity() {
        let orm = tests_cfg::orm(MockConnection::new());
        let first = orm.factory().create::<User>(&user_row(2)).unwrap();
        orm.clear();
        let second = orm.factory().create::<User>(&user_row(2)).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_non_nullable_cell() {
        let orm = tests_cfg::orm(MockConnection::new());
        let row = Row::new().with("id", 5i64);
        let err = orm.factory().create::<User>(&row).unwrap_err();
        assert!(matches!(err, OrmError::NotNullable(_)));
    }

    #[test]
    fn test_property_names_accepted_as_row_keys() {
        let orm = tests_cfg::orm(MockConnection::new());
        let row = Row::new()
            .with("id", 4i64)
            .with("createdAt", 1_704_067_200i64)
            .with("firstName", "John")
            .with("lastName", "Doe")
            .with("email", "john@example.com")
            .with("isActive", 0i64)
            .with("type", "user")
            .with("address", 1i64);
        let user = orm.factory().create::<User>(&row).unwrap();
        assert_eq!(user.first_name, "John");
        assert!(!user.is_active);
        assert_eq!(user.user_type, UserType::User);
        assert_eq!(user.address.id(), Some(&Value::Int(1)));
    }
}
