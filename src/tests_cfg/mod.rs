//! Shared test fixtures: a small user/address/country schema, the Rust types
//! bound to it, and an engine factory over a [`MockConnection`].

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::connection::MockConnection;
use crate::entity::{ConstructorArgs, Entity};
use crate::error::{OrmError, Result};
use crate::relation::{Collection, Reference};
use crate::schema::{
    ColumnDefinition, ColumnType, EntityDefinition, EntitySchema, Schema, SchemaBuilder,
    SchemaProvider,
};
use crate::value::{BackedEnum, Property, PropertyType, Value};
use crate::Orm;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserType {
    Admin,
    User,
}

impl BackedEnum for UserType {
    const NAME: &'static str = "UserType";

    fn cases() -> Vec<Self> {
        vec![UserType::Admin, UserType::User]
    }

    fn backing(&self) -> Value {
        match self {
            UserType::Admin => Value::from("admin"),
            UserType::User => Value::from("user"),
        }
    }
}

fn user_definition() -> EntityDefinition {
    EntityDefinition::new("User")
        .constructor([
            "createdAt",
            "firstName",
            "middleName",
            "lastName",
            "email",
            "isActive",
            "type",
            "address",
            "secondAddress",
        ])
        .column(ColumnDefinition::int("id").primary().auto_increment())
        .column(ColumnDefinition::datetime_immutable("createdAt"))
        .column(ColumnDefinition::string("firstName").size(255))
        .column(ColumnDefinition::string("middleName").size(255).nullable())
        .column(ColumnDefinition::string("lastName").size(255))
        .column(ColumnDefinition::string("email").size(255))
        .column(ColumnDefinition::bool("isActive"))
        .column(ColumnDefinition::enumeration("type", UserType::enum_type()))
        .column(ColumnDefinition::many_to_one("address", "Address"))
        .column(ColumnDefinition::many_to_one("secondAddress", "Address").nullable())
}

fn address_definition() -> EntityDefinition {
    EntityDefinition::new("Address")
        .constructor(["street", "city", "country"])
        .column(ColumnDefinition::int("id").primary().auto_increment())
        .column(ColumnDefinition::string("street"))
        .column(ColumnDefinition::string("city"))
        .column(ColumnDefinition::many_to_one("country", "Country"))
        .column(ColumnDefinition::one_to_many("users", "User"))
}

fn country_definition() -> EntityDefinition {
    EntityDefinition::new("Country")
        .constructor(["name"])
        .column(ColumnDefinition::int("id").primary().auto_increment())
        .column(ColumnDefinition::string("name"))
}

fn product_definition() -> EntityDefinition {
    EntityDefinition::new("Product")
        .constructor(["name", "price", "code", "releasedAt", "availableOn", "attributes"])
        .column(ColumnDefinition::int("id").primary().auto_increment())
        .column(ColumnDefinition::string("name"))
        .column(ColumnDefinition::float("price").precision(10, 2))
        .column(ColumnDefinition::uuid("code"))
        .column(ColumnDefinition::datetime("releasedAt").column_type(ColumnType::Timestamp))
        .column(ColumnDefinition::datetime("availableOn").column_type(ColumnType::Date))
        .column(ColumnDefinition::extension("attributes", "json", ColumnType::Json).nullable())
}

fn tag_definition() -> EntityDefinition {
    EntityDefinition::new("Tag")
        .constructor(["slug", "label"])
        .column(ColumnDefinition::string("slug").primary())
        .column(ColumnDefinition::string("label"))
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .entity(user_definition())
        .entity(address_definition())
        .entity(country_definition())
        .entity(product_definition())
        .entity(tag_definition())
        .build()
        .unwrap()
}

pub fn schema_provider() -> SchemaProvider {
    SchemaProvider::new(schema())
}

fn entity_schema(entity: &str) -> EntitySchema {
    schema_provider().entity_schema(entity).unwrap().clone()
}

pub fn user_schema() -> EntitySchema {
    entity_schema("User")
}

pub fn address_schema() -> EntitySchema {
    entity_schema("Address")
}

pub fn country_schema() -> EntitySchema {
    entity_schema("Country")
}

/// Engine over `conn` with every fixture type bound.
pub fn orm(conn: MockConnection) -> Orm {
    Orm::builder(schema())
        .entity::<User>()
        .entity::<Address>()
        .entity::<Country>()
        .entity::<Product>()
        .entity::<Tag>()
        .connect(conn)
        .unwrap()
}

/// Unsaved user living at address #1.
pub fn new_user(orm: &Orm, first_name: &str) -> User {
    User::new(first_name, "Doe", orm.reference::<Address>(1i64))
}

pub fn created_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

#[derive(Debug)]
pub struct User {
    pub id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub user_type: UserType,
    pub address: Reference<Address>,
    pub second_address: Option<Reference<Address>>,
}

impl User {
    pub fn new(first_name: &str, last_name: &str, address: Reference<Address>) -> Self {
        Self {
            id: None,
            created_at: created_at(),
            first_name: first_name.to_string(),
            middle_name: None,
            last_name: last_name.to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            is_active: true,
            user_type: UserType::User,
            address,
            second_address: None,
        }
    }
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        Ok(Self {
            id: None,
            created_at: args.take("createdAt")?,
            first_name: args.take("firstName")?,
            middle_name: args.take("middleName")?,
            last_name: args.take("lastName")?,
            email: args.take("email")?,
            is_active: args.take("isActive")?,
            user_type: args.take_enum("type")?,
            address: args.take("address")?,
            second_address: args.take("secondAddress")?,
        })
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "id" => self.id = value.extract(property)?,
            "createdAt" => self.created_at = value.extract(property)?,
            "firstName" => self.first_name = value.extract(property)?,
            "middleName" => self.middle_name = value.extract(property)?,
            "lastName" => self.last_name = value.extract(property)?,
            "email" => self.email = value.extract(property)?,
            "isActive" => self.is_active = value.extract(property)?,
            "type" => self.user_type = value.into_enum(property)?,
            "address" => self.address = value.extract(property)?,
            "secondAddress" => self.second_address = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        Ok(match property {
            "id" => self.id.into_property(),
            "createdAt" => self.created_at.into_property(),
            "firstName" => self.first_name.clone().into_property(),
            "middleName" => self.middle_name.clone().into_property(),
            "lastName" => self.last_name.clone().into_property(),
            "email" => self.email.clone().into_property(),
            "isActive" => self.is_active.into_property(),
            "type" => Property::from_enum(&self.user_type),
            "address" => self.address.clone().into_property(),
            "secondAddress" => self.second_address.clone().into_property(),
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        })
    }
}

#[derive(Debug)]
pub struct Address {
    pub id: Option<i64>,
    pub street: String,
    pub city: String,
    pub country: Reference<Country>,
    pub users: Collection<User>,
}

impl Address {
    pub fn new(street: &str, city: &str, country: Reference<Country>) -> Self {
        Self {
            id: None,
            street: street.to_string(),
            city: city.to_string(),
            country,
            users: Collection::empty(),
        }
    }
}

impl Entity for Address {
    const NAME: &'static str = "Address";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        Ok(Self {
            id: None,
            street: args.take("street")?,
            city: args.take("city")?,
            country: args.take("country")?,
            users: Collection::empty(),
        })
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "id" => self.id = value.extract(property)?,
            "street" => self.street = value.extract(property)?,
            "city" => self.city = value.extract(property)?,
            "country" => self.country = value.extract(property)?,
            "users" => self.users = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        Ok(match property {
            "id" => self.id.into_property(),
            "street" => self.street.clone().into_property(),
            "city" => self.city.clone().into_property(),
            "country" => self.country.clone().into_property(),
            "users" => self.users.clone().into_property(),
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        })
    }
}

#[derive(Debug)]
pub struct Country {
    pub id: Option<i64>,
    pub name: String,
}

impl Country {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Entity for Country {
    const NAME: &'static str = "Country";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        Ok(Self {
            id: None,
            name: args.take("name")?,
        })
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "id" => self.id = value.extract(property)?,
            "name" => self.name = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        Ok(match property {
            "id" => self.id.into_property(),
            "name" => self.name.clone().into_property(),
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        })
    }
}

#[derive(Debug)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub code: Uuid,
    pub released_at: NaiveDateTime,
    pub available_on: NaiveDateTime,
    pub attributes: Option<serde_json::Value>,
}

impl Entity for Product {
    const NAME: &'static str = "Product";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        Ok(Self {
            id: None,
            name: args.take("name")?,
            price: args.take("price")?,
            code: args.take("code")?,
            released_at: args.take("releasedAt")?,
            available_on: args.take("availableOn")?,
            attributes: args.take("attributes")?,
        })
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "id" => self.id = value.extract(property)?,
            "name" => self.name = value.extract(property)?,
            "price" => self.price = value.extract(property)?,
            "code" => self.code = value.extract(property)?,
            "releasedAt" => self.released_at = value.extract(property)?,
            "availableOn" => self.available_on = value.extract(property)?,
            "attributes" => self.attributes = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        Ok(match property {
            "id" => self.id.into_property(),
            "name" => self.name.clone().into_property(),
            "price" => self.price.into_property(),
            "code" => self.code.into_property(),
            "releasedAt" => self.released_at.into_property(),
            "availableOn" => self.available_on.into_property(),
            "attributes" => self.attributes.clone().into_property(),
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        })
    }
}

#[derive(Debug)]
pub struct Tag {
    pub slug: String,
    pub label: String,
}

impl Tag {
    pub fn new(slug: &str, label: &str) -> Self {
        Self {
            slug: slug.to_string(),
            label: label.to_string(),
        }
    }
}

impl Entity for Tag {
    const NAME: &'static str = "Tag";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        Ok(Self {
            slug: args.take("slug")?,
            label: args.take("label")?,
        })
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "slug" => self.slug = value.extract(property)?,
            "label" => self.label = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        Ok(match property {
            "slug" => self.slug.clone().into_property(),
            "label" => self.label.clone().into_property(),
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        })
    }
}
