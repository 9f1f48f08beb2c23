//! Entities, schema and an in-memory SQLite engine shared by the integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use mooring::connection::SqliteConnection;
use mooring::entity::{ConstructorArgs, Entity};
use mooring::schema::{ColumnDefinition, EntityDefinition, Schema, SchemaBuilder};
use mooring::{Collection, Orm, OrmError, Property, PropertyType, Reference, Result};

const DDL: &str = r#"
CREATE TABLE `countries` (
    `id` INTEGER PRIMARY KEY AUTOINCREMENT,
    `name` TEXT NOT NULL UNIQUE
);
CREATE TABLE `addresses` (
    `id` INTEGER PRIMARY KEY AUTOINCREMENT,
    `city` TEXT NOT NULL,
    `country_id` INTEGER NOT NULL REFERENCES `countries` (`id`)
);
CREATE TABLE `users` (
    `id` INTEGER PRIMARY KEY AUTOINCREMENT,
    `name` TEXT NOT NULL,
    `active` INTEGER NOT NULL,
    `joined_at` TEXT NOT NULL,
    `address_id` INTEGER REFERENCES `addresses` (`id`)
);
"#;

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .entity(
            EntityDefinition::new("Country")
                .constructor(["name"])
                .column(ColumnDefinition::int("id").primary().auto_increment())
                .column(ColumnDefinition::string("name")),
        )
        .entity(
            EntityDefinition::new("Address")
                .constructor(["city", "country"])
                .column(ColumnDefinition::int("id").primary().auto_increment())
                .column(ColumnDefinition::string("city"))
                .column(ColumnDefinition::many_to_one("country", "Country"))
                .column(ColumnDefinition::one_to_many("residents", "User")),
        )
        .entity(
            EntityDefinition::new("User")
                .constructor(["name", "active", "joinedAt", "address"])
                .column(ColumnDefinition::int("id").primary().auto_increment())
                .column(ColumnDefinition::string("name"))
                .column(ColumnDefinition::bool("active"))
                .column(ColumnDefinition::datetime("joinedAt"))
                .column(ColumnDefinition::many_to_one("address", "Address").nullable()),
        )
        .build()
        .unwrap()
}

/// Fresh engine over an empty in-memory database.
pub fn orm() -> Orm {
    let connection = SqliteConnection::open_in_memory().unwrap();
    connection.execute_batch(DDL).unwrap();
    Orm::builder(schema())
        .entity::<Country>()
        .entity::<Address>()
        .entity::<User>()
        .connect(connection)
        .unwrap()
}

pub fn joined_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 11, 5)
        .and_then(|d| d.and_hms_opt(8, 30, 0))
        .unwrap()
}

/// Persist a country and return its generated key.
pub fn seed_country(orm: &Orm, name: &str) -> i64 {
    let mut country = Country::new(name);
    orm.insert::<Country>().entity(&mut country).execute().unwrap();
    country.id.unwrap()
}

pub fn seed_address(orm: &Orm, city: &str, country: i64) -> i64 {
    let mut address = Address::new(city, orm.reference::<Country>(country));
    orm.insert::<Address>().entity(&mut address).execute().unwrap();
    address.id.unwrap()
}

pub fn seed_user(orm: &Orm, name: &str, address: Option<i64>) -> i64 {
    let mut user = User::new(name, address.map(|id| orm.reference::<Address>(id)));
    orm.insert::<User>().entity(&mut user).execute().unwrap();
    user.id.unwrap()
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
        Ok(Self::new(&args.take::<String>("name")?))
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
        match property {
            "id" => Ok(self.id.into_property()),
            "name" => Ok(self.name.clone().into_property()),
            _ => Err(OrmError::column_not_found_for::<Self>(property)),
        }
    }
}

#[derive(Debug)]
pub struct Address {
    pub id: Option<i64>,
    pub city: String,
    pub country: Reference<Country>,
    pub residents: Collection<User>,
}

impl Address {
    pub fn new(city: &str, country: Reference<Country>) -> Self {
        Self {
            id: None,
            city: city.to_string(),
            country,
            residents: Collection::empty(),
        }
    }
}

impl Entity for Address {
    const NAME: &'static str = "Address";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        let city: String = args.take("city")?;
        Ok(Self::new(&city, args.take("country")?))
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "id" => self.id = value.extract(property)?,
            "city" => self.city = value.extract(property)?,
            "country" => self.country = value.extract(property)?,
            "residents" => self.residents = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        match property {
            "id" => Ok(self.id.into_property()),
            "city" => Ok(self.city.clone().into_property()),
            "country" => Ok(self.country.clone().into_property()),
            "residents" => Ok(self.residents.clone().into_property()),
            _ => Err(OrmError::column_not_found_for::<Self>(property)),
        }
    }
}

#[derive(Debug)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub active: bool,
    pub joined_at: NaiveDateTime,
    pub address: Option<Reference<Address>>,
}

impl User {
    pub fn new(name: &str, address: Option<Reference<Address>>) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            active: true,
            joined_at: joined_at(),
            address,
        }
    }
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn construct(args: &mut ConstructorArgs) -> Result<Self> {
        Ok(Self {
            id: None,
            name: args.take("name")?,
            active: args.take("active")?,
            joined_at: args.take("joinedAt")?,
            address: args.take("address")?,
        })
    }

    fn set_property(&mut self, property: &str, value: Property) -> Result<()> {
        match property {
            "id" => self.id = value.extract(property)?,
            "name" => self.name = value.extract(property)?,
            "active" => self.active = value.extract(property)?,
            "joinedAt" => self.joined_at = value.extract(property)?,
            "address" => self.address = value.extract(property)?,
            _ => return Err(OrmError::column_not_found_for::<Self>(property)),
        }
        Ok(())
    }

    fn get_property(&self, property: &str) -> Result<Property> {
        match property {
            "id" => Ok(self.id.into_property()),
            "name" => Ok(self.name.clone().into_property()),
            "active" => Ok(self.active.into_property()),
            "joinedAt" => Ok(self.joined_at.into_property()),
            "address" => Ok(self.address.clone().into_property()),
            _ => Err(OrmError::column_not_found_for::<Self>(property)),
        }
    }
}
