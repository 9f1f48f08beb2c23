use std::rc::Rc;

use mooring::query::Direction;
use mooring::{OrmError, Value};

use crate::common::{self, Country, User};

#[test]
fn test_insert_assigns_generated_keys() {
    let orm = common::orm();
    let mut czechia = Country::new("Czechia");
    let mut poland = Country::new("Poland");
    orm.insert::<Country>()
        .entity(&mut czechia)
        .entity(&mut poland)
        .execute()
        .unwrap();
    assert_eq!(czechia.id, Some(1));
    assert_eq!(poland.id, Some(2));
    assert_eq!(orm.select::<Country>().count().unwrap(), 2);
}

#[test]
fn test_find_shares_identity_until_cleared() {
    let orm = common::orm();
    let id = common::seed_country(&orm, "Czechia");
    let countries = orm.repository::<Country>();

    let first = countries.find(id).unwrap();
    let second = countries.find(id).unwrap();
    assert!(Rc::ptr_eq(&first, &second));

    orm.clear();
    let third = countries.find(id).unwrap();
    assert!(!Rc::ptr_eq(&first, &third));
    assert_eq!(third.name, "Czechia");
}

#[test]
fn test_find_missing_row() {
    let orm = common::orm();
    let err = orm.repository::<Country>().find(42i64).unwrap_err();
    assert!(matches!(err, OrmError::EntityNotFound { .. }));
}

#[test]
fn test_persist_updates_existing_row() {
    let orm = common::orm();
    let countries = orm.repository::<Country>();
    let mut country = Country::new("Czechia");
    countries.persist(&mut country).unwrap();

    country.name = "Czech Republic".to_string();
    countries.persist(&mut country).unwrap();

    let stored = countries.find(country.id.unwrap()).unwrap();
    assert_eq!(stored.name, "Czech Republic");
    assert_eq!(orm.select::<Country>().count().unwrap(), 1);
}

#[test]
fn test_delete_by_entity_and_id() {
    let orm = common::orm();
    let a = common::seed_country(&orm, "Austria");
    let b = common::seed_country(&orm, "Belgium");
    common::seed_country(&orm, "Croatia");

    let austria = orm.repository::<Country>().find(a).unwrap();
    orm.delete::<Country>()
        .entity(&austria)
        .id(b)
        .execute()
        .unwrap();

    let left = orm.select::<Country>().fetch_all().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].name, "Croatia");
    assert!(orm.cached::<Country>(a).is_none());
}

#[test]
fn test_unique_violation_is_constraint_error() {
    let orm = common::orm();
    common::seed_country(&orm, "Czechia");
    let mut duplicate = Country::new("Czechia");
    let err = orm
        .insert::<Country>()
        .entity(&mut duplicate)
        .execute()
        .unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(err.sql(), Some("INSERT INTO `countries` (`name`) VALUES (?)"));
    assert_eq!(duplicate.id, None);
}

#[test]
fn test_filter_order_and_paginate() {
    let orm = common::orm();
    for name in ["Estonia", "Austria", "Denmark", "Belgium", "Croatia"] {
        common::seed_country(&orm, name);
    }

    let names: Vec<String> = orm
        .select::<Country>()
        .and_where(("name", "NOT IN", vec!["Denmark"]))
        .order_by("name", Direction::Asc)
        .limit(2)
        .offset(1)
        .fetch_all()
        .unwrap()
        .iter()
        .map(|country| country.name.clone())
        .collect();
    assert_eq!(names, vec!["Belgium", "Croatia"]);

    let count = orm
        .select::<Country>()
        .and_where(("name", "LIKE", "%i%"))
        .or_where(("name", "Estonia"))
        .count()
        .unwrap();
    assert_eq!(count, 4);
}

#[test]
fn test_scalar_types_survive_round_trip() {
    let orm = common::orm();
    let mut user = User::new("Jane", None);
    user.active = false;
    orm.insert::<User>().entity(&mut user).execute().unwrap();
    orm.clear();

    let stored = orm.repository::<User>().find(user.id.unwrap()).unwrap();
    assert_eq!(stored.name, "Jane");
    assert!(!stored.active);
    assert_eq!(stored.joined_at, common::joined_at());
    assert!(stored.address.is_none());

    let row = orm
        .select::<User>()
        .columns(["joined_at", "active"])
        .fetch_assoc_one()
        .unwrap()
        .unwrap();
    assert_eq!(row.get("joined_at"), Some(&Value::from("2023-11-05 08:30:00")));
    assert_eq!(row.get("active"), Some(&Value::Int(0)));
}
