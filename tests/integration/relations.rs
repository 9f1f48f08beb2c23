use std::rc::Rc;

use mooring::{OrmError, Reference};

use crate::common::{self, Address, Country, User};

#[test]
fn test_many_to_one_resolves_on_first_access() {
    let orm = common::orm();
    let country = common::seed_country(&orm, "Czechia");
    let address = common::seed_address(&orm, "Prague", country);
    orm.clear();

    let address = orm.repository::<Address>().find(address).unwrap();
    assert!(!address.country.is_resolved());
    assert_eq!(address.country.get().unwrap().name, "Czechia");
    assert!(address.country.is_resolved());
    assert!(Rc::ptr_eq(
        &address.country.get().unwrap(),
        &orm.cached::<Country>(country).unwrap()
    ));
}

#[test]
fn test_reference_to_cached_target_is_resolved() {
    let orm = common::orm();
    let country = common::seed_country(&orm, "Czechia");
    let address = common::seed_address(&orm, "Brno", country);
    orm.clear();

    let cached = orm.repository::<Country>().find(country).unwrap();
    let address = orm.repository::<Address>().find(address).unwrap();
    assert!(address.country.is_resolved());
    assert!(Rc::ptr_eq(&address.country.get().unwrap(), &cached));
}

#[test]
fn test_shared_target_is_one_instance() {
    let orm = common::orm();
    let country = common::seed_country(&orm, "Czechia");
    let address = common::seed_address(&orm, "Prague", country);
    common::seed_user(&orm, "Jane", Some(address));
    common::seed_user(&orm, "John", Some(address));
    orm.clear();

    let users = orm.select::<User>().fetch_all().unwrap();
    assert_eq!(users.len(), 2);
    let first = users[0].address.as_ref().unwrap().get().unwrap();
    let second = users[1].address.as_ref().unwrap().get().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_one_to_many_loads_related_rows() {
    let orm = common::orm();
    let country = common::seed_country(&orm, "Czechia");
    let prague = common::seed_address(&orm, "Prague", country);
    let brno = common::seed_address(&orm, "Brno", country);
    common::seed_user(&orm, "Jane", Some(prague));
    common::seed_user(&orm, "John", Some(prague));
    common::seed_user(&orm, "Jim", Some(brno));
    common::seed_user(&orm, "Homeless", None);
    orm.clear();

    let address = orm.repository::<Address>().find(prague).unwrap();
    assert!(!address.residents.is_resolved());
    let mut names: Vec<String> = address
        .residents
        .get()
        .unwrap()
        .iter()
        .map(|user| user.name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Jane", "John"]);
}

#[test]
fn test_filter_through_implicit_joins() {
    let orm = common::orm();
    let czechia = common::seed_country(&orm, "Czechia");
    let austria = common::seed_country(&orm, "Austria");
    let prague = common::seed_address(&orm, "Prague", czechia);
    let vienna = common::seed_address(&orm, "Vienna", austria);
    common::seed_user(&orm, "Jane", Some(prague));
    common::seed_user(&orm, "Hans", Some(vienna));

    let select = orm
        .select::<User>()
        .and_where(("address.country.name", "Austria"));
    assert_eq!(
        select.get_sql().unwrap(),
        "SELECT `u`.`id`,`u`.`name`,`u`.`active`,`u`.`joined_at`,`u`.`address_id` FROM `users` `u` \
         LEFT JOIN `addresses` `a` ON `a`.`id`=`u`.`address_id` \
         LEFT JOIN `countries` `c` ON `c`.`id`=`a`.`country_id` \
         WHERE `c`.`name`=?"
    );
    let users = select.fetch_all().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Hans");
}

#[test]
fn test_insert_with_in_memory_reference() {
    let orm = common::orm();
    let mut country = Country::new("Slovakia");
    orm.insert::<Country>().entity(&mut country).execute().unwrap();
    let id = country.id;

    let mut address = Address::new("Bratislava", Reference::new(Rc::new(country)));
    orm.insert::<Address>().entity(&mut address).execute().unwrap();
    orm.clear();

    let stored = orm.repository::<Address>().find(address.id.unwrap()).unwrap();
    assert_eq!(stored.country.get().unwrap().id, id);
}

#[test]
fn test_missing_reference_target() {
    let orm = common::orm();
    let user = User::new("Ghost", Some(orm.reference::<Address>(99i64)));
    let err = user.address.unwrap().get().unwrap_err();
    assert!(matches!(err, OrmError::EntityNotFound { .. }));
}

#[test]
fn test_lazy_handle_outliving_engine() {
    let orm = common::orm();
    let country = common::seed_country(&orm, "Czechia");
    let address = common::seed_address(&orm, "Prague", country);
    orm.clear();

    let address = orm.repository::<Address>().find(address).unwrap();
    drop(orm);
    assert!(matches!(address.country.get(), Err(OrmError::SessionClosed)));
}

#[test]
fn test_scope_bounds_identity() {
    let orm = common::orm();
    let country = common::seed_country(&orm, "Czechia");
    let before = {
        let _scope = orm.scope();
        orm.repository::<Country>().find(country).unwrap()
    };
    assert_eq!(orm.cache_len(), 0);
    let after = orm.repository::<Country>().find(country).unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
}
