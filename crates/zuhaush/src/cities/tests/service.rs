use crate::cities::{CityUpdate, NewCity};
use crate::error::ServiceError;
use crate::pagination::{PageQuery, PageRequest};
use crate::testing::Harness;

fn city(name: &str, state: &str) -> NewCity {
    NewCity {
        name: name.to_string(),
        state: state.to_string(),
        country: None,
    }
}

#[test]
fn names_are_unique_ignoring_case() {
    let harness = Harness::new();
    let cities = &harness.app.cities;
    let pune = cities.create(city(" Pune ", "Maharashtra")).expect("created");
    assert_eq!(pune.name, "Pune");
    assert_eq!(pune.country, "India");
    assert!(pune.is_active);

    match cities.create(city("PUNE", "Maharashtra")) {
        Err(ServiceError::Conflict(message)) => assert_eq!(message, "City name already taken"),
        other => panic!("expected conflict, got {other:?}"),
    }

    let mumbai = cities.create(city("Mumbai", "Maharashtra")).expect("created");
    let err = cities
        .update(
            &mumbai.id,
            CityUpdate {
                name: Some("pune".to_string()),
                ..CityUpdate::default()
            },
        )
        .expect_err("rename onto a taken name");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn active_listing_is_alphabetical_and_hides_inactive() {
    let harness = Harness::new();
    let cities = &harness.app.cities;
    cities.create(city("Pune", "Maharashtra")).expect("created");
    let delhi = cities.create(city("Delhi", "Delhi")).expect("created");
    cities.create(city("bengaluru", "Karnataka")).expect("created");

    let names: Vec<String> = cities
        .active()
        .expect("active")
        .into_iter()
        .map(|city| city.name)
        .collect();
    assert_eq!(names, ["bengaluru", "Delhi", "Pune"]);

    cities
        .update(
            &delhi.id,
            CityUpdate {
                is_active: Some(false),
                ..CityUpdate::default()
            },
        )
        .expect("deactivated");
    assert_eq!(cities.active().expect("active").len(), 2);
}

#[test]
fn search_matches_substrings_of_active_names() {
    let harness = Harness::new();
    let cities = &harness.app.cities;
    cities.create(city("Navi Mumbai", "Maharashtra")).expect("created");
    cities.create(city("Mumbai", "Maharashtra")).expect("created");
    cities.create(city("Pune", "Maharashtra")).expect("created");

    let page = cities.search("MUM", &PageRequest::default()).expect("search");
    assert_eq!(page.total_results, 2);
    assert_eq!(page.results[0].name, "Mumbai");

    assert!(matches!(
        cities.search("  ", &PageRequest::default()),
        Err(ServiceError::Validation(_))
    ));

    let unsortable = PageRequest::from_query(&PageQuery {
        sort_by: Some("population:desc".to_string()),
        ..PageQuery::default()
    })
    .expect("parsed");
    assert!(matches!(
        cities.search("mum", &unsortable),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn delete_removes_the_city() {
    let harness = Harness::new();
    let cities = &harness.app.cities;
    let pune = cities.create(city("Pune", "Maharashtra")).expect("created");
    cities.delete(&pune.id).expect("deleted");
    assert!(matches!(cities.get(&pune.id), Err(ServiceError::NotFound(_))));
    assert!(matches!(cities.delete(&pune.id), Err(ServiceError::NotFound(_))));
    cities
        .create(city("Pune", "Maharashtra"))
        .expect("name is free again");
}
