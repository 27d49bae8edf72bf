//! End-to-end scenarios across the store registry, soups and queries.

use soupdb_codec::Value;
use soupdb_core::{
    AvailabilityEvent, ErrorKind, IndexSpec, QuerySpec, SortOrder, StoreConfig, SOUP_ENTRY_ID,
};
use soupdb_testkit::prelude::*;
use soupdb_testkit::scenarios::{entry_id, people_specs, person, populated_people_store, PEOPLE};
use std::sync::Arc;

#[test]
fn people_exact_match_and_removal() {
    let (store, stored) = populated_people_store();

    let turing = store
        .query(PEOPLE, &QuerySpec::exact("lastName", "Turing", 10), 0)
        .unwrap();
    assert_eq!(turing.len(), 1);
    assert_eq!(turing[0], stored[1]);
    assert_eq!(turing[0].get("firstName").and_then(Value::as_text), Some("Alan"));

    let removed = store
        .remove_entries(PEOPLE, &[entry_id(&turing[0])])
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.count_entries(PEOPLE, &QuerySpec::all(10)).unwrap(), 1);
}

#[test]
fn same_document_twice_by_external_id() {
    let store = scenarios::people_store();

    let first = store
        .upsert_entries(PEOPLE, vec![person("Ada", "Lovelace")], Some("firstName"))
        .unwrap();
    let second = store
        .upsert_entries(PEOPLE, vec![person("Ada", "Lovelace")], Some("firstName"))
        .unwrap();

    assert_eq!(entry_id(&first[0]), entry_id(&second[0]));
    assert_eq!(store.count_entries(PEOPLE, &QuerySpec::all(10)).unwrap(), 1);
}

#[test]
fn stored_documents_can_be_upserted_back() {
    let (store, stored) = populated_people_store();

    let mut ada = stored[0].clone();
    ada.insert("lastName", Value::from("King"));
    let updated = store.upsert_entries(PEOPLE, vec![ada], None).unwrap();

    assert_eq!(entry_id(&updated[0]), entry_id(&stored[0]));
    assert_eq!(store.count_entries(PEOPLE, &QuerySpec::all(10)).unwrap(), 2);
    assert!(store
        .query(PEOPLE, &QuerySpec::exact("lastName", "Lovelace", 10), 0)
        .unwrap()
        .is_empty());
}

#[test]
fn range_like_and_order_queries() {
    let store = scenarios::people_store();
    store.add_index(PEOPLE, &IndexSpec::integer("age")).unwrap();

    let people: Vec<Value> = [("Ada", "Lovelace", 36), ("Alan", "Turing", 41), ("Grace", "Hopper", 85)]
        .into_iter()
        .map(|(first, last, age)| {
            let mut doc = person(first, last);
            doc.insert("age", Value::Integer(age));
            doc
        })
        .collect();
    store.upsert_entries(PEOPLE, people, None).unwrap();

    let middle = QuerySpec::range("age", Some(Value::Integer(40)), Some(Value::Integer(90)), 10)
        .order_by("age", SortOrder::Descending);
    let names: Vec<_> = store
        .query(PEOPLE, &middle, 0)
        .unwrap()
        .iter()
        .map(|d| d.get("firstName").and_then(Value::as_text).unwrap().to_string())
        .collect();
    assert_eq!(names, ["Grace", "Alan"]);

    let open = QuerySpec::range("age", None, Some(Value::Integer(40)), 10);
    assert_eq!(store.count_entries(PEOPLE, &open).unwrap(), 1);

    let like = QuerySpec::like("lastName", "%o%", 10);
    assert_eq!(store.count_entries(PEOPLE, &like).unwrap(), 2);

    // firstName is not indexed; the raw document answers.
    let unindexed = QuerySpec::exact("firstName", "Grace", 10);
    assert_eq!(store.count_entries(PEOPLE, &unindexed).unwrap(), 1);
}

#[test]
fn dictionary_query_spec() {
    let (store, _) = populated_people_store();
    let dict = soupdb_codec::decode(
        r#"{"queryType":"exact","indexPath":"lastName","matchKey":"Lovelace","pageSize":5}"#,
    )
    .unwrap();

    let spec = QuerySpec::from_value(&dict, 10).unwrap();
    assert_eq!(spec.page_size, 5);
    let found = store.query(PEOPLE, &spec, 0).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("firstName").and_then(Value::as_text), Some("Ada"));
}

#[test]
fn cursor_pages_past_the_end_are_empty() {
    let store = scenarios::people_store();
    let people: Vec<Value> = (0..7).map(|n| person(&format!("P{n}"), "Doe")).collect();
    store.upsert_entries(PEOPLE, people, None).unwrap();

    let mut cursor = store.query_soup(PEOPLE, &QuerySpec::all(3)).unwrap();
    assert_eq!(cursor.total_pages(), 3);
    assert_eq!(cursor.next_page().unwrap().len(), 3);
    assert_eq!(cursor.next_page().unwrap().len(), 3);
    assert_eq!(cursor.next_page().unwrap().len(), 1);
    assert!(!cursor.has_next_page());
    assert!(cursor.next_page().unwrap().is_empty());

    cursor.move_to_page(0).unwrap();
    assert_eq!(cursor.next_page().unwrap().len(), 3);
    assert_eq!(
        cursor.move_to_page(3).unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn unknown_soup_is_not_found() {
    with_temp_store(|store| {
        let err = store.query("ghosts", &QuerySpec::all(10), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.indices_for_soup("ghosts").unwrap().is_empty());
        store.remove_soup("ghosts").unwrap();
    });
}

#[test]
fn conflicting_registration_is_rejected() {
    let store = scenarios::people_store();
    let err = store
        .register_soup(
            PEOPLE,
            &[IndexSpec::string("lastName"), IndexSpec::string("firstName")],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(store.indices_for_soup(PEOPLE).unwrap(), people_specs());
}

#[test]
fn stores_survive_a_restart() {
    let mut registry = TestRegistry::new();
    let id = {
        let store = registry.open_store("defaultStore").unwrap();
        store.register_soup(PEOPLE, &people_specs()).unwrap();
        let stored = store
            .upsert_entries(PEOPLE, vec![person("Ada", "Lovelace")], None)
            .unwrap();
        entry_id(&stored[0])
    };

    registry.restart();

    let store = registry.open_store("defaultStore").unwrap();
    assert_eq!(store.indices_for_soup(PEOPLE).unwrap(), people_specs());
    let found = store.retrieve_entries(PEOPLE, &[id]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].get(SOUP_ENTRY_ID).and_then(Value::as_integer),
        Some(id.as_i64())
    );
}

#[test]
fn registry_hands_out_one_instance_per_name() {
    let registry = TestRegistry::new();
    let a = registry.open_store("a").unwrap();
    let again = registry.open_store("a").unwrap();
    let b = registry.open_store("b").unwrap();

    assert!(Arc::ptr_eq(&a, &again));
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(registry.open_store_names(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn removing_a_store_deletes_its_data() {
    let registry = TestRegistry::new();
    let store = registry.open_store("doomed").unwrap();
    store.register_soup(PEOPLE, &people_specs()).unwrap();
    assert!(registry.persistent_store_exists("doomed"));

    registry.remove_store("doomed").unwrap();

    assert!(!registry.persistent_store_exists("doomed"));
    assert!(!registry.store_directory("doomed").unwrap().exists());
    assert_eq!(store.soup_exists(PEOPLE).unwrap_err().kind(), ErrorKind::State);
    registry.remove_store("never-opened").unwrap();
}

#[test]
fn missing_stores_are_not_created_on_request() {
    let registry = TestRegistry::with_config(|config: StoreConfig| config.create_if_missing(false));
    let err = registry.open_store("absent").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!registry.persistent_store_exists("absent"));
}

#[test]
fn availability_is_shared_by_every_store() {
    let registry = TestRegistry::new();
    let store = registry.open_store("protected").unwrap();
    assert!(!store.is_file_data_protection_active());

    registry.availability().notify(AvailabilityEvent::BecameAvailable);
    assert!(store.is_file_data_protection_active());

    registry.availability().notify(AvailabilityEvent::WillBecomeUnavailable);
    assert!(!store.is_file_data_protection_active());
}

#[test]
fn numeric_segments_follow_the_document_shape() {
    with_temp_store(|store| {
        store.register_soup("codes", &[]).unwrap();
        let keyed = Value::from(serde_json::json!({ "codes": { "0": "x" }, "v": 1 }));
        let listed = Value::from(serde_json::json!({ "codes": ["y"], "v": 1 }));
        store.upsert_entries("codes", vec![keyed.clone(), listed], None).unwrap();

        assert_eq!(
            store.count_entries("codes", &QuerySpec::exact("codes.0", "x", 10)).unwrap(),
            1
        );
        assert_eq!(
            store.count_entries("codes", &QuerySpec::exact("codes/0", "y", 10)).unwrap(),
            1
        );

        store.upsert_entries("codes", vec![keyed], Some("codes.0")).unwrap();
        assert_eq!(store.count_entries("codes", &QuerySpec::all(10)).unwrap(), 2);
    });
}

#[test]
fn path_separators_are_interchangeable() {
    with_temp_store(|store| {
        let err = store
            .register_soup("mail", &[IndexSpec::string("a.zip"), IndexSpec::integer("a/zip")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!store.soup_exists("mail").unwrap());

        store.register_soup("mail", &[IndexSpec::integer("a.zip")]).unwrap();
        store.register_soup("mail", &[IndexSpec::integer("a/zip")]).unwrap();
        let letter = Value::from(serde_json::json!({ "a": { "zip": "94105" } }));
        store.upsert_entries("mail", vec![letter], None).unwrap();

        for path in ["a.zip", "a/zip"] {
            assert_eq!(
                store.count_entries("mail", &QuerySpec::exact(path, 94105, 10)).unwrap(),
                1
            );
        }
    });
}

#[test]
fn quotes_in_paths_are_invalid() {
    let (store, _) = populated_people_store();
    let err = store
        .query(PEOPLE, &QuerySpec::exact("say\"hi", "x", 10), 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
