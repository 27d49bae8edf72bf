//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random soup names and documents.
//! Generated documents never use reserved `_soup*` keys and only contain
//! floats that survive a JSON round trip exactly.

use proptest::prelude::*;
use soupdb_codec::Value;
use std::collections::BTreeMap;

/// Strategy for generating valid soup names.
pub fn soup_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating document keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,6}").expect("Invalid regex")
}

/// Strategy for generating short text values.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ]{0,12}").expect("Invalid regex")
}

/// Strategy for generating scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        // Quarters are exact in binary and print without loss.
        (-4000i32..4000).prop_map(|n| Value::Float(f64::from(n) / 4.0 + 0.25)),
        text_strategy().prop_map(Value::Text),
    ]
}

/// Strategy for generating nested values, up to three levels deep.
pub fn nested_value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for generating flat documents of scalar members.
pub fn flat_document_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), scalar_strategy(), 0..6).prop_map(Value::Map)
}

/// Strategy for generating documents with nested members.
pub fn document_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), nested_value_strategy(), 0..6)
        .prop_map(Value::Map)
}

/// Strategy for generating person documents.
///
/// `firstName` and `lastName` are always present text; `age` is present
/// about half the time.
pub fn person_strategy() -> impl Strategy<Value = Value> {
    (
        prop::string::string_regex("[A-Z][a-z]{1,7}").expect("Invalid regex"),
        prop::string::string_regex("[A-Z][a-z]{1,9}").expect("Invalid regex"),
        prop::option::of(0i64..120),
    )
        .prop_map(|(first, last, age)| {
            let mut members = BTreeMap::new();
            members.insert("firstName".to_string(), Value::Text(first));
            members.insert("lastName".to_string(), Value::Text(last));
            if let Some(age) = age {
                members.insert("age".to_string(), Value::Integer(age));
            }
            Value::Map(members)
        })
}

/// Strategy for generating a batch of person documents.
pub fn people_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(person_strategy(), 0..=max)
}
