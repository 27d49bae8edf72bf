//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::seq::SliceRandom;
use rand::Rng;
use soupdb_codec::Value;
use soupdb_core::{IndexSpec, Store};

/// Soup used by every store benchmark.
pub const BENCH_SOUP: &str = "bench";

const FIRST_NAMES: &[&str] = &["Ada", "Alan", "Grace", "Edsger", "Barbara", "Donald", "Frances"];
const LAST_NAMES: &[&str] = &["Lovelace", "Turing", "Hopper", "Dijkstra", "Liskov", "Knuth", "Allen"];

/// Generate a random person document with a payload of `payload_size` characters.
pub fn random_person(payload_size: usize) -> Value {
    let mut rng = rand::thread_rng();
    let notes: String = (0..payload_size)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect();
    Value::map([
        ("firstName", Value::from(*FIRST_NAMES.choose(&mut rng).unwrap_or(&"Ada"))),
        ("lastName", Value::from(*LAST_NAMES.choose(&mut rng).unwrap_or(&"Lovelace"))),
        ("age", Value::Integer(rng.gen_range(18..100))),
        ("notes", Value::Text(notes)),
    ])
}

/// Generate a batch of person documents.
pub fn random_people(count: usize, payload_size: usize) -> Vec<Value> {
    (0..count).map(|_| random_person(payload_size)).collect()
}

/// Index specs of the benchmark soup.
pub fn bench_specs() -> Vec<IndexSpec> {
    vec![IndexSpec::string("lastName"), IndexSpec::integer("age")]
}

/// Opens an in-memory store holding `count` people in the benchmark soup.
pub fn populated_store(count: usize) -> Store {
    let store = Store::open_in_memory("bench").unwrap();
    store.register_soup(BENCH_SOUP, &bench_specs()).unwrap();
    store
        .upsert_entries(BENCH_SOUP, random_people(count, 64), None)
        .unwrap();
    store
}
