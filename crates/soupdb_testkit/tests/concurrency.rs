//! Stores and registries shared across threads.

use soupdb_core::{QuerySpec, SoupEntryId};
use soupdb_testkit::prelude::*;
use soupdb_testkit::scenarios::{entry_id, people_store, person, PEOPLE};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

#[test]
fn concurrent_opens_share_one_instance() {
    let registry = Arc::new(TestRegistry::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let mut handles = vec![];

    for _ in 0..THREADS {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            registry.open_store("shared").unwrap()
        }));
    }

    let stores: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for store in &stores[1..] {
        assert!(Arc::ptr_eq(&stores[0], store));
    }
    assert_eq!(registry.open_store_names(), vec!["shared".to_string()]);
}

#[test]
fn concurrent_upserts_keep_every_entry() {
    const PER_THREAD: usize = 25;

    let store = Arc::new(people_store());
    let barrier = Arc::new(Barrier::new(THREADS));
    let mut handles = vec![];

    for t in 0..THREADS {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut ids = Vec::with_capacity(PER_THREAD);
            for n in 0..PER_THREAD {
                let stored = store
                    .upsert_entries(PEOPLE, vec![person(&format!("T{t}"), &format!("N{n}"))], None)
                    .unwrap();
                ids.push(entry_id(&stored[0]));
            }
            ids
        }));
    }

    let ids: Vec<SoupEntryId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let distinct: HashSet<_> = ids.iter().copied().collect();

    assert_eq!(ids.len(), THREADS * PER_THREAD);
    assert_eq!(distinct.len(), ids.len());
    assert_eq!(
        store.count_entries(PEOPLE, &QuerySpec::all(10)).unwrap(),
        THREADS * PER_THREAD
    );
    assert_eq!(store.retrieve_entries(PEOPLE, &ids).unwrap().len(), ids.len());
}
