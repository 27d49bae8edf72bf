//! Query and retrieve command implementations.

use soupdb_codec::{decode, encode};
use soupdb_core::{QuerySpec, SoupEntryId, StoreRegistry};

/// Runs the query command.
///
/// Prints matching documents one per line, then a summary on stderr.
pub fn run(
    registry: &StoreRegistry,
    store_name: &str,
    soup: &str,
    spec_json: &str,
    page: usize,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = QuerySpec::from_value(&decode(spec_json)?, registry.config().default_page_size)?;
    let store = registry.open_store(store_name)?;
    let mut cursor = store.query_soup(soup, &spec)?;

    let total_pages = cursor.total_pages();
    let total_entries = cursor.total_entries();
    let mut printed = 0;

    if all {
        for documents in cursor {
            for document in documents? {
                println!("{}", encode(&document)?);
                printed += 1;
            }
        }
    } else {
        cursor.move_to_page(page)?;
        for document in cursor.next_page()? {
            println!("{}", encode(&document)?);
            printed += 1;
        }
    }

    eprintln!("{printed} of {total_entries} entries ({total_pages} pages)");
    Ok(())
}

/// Runs the retrieve command.
pub fn retrieve(
    registry: &StoreRegistry,
    store_name: &str,
    soup: &str,
    ids: &[i64],
) -> Result<(), Box<dyn std::error::Error>> {
    let ids: Vec<SoupEntryId> = ids.iter().copied().map(SoupEntryId::new).collect();
    let store = registry.open_store(store_name)?;
    for document in store.retrieve_entries(soup, &ids)? {
        println!("{}", encode(&document)?);
    }
    Ok(())
}
