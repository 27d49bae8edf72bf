//! Upsert command implementation.

use soupdb_codec::{decode, encode, Value};
use soupdb_core::StoreRegistry;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Runs the upsert command.
///
/// Prints each stored document, with its `_soupEntryId`, on its own line.
pub fn run(
    registry: &StoreRegistry,
    store_name: &str,
    soup: &str,
    input: &Path,
    external_id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };

    let documents = into_documents(decode(&text)?);
    debug!(target: "soupdb::cli", soup, count = documents.len(), "upserting documents");
    let store = registry.open_store(store_name)?;
    let stored = store.upsert_entries(soup, documents, external_id)?;

    for document in &stored {
        println!("{}", encode(document)?);
    }
    Ok(())
}

/// An array is a batch; anything else is a single document.
fn into_documents(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
