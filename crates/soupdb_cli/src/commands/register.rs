//! Register command implementation.

use soupdb_core::{IndexSpec, StoreRegistry};

/// Runs the register command.
pub fn run(
    registry: &StoreRegistry,
    store_name: &str,
    soup: &str,
    indexes: &[IndexSpec],
) -> Result<(), Box<dyn std::error::Error>> {
    let store = registry.open_store(store_name)?;
    store.register_soup(soup, indexes)?;

    println!("Registered soup {soup} in store {store_name}");
    for spec in store.indices_for_soup(soup)? {
        println!("  index {spec}");
    }
    Ok(())
}
