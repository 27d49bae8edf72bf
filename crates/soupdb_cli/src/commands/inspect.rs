//! Inspect command implementation.

use serde::Serialize;
use soupdb_core::{QuerySpec, StoreRegistry};

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store name.
    pub store: String,
    /// Store directory.
    pub path: String,
    /// Database file size in bytes.
    pub db_size: u64,
    /// Per-soup statistics.
    pub soups: Vec<SoupStats>,
}

/// Statistics for a single soup.
#[derive(Debug, Serialize)]
pub struct SoupStats {
    /// Soup name.
    pub name: String,
    /// Number of entries.
    pub entry_count: usize,
    /// Index specs as `path:type`.
    pub indexes: Vec<String>,
}

/// Runs the inspect command.
pub fn run(
    registry: &StoreRegistry,
    store_name: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !registry.persistent_store_exists(store_name) {
        return Err(format!("No store named {store_name:?} under {:?}", registry.config().root_dir).into());
    }

    let dir = registry.store_directory(store_name)?;
    let store = registry.open_store(store_name)?;

    let mut soups = Vec::new();
    for name in store.soup_names()? {
        let entry_count = store.count_entries(&name, &QuerySpec::all(1))?;
        let indexes = store
            .indices_for_soup(&name)?
            .iter()
            .map(ToString::to_string)
            .collect();
        soups.push(SoupStats {
            name,
            entry_count,
            indexes,
        });
    }

    let result = InspectResult {
        store: store_name.to_string(),
        path: dir.display().to_string(),
        db_size: std::fs::metadata(dir.join("store.sqlite"))
            .map(|m| m.len())
            .unwrap_or(0),
        soups,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("SoupDB Store Inspection");
    println!("=======================");
    println!();
    println!("Store: {}", result.store);
    println!("Path:  {}", result.path);
    println!("Size:  {}", format_size(result.db_size));
    println!();

    if result.soups.is_empty() {
        println!("No soups registered.");
        return;
    }

    println!("Soups:");
    for soup in &result.soups {
        println!("  {} ({} entries)", soup.name, soup.entry_count);
        for index in &soup.indexes {
            println!("    index {index}");
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
