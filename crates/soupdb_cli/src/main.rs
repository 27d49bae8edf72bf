//! SoupDB CLI
//!
//! Command-line tools for SoupDB stores.
//!
//! # Commands
//!
//! - `inspect` - List soups, their indexes and entry counts
//! - `register` - Register a soup with index specs
//! - `upsert` - Insert or update documents from a JSON file
//! - `query` - Run a query spec and print matching documents
//! - `retrieve` - Print documents by soup entry id
//! - `remove-store` - Delete a store and all of its files

mod commands;

use clap::{Parser, Subcommand};
use soupdb_core::{IndexSpec, StoreConfig, StoreRegistry};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SoupDB command-line store tools.
#[derive(Parser)]
#[command(name = "soupdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the stores
    #[arg(global = true, short, long, default_value = "stores")]
    root: PathBuf,

    /// Store name
    #[arg(global = true, short, long, default_value = "defaultStore")]
    store: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List soups, their indexes and entry counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Register a soup
    Register {
        /// Soup name
        soup: String,

        /// Index spec as path:type, e.g. lastName:string (repeatable)
        #[arg(short, long = "index")]
        indexes: Vec<IndexSpec>,
    },

    /// Insert or update documents
    Upsert {
        /// Soup name
        soup: String,

        /// JSON file with an object or an array of objects, `-` for stdin
        input: PathBuf,

        /// Path used to match documents against existing entries
        #[arg(short, long)]
        external_id: Option<String>,
    },

    /// Run a query
    Query {
        /// Soup name
        soup: String,

        /// Query spec as JSON, e.g. {"queryType":"exact","indexPath":"a","matchKey":1}
        spec: String,

        /// Page to print (ignored with --all)
        #[arg(short, long, default_value = "0")]
        page: usize,

        /// Print every page
        #[arg(short, long)]
        all: bool,
    },

    /// Print documents by soup entry id
    Retrieve {
        /// Soup name
        soup: String,

        /// Soup entry ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete the store and all of its files
    RemoveStore,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = StoreRegistry::new(StoreConfig::new(&cli.root));

    match cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&registry, &cli.store, &format)?;
        }
        Commands::Register { soup, indexes } => {
            commands::register::run(&registry, &cli.store, &soup, &indexes)?;
        }
        Commands::Upsert {
            soup,
            input,
            external_id,
        } => {
            commands::upsert::run(&registry, &cli.store, &soup, &input, external_id.as_deref())?;
        }
        Commands::Query {
            soup,
            spec,
            page,
            all,
        } => {
            commands::query::run(&registry, &cli.store, &soup, &spec, page, all)?;
        }
        Commands::Retrieve { soup, ids } => {
            commands::query::retrieve(&registry, &cli.store, &soup, &ids)?;
        }
        Commands::RemoveStore => {
            registry.remove_store(&cli.store)?;
            println!("Removed store {}", cli.store);
        }
        Commands::Version => {
            println!("SoupDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SoupDB Core v{}", soupdb_core::VERSION);
        }
    }

    registry.close_all();
    Ok(())
}
