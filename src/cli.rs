use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "community song ranking analytics")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the API server and the analysis scheduler
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Recompute and store every analysis once
    Recompute,
    /// Load collections, items and groups from a JSON catalog
    Seed {
        /// Path to the catalog file
        #[arg(short, long, default_value = "data/catalog.json")]
        path: PathBuf,
    },
    /// Create the database schema
    Setup,
}
