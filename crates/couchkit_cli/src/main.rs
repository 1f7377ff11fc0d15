//! CouchKit CLI
//!
//! Command-line tools for keeping CouchDB design documents and data in sync.
//!
//! # Commands
//!
//! - `seed` - Make the database's design documents match a directory
//! - `diff` - Show what `seed` would change
//! - `bulk` - Write a JSON file of documents, retrying conflicts
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use couchkit_client::{Client, ClientConfig, Database, HttpStore, ReqwestClient};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CouchKit command-line tools.
#[derive(Parser)]
#[command(name = "couchkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CouchDB server URL
    #[arg(global = true, long, env = "COUCHDB_URL", default_value = "http://127.0.0.1:5984")]
    url: String,

    /// Database name
    #[arg(global = true, short, long, env = "COUCHDB_DATABASE")]
    db: Option<String>,

    /// User for basic authentication
    #[arg(global = true, short, long, env = "COUCHDB_USER")]
    user: Option<String>,

    /// Password for basic authentication
    #[arg(global = true, long, env = "COUCHDB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make the database's design documents match a directory
    Seed {
        /// Directory with one subdirectory per design document
        dir: PathBuf,

        /// Dry run - show what would be done
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show the design document changes `seed` would make
    Diff {
        /// Directory with one subdirectory per design document
        dir: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write documents from a JSON file, retrying conflicts once
    Bulk {
        /// JSON array of documents, or an object with a `docs` array
        file: PathBuf,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn connect(&self) -> Result<Database<HttpStore<ReqwestClient>>, Box<dyn std::error::Error>> {
        let name = self.db.as_deref().ok_or("Database name required (--db or COUCHDB_DATABASE)")?;

        let mut config = ClientConfig::new(&self.url).with_timeout(Duration::from_secs(self.timeout));
        if let Some(user) = &self.user {
            config = config.with_credentials(user, self.password.clone().unwrap_or_default());
        }

        debug!(url = %self.url, database = name, "connecting");
        let client = Client::new(config)?;
        Ok(client.use_database(name))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Seed { dir, dry_run } => {
            let db = cli.connect()?;
            commands::seed::run(&db, dir, *dry_run)?;
        }
        Commands::Diff { dir, format } => {
            let db = cli.connect()?;
            commands::diff::run(&db, dir, format)?;
        }
        Commands::Bulk { file } => {
            let db = cli.connect()?;
            commands::bulk::run(&db, file)?;
        }
        Commands::Version => {
            println!("CouchKit CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
