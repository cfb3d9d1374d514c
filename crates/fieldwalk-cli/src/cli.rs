//! Command-line argument definitions.

use clap::{Parser, Subcommand};

/// Fieldwalk - field-visit ingestion and live status tracking
#[derive(Parser, Debug)]
#[command(name = "fieldwalk", version)]
#[command(about = "Field-visit ingestion and live status tracking", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, env = "FIELDWALK_CONFIG")]
    pub config: Option<String>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and WebSocket server
    Serve {
        /// Address to bind, overriding `server.bind`
        #[arg(long, env = "FIELDWALK_BIND")]
        bind: Option<String>,
    },
    /// Ingest a local spreadsheet or CSV and print the report as JSON
    Import {
        /// File to ingest (.csv, .tsv, .txt, .xlsx, .xls, .xlsm, .xlsb, .ods)
        file: String,

        /// Dataset the rows belong to
        #[arg(short, long, default_value = "default")]
        dataset: String,

        /// Geocode lookups in flight, overriding `ingest.concurrency`
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Configuration management
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Write a default config file
    Init {
        /// Destination, defaulting to the platform config path
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration with secrets masked
    Show,
}
