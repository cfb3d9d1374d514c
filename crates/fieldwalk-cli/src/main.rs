//! Fieldwalk CLI
//!
//! Runs the field-visit server, bulk-imports local files, and manages the
//! configuration file.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use fieldwalk_core::FieldwalkConfig;

mod cli;
mod commands;
mod config_handlers;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fieldwalk=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_path = args.config.as_deref();

    match args.command {
        Command::Serve { bind } => {
            let config = FieldwalkConfig::load(config_path)?;
            commands::serve(config, bind).await
        }
        Command::Import {
            file,
            dataset,
            concurrency,
        } => {
            let config = FieldwalkConfig::load(config_path)?;
            commands::import(&config, &file, &dataset, concurrency).await
        }
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action)?;
            Ok(())
        }
    }
}
