use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tp_cli::commands::{activities, catalog, report, sections, trips};
use tp_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tp_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tp_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Catalog { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            catalog::run(&mut db, action)?;
        }
        Some(Commands::Trip { action }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            trips::run(&mut db, &config, action)?;
        }
        Some(Commands::Section { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            sections::run(&mut db, action)?;
        }
        Some(Commands::Activity { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            activities::run(&mut db, action)?;
        }
        Some(Commands::Report { trip, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            report::run(&db, trip, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
