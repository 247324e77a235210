//! Command-line entry point for the ilm pipeline.
//!
//! # Responsibility
//! - Expose the storage-management subcommands and the scheduled run.
//! - Exit 0 on success and 1 on any unhandled error.

use clap::{Parser, Subcommand};
use ilm_core::db::migrations::{drop_tables, recreate_tables};
use ilm_core::db::open_db;
use ilm_core::{default_log_level, init_logging, run_pipeline, Config};
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ilm", about = "Spaced-repetition scheduler for markdown notes")]
struct Cli {
    /// Path to the configuration document.
    /// Defaults to `<config dir>/ilm/config.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the index tables.
    Create,
    /// Drop the index tables.
    Drop,
    /// Drop and recreate the index tables.
    Recreate,
    /// Run the full pipeline once: sync, process, allocate.
    Run,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<(), String> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path).map_err(|err| err.to_string())?;

    init_logging(default_log_level(), &config.log_dir())?;

    match cli.command {
        Command::Create => {
            // Opening applies pending migrations, which creates the tables.
            open_db(config.db_path()).map_err(|err| err.to_string())?;
            println!("tables created");
        }
        Command::Drop => {
            let conn = open_db(config.db_path()).map_err(|err| err.to_string())?;
            drop_tables(&conn).map_err(|err| err.to_string())?;
            println!("tables dropped");
        }
        Command::Recreate => {
            let mut conn = open_db(config.db_path()).map_err(|err| err.to_string())?;
            recreate_tables(&mut conn).map_err(|err| err.to_string())?;
            println!("tables recreated");
        }
        Command::Run => {
            let now = config.now().naive_local();
            let mut rng = StdRng::from_entropy();
            let report =
                run_pipeline(&config, now, &mut rng).map_err(|err| err.to_string())?;
            println!(
                "sync: {} scanned, {} created, {} updated, {} deleted",
                report.sync.scanned, report.sync.created, report.sync.updated, report.sync.deleted
            );
            println!(
                "reviews: {} visited, {} processed",
                report.process.visited, report.process.processed
            );
            println!(
                "priorities: {} allocated, {} cleared",
                report.allocation.allocated, report.allocation.cleared
            );
        }
    }

    Ok(())
}

fn default_config_path() -> Result<PathBuf, String> {
    let base = dirs::config_dir().ok_or("cannot determine the user config directory")?;
    Ok(base.join("ilm").join("config.json"))
}
