//! dirsync - provision users, groups and memberships into an LDAP directory
//!
//! Reads change documents, applies them idempotently and prints what
//! happened, followed by the resulting directory state.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod logging;
mod output;

use config::AppConfig;
use error::CliResult;

/// dirsync - Directory provisioning from change documents
#[derive(Parser, Debug)]
#[command(name = "dirsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./config/dirsync.yaml)
    #[arg(long, short = 'c', global = true, env = "DIRSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply change documents to the directory
    Apply(commands::apply::ApplyArgs),

    /// Show the intent of change documents without applying them
    Inspect(commands::inspect::InspectArgs),

    /// List users and groups in the directory
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    if let Commands::Inspect(args) = cli.command {
        logging::init_logging(&config::LoggingConfig::default());
        return commands::inspect::execute(args).await;
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init_logging(&config.logging);
    tracing::debug!(directory = ?config.directory, "Configuration loaded");

    match cli.command {
        Commands::Apply(args) => commands::apply::execute(args, config).await,
        Commands::List(args) => commands::list::execute(args, config).await,
        Commands::Inspect(args) => commands::inspect::execute(args).await,
    }
}
