//! Cashpoint CLI - the cash machine terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{backup, export, log, session, status};

/// Cashpoint - PIN-authenticated cash machine ledger
#[derive(Parser)]
#[command(name = "cashpoint", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (the default)
    Session,

    /// Show the machine summary
    Status {
        /// Admin username (prompted if omitted)
        #[arg(long, short)]
        user: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent audit log records
    Log {
        /// Admin username (prompted if omitted)
        #[arg(long, short)]
        user: Option<String>,
        /// Number of records (defaults to transactionTailLimit in settings)
        #[arg(long, short = 'n')]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the full audit log as CSV
    Export {
        /// Destination file
        path: PathBuf,
        /// Admin username (prompted if omitted)
        #[arg(long, short)]
        user: Option<String>,
    },

    /// Manage backups
    Backup {
        /// Admin username (prompted if omitted)
        #[arg(long, short, global = true)]
        user: Option<String>,
        #[command(subcommand)]
        command: backup::BackupCommands,
    },
}

/// Diagnostics go to stderr so they never mix with menus or JSON output
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => session::run(),
        Commands::Status { user, json } => status::run(user, json),
        Commands::Log { user, limit, json } => log::run(user, limit, json),
        Commands::Export { path, user } => export::run(user, &path),
        Commands::Backup { user, command } => backup::run(user, command),
    }
}
