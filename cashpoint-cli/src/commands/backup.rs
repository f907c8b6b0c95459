//! Backup command - archive the ledger and settings

use anyhow::Result;
use clap::Subcommand;

use cashpoint_core::CashpointContext;

use super::{admin_login, get_context};
use crate::output;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Archive the current ledger and settings
    Create {
        /// Archives to keep after this one is written (defaults to maxBackups in settings)
        #[arg(long, short = 'm')]
        max_backups: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show existing archives, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(user: Option<String>, command: BackupCommands) -> Result<()> {
    let ctx = get_context()?;
    admin_login(&ctx, user)?;

    match command {
        BackupCommands::Create { max_backups, json } => create(&ctx, max_backups, json),
        BackupCommands::List { json } => list(&ctx, json),
    }
}

fn create(ctx: &CashpointContext, max_backups: Option<usize>, json: bool) -> Result<()> {
    let keep = max_backups.unwrap_or(ctx.config.max_backups);
    let archive = ctx.backup_service.create(Some(keep))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&archive)?);
    } else {
        output::success(&format!("Wrote {} ({})", archive.name, archive.size_display()));
        println!("Keeping the newest {} archive(s)", keep);
    }
    Ok(())
}

fn list(ctx: &CashpointContext, json: bool) -> Result<()> {
    let archives = ctx.backup_service.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&archives)?);
    } else if archives.is_empty() {
        println!("No archives in {}", ctx.data_dir.join("backups").display());
    } else {
        println!("{}", output::backups_table(&archives));
    }
    Ok(())
}
