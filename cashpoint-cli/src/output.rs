//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

use cashpoint_core::domain::money::format_amount;
use cashpoint_core::domain::TIMESTAMP_FORMAT;
use cashpoint_core::services::StatusSummary;
use cashpoint_core::{BackupMetadata, TransactionRecord};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn transactions_table(records: &[TransactionRecord]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Time", "User", "Type", "Amount", "Note"]);
    for record in records {
        table.add_row(vec![
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.user.clone(),
            record.kind.to_string(),
            format_amount(record.amount),
            record.note.clone(),
        ]);
    }
    table
}

/// Vertical key-value summary
pub fn status_table(status: &StatusSummary) -> Table {
    let mut table = create_table();
    table.add_row(vec!["Cash in machine".to_string(), format_amount(status.vault_cash)]);
    table.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    table.add_row(vec!["Admins".to_string(), status.admin_accounts.to_string()]);
    table.add_row(vec!["Awaiting PIN setup".to_string(), status.pending_setup.to_string()]);
    table.add_row(vec!["Sum of balances".to_string(), format_amount(status.total_balances)]);
    table.add_row(vec!["Transactions".to_string(), status.total_transactions.to_string()]);
    table.add_row(vec![
        "Last activity".to_string(),
        status.last_activity.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Ledger".to_string(), status.location.clone()]);
    table
}

pub fn backups_table(archives: &[BackupMetadata]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Archive", "Taken", "Size"]);
    for archive in archives {
        table.add_row(vec![
            archive.name.clone(),
            archive.created_at.format(TIMESTAMP_FORMAT).to_string(),
            archive.size_display(),
        ]);
    }
    table
}
