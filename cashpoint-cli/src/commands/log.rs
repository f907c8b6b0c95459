//! Log command - view the audit log

use anyhow::Result;

use super::{admin_login, get_context};
use crate::output;

pub fn run(user: Option<String>, limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    admin_login(&ctx, user)?;

    let limit = limit.unwrap_or(ctx.config.transaction_tail_limit);
    let records = ctx.audit_service.tail(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    println!("{}", output::transactions_table(&records));
    let total = ctx.audit_service.len()?;
    if total > records.len() {
        println!("Showing {} of {} records", records.len(), total);
    }

    Ok(())
}
