//! Status command - show the machine summary

use anyhow::Result;
use colored::Colorize;

use super::{admin_login, get_context};
use crate::output;

pub fn run(user: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    admin_login(&ctx, user)?;
    let status = ctx.status_service.summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Cashpoint Status".bold());
    println!();
    println!("{}", output::status_table(&status));

    Ok(())
}
