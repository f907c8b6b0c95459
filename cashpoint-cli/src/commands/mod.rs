//! CLI command implementations

pub mod backup;
pub mod export;
pub mod log;
pub mod session;
pub mod status;

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::{Input, Password, Select};
use rust_decimal::Decimal;
use tracing::debug;

use cashpoint_core::domain::money::parse_amount;
use cashpoint_core::services::AuthOutcome;
use cashpoint_core::{CashpointContext, Error, Session};

use crate::output;

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CASHPOINT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".cashpoint"))
}

/// Open the ledger in the data directory, creating both on first use
pub fn get_context() -> Result<CashpointContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    debug!(data_dir = %data_dir.display(), "opening ledger");
    CashpointContext::new(&data_dir).context("Failed to open the ledger")
}

/// Split core errors into ones to report and retry, and fatal ones to propagate
pub fn report<T>(result: cashpoint_core::domain::result::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            output::error(&e.to_string());
            Ok(None)
        }
    }
}

fn interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Read one line from piped stdin
fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        anyhow::bail!("Unexpected end of input");
    }
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Prompt for text input, allowing an empty answer when `default` is given
pub fn prompt_text(prompt: &str, default: Option<&str>) -> Result<String> {
    if !interactive() {
        let line = read_stdin_line()?;
        return Ok(match default {
            Some(d) if line.trim().is_empty() => d.to_string(),
            _ => line,
        });
    }

    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(d) = default {
        input = input.default(d.to_string());
    }
    Ok(input.interact_text()?)
}

/// Let the user pick one of `items`. Piped input gives a 1-based number.
pub fn prompt_choice(title: &str, items: &[&str]) -> Result<usize> {
    if !interactive() {
        let line = read_stdin_line()?;
        return match line.trim().parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => Ok(n - 1),
            _ => anyhow::bail!("Invalid choice: {}", line.trim()),
        };
    }
    Ok(Select::new()
        .with_prompt(title)
        .items(items)
        .default(0)
        .interact()?)
}

/// Prompt for a PIN without echoing it
pub fn prompt_pin(prompt: &str) -> Result<String> {
    if !interactive() {
        return read_stdin_line();
    }
    Ok(Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?)
}

/// Prompt for a new PIN twice, returning both entries
pub fn prompt_new_pin() -> Result<(String, String)> {
    let pin = prompt_pin("New PIN")?;
    let confirm = prompt_pin("Repeat PIN")?;
    Ok((pin, confirm))
}

/// Prompt for an amount. Returns None (after reporting) for unparseable input.
pub fn prompt_amount(prompt: &str, default: Option<&str>) -> Result<Option<Decimal>> {
    let text = prompt_text(prompt, default)?;
    report(parse_amount(&text))
}

/// Log in as an admin for the one-shot commands
///
/// Those commands never bootstrap; the interactive session does.
pub fn admin_login(ctx: &CashpointContext, username: Option<String>) -> Result<Session> {
    if ctx.directory_service.needs_admin_bootstrap()? {
        anyhow::bail!("No admin account exists yet. Run `cashpoint session` first.");
    }

    let username = match username {
        Some(u) => u,
        None => prompt_text("Admin username", None)?,
    };
    let pin = prompt_pin("PIN")?;

    match ctx.directory_service.authenticate(&username, &pin)? {
        AuthOutcome::Authenticated(session) if session.is_admin() => Ok(session),
        AuthOutcome::Authenticated(session) => {
            Err(Error::Forbidden(format!("'{}' is not an admin", session.username)).into())
        }
        AuthOutcome::SetupRequired(name) => {
            Err(Error::CredentialRequired(name).into())
        }
    }
}
