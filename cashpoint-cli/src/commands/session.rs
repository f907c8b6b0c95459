//! Session command - the interactive cash machine
//!
//! Bootstraps the first admin if needed, then loops over login and the
//! role's menu until the user exits. Rejected requests are reported and
//! the menu comes back; only storage failures end the session.

use anyhow::Result;
use colored::Colorize;

use cashpoint_core::domain::money::format_amount;
use cashpoint_core::services::{AuthOutcome, Command, CommandOutput, DEFAULT_ADMIN_USERNAME};
use cashpoint_core::{CashpointContext, Role, Session};

use super::{get_context, prompt_amount, prompt_choice, prompt_new_pin, prompt_pin, prompt_text, report};
use crate::output;

const USER_MENU: &[&str] = &["Balance", "Withdraw", "Deposit", "Change PIN", "Log out"];

const ADMIN_MENU: &[&str] = &[
    "List users",
    "Create user",
    "Delete user",
    "Change role",
    "Reset PIN",
    "Transactions",
    "Set machine cash",
    "Status",
    "Change my PIN",
    "Log out",
];

pub fn run() -> Result<()> {
    let ctx = get_context()?;

    ensure_admin(&ctx)?;

    println!("{}", "Cashpoint".bold());
    loop {
        println!();
        match prompt_choice("Welcome", &["Log in", "Exit"])? {
            0 => {
                if let Some(session) = login(&ctx)? {
                    if session.is_admin() {
                        admin_menu(&ctx, &session)?;
                    } else {
                        user_menu(&ctx, &session)?;
                    }
                }
            }
            _ => {
                println!("Goodbye");
                return Ok(());
            }
        }
    }
}

/// Force creation of the first admin before anything else can happen
fn ensure_admin(ctx: &CashpointContext) -> Result<()> {
    if !ctx.directory_service.needs_admin_bootstrap()? {
        return Ok(());
    }

    output::warning("No admin account exists. Create one to continue.");
    loop {
        let username = prompt_text("Admin username", Some(DEFAULT_ADMIN_USERNAME))?;
        let (pin, confirm) = prompt_new_pin()?;
        if let Some(session) = report(ctx.directory_service.bootstrap_admin(&username, &pin, &confirm))? {
            output::success(&format!("Admin '{}' created", session.username));
            return Ok(());
        }
    }
}

/// Authenticate, running first-time PIN setup when the account has none
fn login(ctx: &CashpointContext) -> Result<Option<Session>> {
    let username = prompt_text("Username", None)?;
    let pin = prompt_pin("PIN")?;

    match report(ctx.directory_service.authenticate(&username, &pin))? {
        Some(AuthOutcome::Authenticated(session)) => Ok(Some(session)),
        Some(AuthOutcome::SetupRequired(username)) => {
            output::info("This account has no PIN yet. Choose one now.");
            let (pin, confirm) = prompt_new_pin()?;
            let session = report(
                ctx.directory_service
                    .complete_first_time_setup(&username, &pin, &confirm),
            )?;
            if session.is_some() {
                output::success("PIN set");
            }
            Ok(session)
        }
        None => Ok(None),
    }
}

fn user_menu(ctx: &CashpointContext, session: &Session) -> Result<()> {
    loop {
        println!();
        let title = format!("{} ({})", session.username, session.role);
        let command = match prompt_choice(&title, USER_MENU)? {
            0 => Command::Balance,
            1 => match prompt_amount("Amount", None)? {
                Some(amount) => Command::Withdraw { amount },
                None => continue,
            },
            2 => match prompt_amount("Amount", None)? {
                Some(amount) => Command::Deposit { amount },
                None => continue,
            },
            3 => change_pin_command()?,
            _ => return Ok(()),
        };
        execute(ctx, session, command)?;
    }
}

fn admin_menu(ctx: &CashpointContext, session: &Session) -> Result<()> {
    loop {
        println!();
        let title = format!("{} ({})", session.username, session.role);
        let command = match prompt_choice(&title, ADMIN_MENU)? {
            0 => Command::ListAccounts,
            1 => match create_account_command()? {
                Some(command) => command,
                None => continue,
            },
            2 => {
                let username = prompt_text("Username", None)?;
                let confirm = prompt_text(&format!("Type 'yes' to delete '{}'", username), None)?;
                if confirm.trim() != "yes" {
                    println!("Cancelled");
                    continue;
                }
                Command::DeleteAccount { username }
            }
            3 => {
                let username = prompt_text("Username", None)?;
                let role = prompt_text("Role (admin/user)", None)?;
                match report(role.parse::<Role>())? {
                    Some(role) => Command::ChangeRole { username, role },
                    None => continue,
                }
            }
            4 => Command::ResetPin {
                username: prompt_text("Username", None)?,
            },
            5 => Command::Transactions { limit: None },
            6 => match prompt_amount("Cash in machine", None)? {
                Some(amount) => Command::SetVaultCash { amount },
                None => continue,
            },
            7 => Command::Status,
            8 => change_pin_command()?,
            _ => return Ok(()),
        };
        execute(ctx, session, command)?;
    }
}

fn change_pin_command() -> Result<Command> {
    let old_pin = prompt_pin("Current PIN")?;
    let (new_pin, confirm) = prompt_new_pin()?;
    Ok(Command::ChangePin {
        old_pin,
        new_pin,
        confirm,
    })
}

fn create_account_command() -> Result<Option<Command>> {
    let username = prompt_text("Username", None)?;
    let pin = prompt_pin("PIN (leave empty to let the user choose)")?;
    let role = prompt_text("Role", Some("user"))?;
    let Some(role) = report(role.parse::<Role>())? else {
        return Ok(None);
    };
    let Some(initial_balance) = prompt_amount("Opening balance", Some("0"))? else {
        return Ok(None);
    };

    Ok(Some(Command::CreateAccount {
        username,
        role,
        initial_balance,
        pin: if pin.is_empty() { None } else { Some(pin) },
    }))
}

fn execute(ctx: &CashpointContext, session: &Session, command: Command) -> Result<()> {
    let Some(result) = report(ctx.dispatcher().execute(session, command))? else {
        return Ok(());
    };

    match result {
        CommandOutput::Balance(balance) => println!("Balance: {}", format_amount(balance)),
        CommandOutput::NewBalance(balance) => {
            output::success(&format!("Done. New balance: {}", format_amount(balance)))
        }
        CommandOutput::Accounts(accounts) => {
            let mut table = output::create_table();
            table.set_header(vec!["User", "Role", "Balance", "PIN"]);
            for account in accounts {
                table.add_row(vec![
                    account.username,
                    account.role.to_string(),
                    format_amount(account.balance),
                    if account.has_pin { "set" } else { "pending" }.to_string(),
                ]);
            }
            println!("{}", table);
        }
        CommandOutput::Transactions(records) => {
            if records.is_empty() {
                println!("No transactions yet.");
            } else {
                println!("{}", output::transactions_table(&records));
            }
        }
        CommandOutput::Status(status) => println!("{}", output::status_table(&status)),
        CommandOutput::Done => output::success("Done"),
    }
    Ok(())
}
