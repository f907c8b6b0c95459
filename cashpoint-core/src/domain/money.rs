//! Amount parsing and validation

use std::str::FromStr;

use rust_decimal::Decimal;

use super::result::{Error, Result};

/// Amounts are whole cents
pub const MAX_SCALE: u32 = 2;

/// Parse user input such as `"50"` or `"12.75"` into an amount
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| Error::invalid_amount(format!("'{}' is not a number", trimmed)))?;
    check_scale(amount)?;
    Ok(amount)
}

/// Amounts moved by deposits and withdrawals must be > 0
pub fn require_positive(amount: Decimal) -> Result<Decimal> {
    check_scale(amount)?;
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_amount(format!(
            "{} must be greater than zero",
            amount
        )));
    }
    Ok(amount)
}

/// Balances and vault cash must be >= 0
pub fn require_non_negative(amount: Decimal) -> Result<Decimal> {
    check_scale(amount)?;
    if amount < Decimal::ZERO {
        return Err(Error::invalid_amount(format!("{} cannot be negative", amount)));
    }
    Ok(amount)
}

fn check_scale(amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > MAX_SCALE {
        return Err(Error::invalid_amount(format!(
            "{} has more than {} decimal places",
            amount, MAX_SCALE
        )));
    }
    Ok(())
}

/// Render an amount with two decimals
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}
