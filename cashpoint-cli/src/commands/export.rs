//! Export command - write the audit log as CSV

use std::path::Path;

use anyhow::{Context, Result};

use super::{admin_login, get_context};
use crate::output;

pub fn run(user: Option<String>, path: &Path) -> Result<()> {
    let ctx = get_context()?;
    admin_login(&ctx, user)?;

    let count = ctx
        .audit_service
        .export_csv(path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;

    output::success(&format!("Exported {} records to {}", count, path.display()));
    Ok(())
}
