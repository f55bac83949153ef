use anyhow::Result;
use crossterm::style::Stylize;

use crate::Cli;
use crate::ops::{Exit, Session};

/// Print configuration warnings. Exits 1 when there are any.
pub fn validate(cli: &Cli) -> Result<Exit> {
    let session = Session::open(cli);
    let catalog = &session.catalog;
    let warnings = catalog.validate();

    let mut out = String::new();
    for warning in &warnings {
        out.push_str(&format!("  {} {warning}\n", "!".yellow().bold()));
    }
    out.push_str(&format!(
        "{} application(s), {} warning(s)",
        catalog.len(),
        warnings.len()
    ));
    session.reporter.print(out);

    Ok(if warnings.is_empty() {
        Exit::Ok
    } else {
        Exit::Failures
    })
}
