use anyhow::Result;

use crate::Cli;
use crate::ops::{Exit, RunError, Session};
use rig_core::PresenceChecker;

/// Run the presence check for one application.
///
/// Exits 0 when installed, 1 when not, 2 when the name is unknown.
pub async fn check(cli: &Cli, name: &str) -> Result<Exit> {
    let session = Session::open(cli);
    let app = session
        .catalog
        .find(name)
        .ok_or_else(|| RunError::UnknownApp(name.to_string()))?;

    let checker = PresenceChecker::new(session.runner.clone());
    let installed = checker.is_installed(app).await;
    let verdict = if installed { "installed" } else { "not installed" };
    session.reporter.print(format!("{}: {verdict}", app.name));

    Ok(if installed { Exit::Ok } else { Exit::Failures })
}
