use anyhow::Result;
use rig_core::{RunOptions, coordinator};
use rig_schema::RunMode;

use crate::Cli;
use crate::ops::{Exit, RunError, Session, report};

/// Install exactly one application: no preflight, no bootstrap, no prompts.
///
/// Exits 0 when the application is installed (or already present), 1 when
/// every method failed, 2 for an unknown name and 3 when no name is given.
pub async fn install_one(cli: &Cli, name: Option<&str>, force: bool) -> Result<Exit> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(RunError::MissingArgument("NAME"))?;

    let session = Session::open(cli);
    let app = session
        .catalog
        .find(name)
        .cloned()
        .ok_or_else(|| RunError::UnknownApp(name.to_string()))?;

    let mut settings = session.catalog.settings.clone();
    settings.mode = RunMode::Sequential;
    let options = RunOptions {
        force,
        dry_run: cli.dry_run,
        interactive: false,
    };
    let ctx = session.context(settings, options)?;

    let result = coordinator::run_all(&ctx, std::slice::from_ref(&app)).await;
    report::summarize(&result, &session.reporter, false);
    session.sync().await;

    Ok(if result.all_succeeded() {
        Exit::Ok
    } else {
        Exit::Failures
    })
}
