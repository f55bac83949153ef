use anyhow::Result;

use crate::ops::{Exit, Session, run_install};
use crate::{Cli, InstallArgs};

/// Install applications from the catalog.
pub async fn install(cli: &Cli, args: &InstallArgs) -> Result<Exit> {
    let session = Session::open(cli);
    let exit = run_install(&session, cli, args).await?;
    Ok(exit)
}
