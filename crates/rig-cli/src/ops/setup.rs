//! Per-invocation setup shared by every command.
//!
//! Loads the catalog, opens the run log, and spawns the UI actor that owns
//! both stdout and the log for the rest of the process.

use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rig_core::{CommandRunner, Context, Reporter, RunOptions, SystemRunner};
use rig_schema::{Catalog, Settings};

use super::error::RunError;
use crate::Cli;
use crate::ui::{ConsoleReporter, RunLog, UiActor};

pub struct Session {
    pub catalog: Catalog,
    pub runner: Arc<dyn CommandRunner>,
    pub reporter: ConsoleReporter,
    log_path: PathBuf,
    ui: UiActor,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("apps", &self.catalog.len())
            .field("log_path", &self.log_path)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn open(cli: &Cli) -> Self {
        let config = cli.config.clone().unwrap_or_else(rig_core::config_path);
        let (catalog, load_error) = Catalog::load_or_builtin(&config);

        let log_path = log_path(cli.log_file.as_deref(), &catalog.settings);
        let ui = UiActor::spawn(RunLog::open(&log_path));
        let reporter = ui.reporter();

        if let Some(e) = load_error {
            tracing::debug!(path = %config.display(), error = %e, "catalog not loaded");
            reporter.warning(&format!("{e}; using the built-in catalog"));
        }

        Self {
            catalog,
            runner: Arc::new(SystemRunner),
            reporter,
            log_path,
            ui,
        }
    }

    /// Build the engine context for a run.
    pub fn context(&self, settings: Settings, options: RunOptions) -> Result<Context, RunError> {
        let reporter: Arc<dyn Reporter> = Arc::new(self.reporter.clone());
        Ok(Context::new(
            settings,
            self.runner.clone(),
            reporter,
            options,
        )?)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Wait for the UI thread to drain; call before prompting.
    pub async fn sync(&self) {
        self.ui.sync().await;
    }
}

/// `--log-file`, then `settings.log_file`, then `$RIG_HOME/logs/rig.log`.
pub fn log_path(flag: Option<&Path>, settings: &Settings) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| settings.log_file.clone())
        .unwrap_or_else(rig_core::default_log_file)
}

/// An operator can answer prompts.
pub fn is_interactive(assume_yes: bool) -> bool {
    !assume_yes && std::io::stdin().is_terminal()
}
