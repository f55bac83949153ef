//! Shared run context.
//!
//! This module defines the `Context` struct, which groups the read-only state
//! every installation pipeline needs: settings, the process runner, the HTTP
//! client, the presence checker, and the reporter. Cloning it is cheap; each
//! parallel pipeline gets its own clone.

use crate::presence::PresenceChecker;
use crate::process::CommandRunner;
use crate::reporter::Reporter;
use rig_schema::Settings;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Per-run switches chosen on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Reinstall even when the presence check is positive.
    pub force: bool,
    /// Stop after the presence check; never invoke a backend.
    pub dry_run: bool,
    /// An operator is present (browser may be opened for manual downloads).
    pub interactive: bool,
}

/// Groups common state used during installation operations.
#[derive(Clone)]
pub struct Context {
    pub settings: Arc<Settings>,
    pub runner: Arc<dyn CommandRunner>,
    pub presence: Arc<PresenceChecker>,
    pub client: reqwest::Client,
    pub reporter: Arc<dyn Reporter>,
    pub options: RunOptions,
    pub tmp_dir: PathBuf,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("options", &self.options)
            .field("tmp_dir", &self.tmp_dir)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context with a configured HTTP client and the platform's
    /// default presence sources.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend of the HTTP client cannot be initialised.
    pub fn new(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        reporter: Arc<dyn Reporter>,
        options: RunOptions,
    ) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(settings.download_timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            presence: Arc::new(PresenceChecker::new(runner.clone())),
            settings: Arc::new(settings),
            runner,
            client,
            reporter,
            options,
            tmp_dir: crate::tmp_path(),
        })
    }

    pub fn with_presence(mut self, presence: PresenceChecker) -> Self {
        self.presence = Arc::new(presence);
        self
    }

    pub fn with_tmp_dir(mut self, tmp_dir: PathBuf) -> Self {
        self.tmp_dir = tmp_dir;
        self
    }

    /// Subprocess timeout for installers, if one is configured.
    pub fn install_timeout(&self) -> Option<Duration> {
        self.settings.install_timeout_secs.map(Duration::from_secs)
    }
}
