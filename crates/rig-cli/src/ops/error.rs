//! Fatal run-level errors and process exit codes

use thiserror::Error;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Every requested application is installed or already present.
    Ok = 0,
    /// At least one application exhausted all methods.
    Failures = 1,
    /// The named application is not in the catalog.
    UnknownApp = 2,
    /// A required argument was not given.
    MissingArgument = 3,
    /// A fatal precondition stopped the run.
    Fatal = 4,
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        Self::from(exit as u8)
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("administrator rights are required (re-run elevated, or pass --no-admin-check)")]
    PermissionDenied,

    #[error("no package manager is usable: {0}")]
    NoBackend(String),

    #[error("cancelled by operator")]
    Cancelled,

    #[error("unknown application '{0}' (see `rig list`)")]
    UnknownApp(String),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

}

impl RunError {
    pub fn exit(&self) -> Exit {
        match self {
            Self::UnknownApp(_) => Exit::UnknownApp,
            Self::MissingArgument(_) => Exit::MissingArgument,
            _ => Exit::Fatal,
        }
    }
}
