//! Typed failure reasons for a single backend attempt.
//!
//! Each adapter produces a [`FailureReason`] at the point of failure (exit
//! code table, HTTP status, hash check). Operator advice is derived from the
//! variant, never re-parsed from error text.

use thiserror::Error;

use crate::process::ProcessError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("access denied")]
    AccessDenied,

    #[error("package not found")]
    PackageNotFound,

    #[error("exited with code {0}")]
    ExitCode(i32),

    #[error("terminated without an exit code")]
    Terminated,

    #[error("could not start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("timed out after {0}s")]
    TimedOut(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("downloaded installer is empty")]
    EmptyArtifact,

    #[error("hash mismatch: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("manual download required")]
    ManualActionRequired { url: Option<String> },

    /// Every planned method needs a client that is not installed.
    #[error("no installation client available (tried {0})")]
    NoClientAvailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FailureReason {
    /// Advice shown next to the error in the final summary.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::AccessDenied => Some("Run rig from an elevated (administrator) shell."),
            Self::PackageNotFound => {
                Some("Check the package identifier in the catalog or refresh the manager's sources.")
            }
            Self::Network(_) | Self::HttpStatus(_) | Self::TimedOut(_) => {
                Some("Check network connectivity and proxy settings, then retry.")
            }
            Self::IntegrityFailure { .. } | Self::EmptyArtifact => {
                Some("The download was corrupt or has changed upstream; verify expected_hash.")
            }
            Self::Spawn { .. } => Some("Make sure the installer or client can be executed."),
            Self::Io(_) => Some("Check free disk space and permissions on the rig temp directory."),
            Self::ManualActionRequired { .. } => {
                Some("Download and install this application by hand.")
            }
            Self::NoClientAvailable(_) => Some(
                "Install a package manager client or add a direct_url for this application.",
            ),
            Self::ExitCode(_) | Self::Terminated | Self::Internal(_) => None,
        }
    }

    /// Whether repeating the same attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AccessDenied
                | Self::PackageNotFound
                | Self::ManualActionRequired { .. }
                | Self::NoClientAvailable(_)
        )
    }

    /// Manual-download outcomes are expected and not shown as errors.
    pub fn is_operator_error(&self) -> bool {
        !matches!(self, Self::ManualActionRequired { .. })
    }
}

impl From<ProcessError> for FailureReason {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::Spawn { program, source } => Self::Spawn {
                program,
                message: source.to_string(),
            },
            ProcessError::TimedOut { after, .. } => Self::TimedOut(after.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_follow_the_variant() {
        assert!(
            FailureReason::AccessDenied
                .suggestion()
                .unwrap()
                .contains("administrator")
        );
        assert!(FailureReason::ExitCode(1603).suggestion().is_none());
        assert_eq!(
            FailureReason::Network("reset".into()).suggestion(),
            FailureReason::HttpStatus(503).suggestion()
        );
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        assert!(!FailureReason::PackageNotFound.is_retryable());
        assert!(!FailureReason::ManualActionRequired { url: None }.is_retryable());
        assert!(FailureReason::ExitCode(1).is_retryable());
        assert!(FailureReason::EmptyArtifact.is_retryable());
    }

    #[test]
    fn manual_is_not_an_operator_error() {
        assert!(!FailureReason::ManualActionRequired { url: None }.is_operator_error());
        assert!(FailureReason::Terminated.is_operator_error());
    }
}
