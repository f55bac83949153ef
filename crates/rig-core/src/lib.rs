pub mod backend;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod presence;
pub mod process;
pub mod reporter;
pub mod result;
pub mod retry;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, BackendKind};
pub use context::{Context, RunOptions};
pub use error::FailureReason;
pub use paths::*;
pub use pipeline::{AttemptOutcome, AttemptStatus, InstallationContext, PipelineState};
pub use presence::PresenceChecker;
pub use process::{CommandRunner, ProcessError, ProcessOutput, SystemRunner};
pub use reporter::{NullReporter, Reporter};
pub use result::{AppReport, Disposition, RunResult};
pub use retry::{RetryError, RetryPolicy, Retried, with_retry, with_retry_if};

/// User Agent string for network requests
pub const USER_AGENT: &str = concat!("rig/", env!("CARGO_PKG_VERSION"));
