//! The per-application installation pipeline.
//!
//! ```text
//! NotStarted -> AlreadyInstalled                    (present, not forced)
//! NotStarted -> NeedsInstall -> Succeeded           (first method to succeed wins)
//!                            -> ExhaustedAllMethods (every method failed or was unavailable)
//! ```
//!
//! A dry run stops in `NeedsInstall`.

use chrono::{DateTime, Utc};
use rig_schema::{AppName, ApplicationSpec};

use crate::backend::{Backend, BackendKind};
use crate::context::Context;
use crate::error::FailureReason;
use crate::retry::{RetryError, Retried, with_retry_if};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    AlreadyInstalled,
    NeedsInstall,
    Succeeded,
    ExhaustedAllMethods,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    Failed,
    /// The backend's client is not available on this machine.
    Skipped,
}

/// The record of one method in the plan.
///
/// Retries inside a method share one outcome; `attempts` counts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub backend: BackendKind,
    pub status: AttemptStatus,
    pub attempts: u32,
    pub reason: Option<FailureReason>,
    pub detail: String,
}

impl AttemptOutcome {
    fn succeeded(backend: BackendKind, attempts: u32) -> Self {
        Self {
            backend,
            status: AttemptStatus::Succeeded,
            attempts,
            reason: None,
            detail: format!("installed via {backend}"),
        }
    }

    fn failed(backend: BackendKind, attempts: u32, reason: FailureReason) -> Self {
        Self {
            backend,
            status: AttemptStatus::Failed,
            attempts,
            detail: reason.to_string(),
            reason: Some(reason),
        }
    }

    pub(crate) fn unavailable(backend: BackendKind) -> Self {
        Self {
            backend,
            status: AttemptStatus::Skipped,
            attempts: 0,
            reason: None,
            detail: "client not available".to_string(),
        }
    }
}

/// State owned by exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct InstallationContext {
    pub app: AppName,
    pub state: PipelineState,
    /// Methods that would be (or were) tried, in order.
    pub planned: Vec<BackendKind>,
    pub outcomes: Vec<AttemptOutcome>,
    /// Manual-download link shown when automated installation fails.
    pub link: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl InstallationContext {
    pub fn new(app: &ApplicationSpec) -> Self {
        Self {
            app: app.name.clone(),
            state: PipelineState::NotStarted,
            planned: Vec::new(),
            outcomes: Vec::new(),
            link: app.download_link().map(str::to_string),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn finish(mut self, state: PipelineState) -> Self {
        tracing::info!(app = %self.app, ?state, "pipeline finished");
        self.state = state;
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.finished_at
            .and_then(|end| (end - self.started_at).to_std().ok())
    }

    /// The failure reason of the last failed method, if any.
    pub fn last_reason(&self) -> Option<&FailureReason> {
        self.outcomes.iter().rev().find_map(|o| o.reason.as_ref())
    }

    /// Whether the only thing that stopped this app is a manual download.
    pub fn needs_manual_action(&self) -> bool {
        self.state == PipelineState::ExhaustedAllMethods
            && matches!(
                self.last_reason(),
                Some(FailureReason::ManualActionRequired { .. })
            )
    }

    /// Total backend invocations across all methods.
    pub fn total_attempts(&self) -> u32 {
        self.outcomes.iter().map(|o| o.attempts).sum()
    }
}

/// Drive one application from `NotStarted` to a terminal state.
///
/// Never fails: every problem is recorded in the returned context.
pub async fn run_pipeline(ctx: &Context, app: &ApplicationSpec) -> InstallationContext {
    let mut ictx = InstallationContext::new(app);
    let reporter = &ctx.reporter;
    reporter.checking(&app.name);

    let present = ctx.presence.is_installed(app).await;
    if present && !ctx.options.force {
        reporter.skipped(&app.name, "already installed");
        return ictx.finish(PipelineState::AlreadyInstalled);
    }
    if present {
        tracing::info!(app = %app.name, "present, reinstalling because force is set");
    }
    ictx.state = PipelineState::NeedsInstall;

    let plan = Backend::plan(app);
    ictx.planned = plan.iter().map(Backend::kind).collect();

    if ctx.options.dry_run {
        let methods: Vec<_> = ictx.planned.iter().map(BackendKind::as_str).collect();
        let detail = if methods.is_empty() {
            "would install, but no method is configured".to_string()
        } else {
            format!("would try {}", methods.join(", "))
        };
        reporter.skipped(&app.name, &detail);
        ictx.finished_at = Some(Utc::now());
        return ictx;
    }

    for backend in &plan {
        let kind = backend.kind();
        if !backend.is_available(ctx) {
            tracing::info!(app = %app.name, backend = %kind, "backend unavailable, skipping");
            ictx.outcomes.push(AttemptOutcome::unavailable(kind));
            continue;
        }

        let policy = backend.retry_policy(&ctx.settings);
        let max = policy.max_attempts.max(1);
        let result = with_retry_if(policy, FailureReason::is_retryable, move |attempt| {
            tracing::debug!(app = %app.name, backend = %kind, attempt, max, "attempting");
            ctx.reporter.attempting(&app.name, kind, attempt, max);
            backend.attempt(ctx, app)
        })
        .await;

        match result {
            Ok(Retried { attempts, .. }) => {
                ictx.outcomes.push(AttemptOutcome::succeeded(kind, attempts));
                reporter.done(&app.name, &format!("installed via {kind}"));
                return ictx.finish(PipelineState::Succeeded);
            }
            Err(RetryError { attempts, last }) => {
                tracing::warn!(app = %app.name, backend = %kind, attempts, reason = %last, "method failed");
                ictx.outcomes.push(AttemptOutcome::failed(kind, attempts, last));
            }
        }
    }

    let ictx = ictx.finish(PipelineState::ExhaustedAllMethods);
    let message = match ictx.last_reason() {
        Some(FailureReason::ManualActionRequired { .. }) => "manual download required".to_string(),
        Some(reason) => format!("all methods failed (last: {reason})"),
        None if plan.is_empty() => "no installation method configured".to_string(),
        None => "no installation client available".to_string(),
    };
    reporter.failed(&app.name, &message);
    ictx
}
