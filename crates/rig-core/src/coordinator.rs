//! Schedules installation pipelines.
//!
//! Sequential mode runs pipelines in selection order and reports progress with
//! an ETA after each one. Parallel mode keeps at most `max_parallel` pipelines
//! in a [`JoinSet`], spawning the next one whenever one finishes.
//!
//! Each pipeline owns its [`InstallationContext`]; the only thing tasks share
//! is the read-only [`Context`]. A panicking pipeline becomes a failed entry
//! and never takes the run down with it.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use rig_schema::{AppName, ApplicationSpec, RunMode};
use tokio::task::JoinSet;

use crate::context::Context;
use crate::error::FailureReason;
use crate::pipeline::{InstallationContext, run_pipeline};
use crate::result::RunResult;

type PipelineResult = (AppName, Option<String>, Result<InstallationContext, String>);

/// Run every app according to the configured [`RunMode`].
///
/// Returns only after each app has a terminal outcome.
pub async fn run_all(ctx: &Context, apps: &[ApplicationSpec]) -> RunResult {
    let names: Vec<AppName> = apps.iter().map(|a| a.name.clone()).collect();
    ctx.reporter.queued(&names);

    let mut result = match ctx.settings.mode {
        RunMode::Sequential => run_sequential(ctx, apps).await,
        RunMode::Parallel => run_parallel(ctx, apps, ctx.settings.parallelism()).await,
    };
    result.finalize(&names);
    result
}

pub async fn run_sequential(ctx: &Context, apps: &[ApplicationSpec]) -> RunResult {
    let mut result = RunResult::new();
    let total = apps.len();
    let started = Instant::now();

    for (index, app) in apps.iter().enumerate() {
        let outcome = guarded(ctx.clone(), app.clone()).await;
        record(ctx, &mut result, outcome);

        let completed = index + 1;
        ctx.reporter
            .progress(completed, total, eta(started.elapsed(), completed, total));
    }
    result
}

pub async fn run_parallel(ctx: &Context, apps: &[ApplicationSpec], limit: usize) -> RunResult {
    let limit = limit.max(1);
    let mut result = RunResult::new();
    let mut queue = apps.iter();
    let mut set: JoinSet<PipelineResult> = JoinSet::new();

    loop {
        while set.len() < limit {
            let Some(app) = queue.next() else { break };
            tracing::debug!(app = %app.name, active = set.len() + 1, limit, "spawning pipeline");
            set.spawn(guarded(ctx.clone(), app.clone()));
        }

        match set.join_next().await {
            Some(Ok(outcome)) => record(ctx, &mut result, outcome),
            // Only reachable if the runtime cancels the task; `finalize` fills the gap.
            Some(Err(e)) => tracing::error!(error = %e, "pipeline task did not complete"),
            None => break,
        }
    }
    result
}

/// Run one pipeline, converting a panic into an error string.
async fn guarded(ctx: Context, app: ApplicationSpec) -> PipelineResult {
    let link = app.download_link().map(str::to_string);
    let outcome = AssertUnwindSafe(run_pipeline(&ctx, &app))
        .catch_unwind()
        .await
        .map_err(|payload| panic_message(payload.as_ref()));
    (app.name, link, outcome)
}

fn record(ctx: &Context, result: &mut RunResult, (name, link, outcome): PipelineResult) {
    match outcome {
        Ok(ictx) => result.record(ictx),
        Err(message) => {
            tracing::error!(app = %name, %message, "pipeline panicked");
            ctx.reporter.failed(&name, &format!("internal error: {message}"));
            result.record_failure(name, FailureReason::Internal(message), link);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "pipeline panicked".to_string()
    }
}

/// Remaining time from the running average of completed items.
pub fn eta(elapsed: Duration, completed: usize, total: usize) -> Option<Duration> {
    if completed == 0 || completed >= total {
        return None;
    }
    let per_item = elapsed / u32::try_from(completed).ok()?;
    per_item.checked_mul(u32::try_from(total - completed).ok()?)
}
