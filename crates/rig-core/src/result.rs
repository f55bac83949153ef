//! Aggregate outcome of a run.
//!
//! Every requested application ends up in exactly one of three sets:
//! successful, failed or skipped. Recording a name moves it out of whichever
//! set held it before, so the sets always partition the recorded names.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use rig_schema::AppName;

use crate::error::FailureReason;
use crate::pipeline::{AttemptOutcome, InstallationContext, PipelineState};

/// How one application ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Installed,
    AlreadyInstalled,
    Failed,
    ManualRequired,
    /// Not attempted (not selected, dry run, unknown).
    Skipped(String),
}

impl Disposition {
    pub fn label(&self) -> &str {
        match self {
            Self::Installed => "installed",
            Self::AlreadyInstalled => "already installed",
            Self::Failed => "failed",
            Self::ManualRequired => "manual download",
            Self::Skipped(reason) => reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReport {
    pub name: AppName,
    pub disposition: Disposition,
    pub outcomes: Vec<AttemptOutcome>,
    /// Failure reason not tied to a single attempt (panics, nothing configured,
    /// no client for any planned method).
    pub error: Option<FailureReason>,
    pub link: Option<String>,
    pub elapsed: Option<Duration>,
}

impl AppReport {
    fn new(name: AppName, disposition: Disposition) -> Self {
        Self {
            name,
            disposition,
            outcomes: Vec::new(),
            error: None,
            link: None,
            elapsed: None,
        }
    }

    /// Distinct error texts from every failed method, in attempt order.
    pub fn errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = Vec::new();
        let texts = self
            .outcomes
            .iter()
            .filter(|o| o.reason.is_some())
            .map(|o| format!("{}: {}", o.backend, o.detail))
            .chain(self.error.iter().map(ToString::to_string));
        for text in texts {
            if !errors.contains(&text) {
                errors.push(text);
            }
        }
        errors
    }

    /// Operator advice for every distinct failure reason.
    pub fn suggestions(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        for hint in self.reasons().filter_map(FailureReason::suggestion) {
            if !out.contains(&hint) {
                out.push(hint);
            }
        }
        out
    }

    /// Failed, and not only because a manual download is expected.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self.disposition,
            Disposition::Failed | Disposition::ManualRequired
        ) && self.reasons().any(FailureReason::is_operator_error)
    }

    fn reasons(&self) -> impl Iterator<Item = &FailureReason> {
        self.outcomes
            .iter()
            .filter_map(|o| o.reason.as_ref())
            .chain(self.error.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunResult {
    successful: BTreeSet<AppName>,
    failed: BTreeSet<AppName>,
    skipped: BTreeSet<AppName>,
    reports: BTreeMap<AppName, AppReport>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pipeline's terminal context.
    pub fn record(&mut self, ictx: InstallationContext) {
        let disposition = match ictx.state {
            PipelineState::Succeeded => Disposition::Installed,
            PipelineState::AlreadyInstalled => Disposition::AlreadyInstalled,
            PipelineState::ExhaustedAllMethods if ictx.needs_manual_action() => {
                Disposition::ManualRequired
            }
            PipelineState::ExhaustedAllMethods => Disposition::Failed,
            PipelineState::NeedsInstall => Disposition::Skipped("dry run".to_string()),
            PipelineState::NotStarted => Disposition::Skipped("not started".to_string()),
        };
        let error = if disposition != Disposition::Failed || ictx.last_reason().is_some() {
            None
        } else if ictx.outcomes.is_empty() {
            Some(FailureReason::Internal(
                "no installation method configured".to_string(),
            ))
        } else {
            let tried: Vec<_> = ictx.outcomes.iter().map(|o| o.backend.as_str()).collect();
            Some(FailureReason::NoClientAvailable(tried.join(", ")))
        };

        let elapsed = ictx.elapsed();
        let report = AppReport {
            name: ictx.app.clone(),
            disposition,
            outcomes: ictx.outcomes,
            error,
            link: ictx.link,
            elapsed,
        };
        self.insert(report);
    }

    /// Record a failure that happened outside the pipeline (e.g. a panic).
    pub fn record_failure(&mut self, name: AppName, reason: FailureReason, link: Option<String>) {
        let mut report = AppReport::new(name, Disposition::Failed);
        report.error = Some(reason);
        report.link = link;
        self.insert(report);
    }

    pub fn record_skipped(&mut self, name: AppName, reason: impl Into<String>) {
        self.insert(AppReport::new(name, Disposition::Skipped(reason.into())));
    }

    /// Mark every requested name that was never recorded as failed.
    pub fn finalize<'a>(&mut self, requested: impl IntoIterator<Item = &'a AppName>) {
        for name in requested {
            if !self.reports.contains_key(name) {
                tracing::warn!(app = %name, "no terminal outcome recorded");
                self.record_failure(
                    name.clone(),
                    FailureReason::Internal("pipeline did not report an outcome".to_string()),
                    None,
                );
            }
        }
    }

    fn insert(&mut self, report: AppReport) {
        let name = report.name.clone();
        self.successful.remove(&name);
        self.failed.remove(&name);
        self.skipped.remove(&name);

        let set = match report.disposition {
            Disposition::Installed => &mut self.successful,
            Disposition::Failed | Disposition::ManualRequired => &mut self.failed,
            Disposition::AlreadyInstalled | Disposition::Skipped(_) => &mut self.skipped,
        };
        set.insert(name.clone());
        self.reports.insert(name, report);
    }

    pub fn successful(&self) -> &BTreeSet<AppName> {
        &self.successful
    }

    pub fn failed(&self) -> &BTreeSet<AppName> {
        &self.failed
    }

    pub fn skipped(&self) -> &BTreeSet<AppName> {
        &self.skipped
    }

    pub fn report(&self, name: &str) -> Option<&AppReport> {
        self.reports.get(name)
    }

    /// Reports in name order.
    pub fn reports(&self) -> impl Iterator<Item = &AppReport> {
        self.reports.values()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// No requested application ended in the failed set.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failed apps that need operator attention (manual downloads excluded).
    pub fn operator_errors(&self) -> impl Iterator<Item = &AppReport> {
        self.reports.values().filter(|r| r.needs_attention())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::pipeline::AttemptStatus;
    use rig_schema::ApplicationSpec;

    fn finished(name: &str, state: PipelineState, outcomes: Vec<AttemptOutcome>) -> InstallationContext {
        let mut ictx = InstallationContext::new(&ApplicationSpec::new(name));
        ictx.state = state;
        ictx.outcomes = outcomes;
        ictx
    }

    fn failed_outcome(backend: BackendKind, reason: FailureReason) -> AttemptOutcome {
        AttemptOutcome {
            backend,
            status: AttemptStatus::Failed,
            attempts: 3,
            detail: reason.to_string(),
            reason: Some(reason),
        }
    }

    #[test]
    fn dispositions_land_in_the_right_set() {
        let mut result = RunResult::new();
        result.record(finished("a", PipelineState::Succeeded, vec![]));
        result.record(finished("b", PipelineState::AlreadyInstalled, vec![]));
        result.record(finished(
            "c",
            PipelineState::ExhaustedAllMethods,
            vec![failed_outcome(BackendKind::PackageManagerA, FailureReason::ExitCode(1))],
        ));
        result.record(finished(
            "vs",
            PipelineState::ExhaustedAllMethods,
            vec![failed_outcome(
                BackendKind::Manual,
                FailureReason::ManualActionRequired { url: None },
            )],
        ));
        result.record_skipped(AppName::new("d"), "not selected");

        assert_eq!(result.successful().len(), 1);
        assert!(result.failed().contains("c") && result.failed().contains("vs"));
        assert!(result.skipped().contains("b") && result.skipped().contains("d"));
        assert_eq!(result.report("vs").unwrap().disposition, Disposition::ManualRequired);
        assert_eq!(result.operator_errors().count(), 1);
        assert!(!result.all_succeeded());
    }

    #[test]
    fn re_recording_moves_between_sets() {
        let mut result = RunResult::new();
        result.record_failure(AppName::new("a"), FailureReason::Internal("boom".into()), None);
        result.record(finished("a", PipelineState::Succeeded, vec![]));

        assert!(result.failed().is_empty());
        assert!(result.successful().contains("a"));
        assert_eq!(result.len(), 1);
        assert!(result.all_succeeded());
    }

    #[test]
    fn finalize_fills_in_missing_names() {
        let requested = [AppName::new("a"), AppName::new("b")];
        let mut result = RunResult::new();
        result.record(finished("a", PipelineState::Succeeded, vec![]));
        result.finalize(&requested);

        assert!(result.failed().contains("b"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn unavailable_clients_still_explain_the_failure() {
        let mut result = RunResult::new();
        result.record(finished(
            "git",
            PipelineState::ExhaustedAllMethods,
            vec![
                AttemptOutcome::unavailable(BackendKind::PackageManagerA),
                AttemptOutcome::unavailable(BackendKind::PackageManagerB),
            ],
        ));

        let report = result.report("git").unwrap();
        assert_eq!(report.disposition, Disposition::Failed);
        assert_eq!(
            report.errors(),
            vec!["no installation client available (tried manager-a, manager-b)"]
        );
        assert_eq!(report.suggestions().len(), 1);
        assert!(report.needs_attention());
        assert_eq!(result.operator_errors().count(), 1);
    }

    #[test]
    fn nothing_configured_is_an_internal_error() {
        let mut result = RunResult::new();
        result.record(finished("bare", PipelineState::ExhaustedAllMethods, vec![]));
        let report = result.report("bare").unwrap();
        assert_eq!(
            report.error,
            Some(FailureReason::Internal("no installation method configured".into()))
        );
    }

    #[test]
    fn errors_are_distinct_and_ordered() {
        let mut result = RunResult::new();
        result.record(finished(
            "c",
            PipelineState::ExhaustedAllMethods,
            vec![
                failed_outcome(BackendKind::PackageManagerA, FailureReason::AccessDenied),
                failed_outcome(BackendKind::PackageManagerB, FailureReason::AccessDenied),
                failed_outcome(BackendKind::DirectDownload, FailureReason::HttpStatus(404)),
            ],
        ));
        let report = result.report("c").unwrap();
        assert_eq!(
            report.errors(),
            vec![
                "manager-a: access denied",
                "manager-b: access denied",
                "download: HTTP status 404"
            ]
        );
        assert_eq!(report.suggestions().len(), 2);
    }
}
