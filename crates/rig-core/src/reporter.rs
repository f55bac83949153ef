//! Reporter trait for dependency injection
//!
//! Pipelines and the coordinator report progress through this trait so the
//! engine is not coupled to a terminal, a log file, or a test harness.

use std::time::Duration;

use crate::backend::BackendKind;
use rig_schema::AppName;

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Preflight", "Installing").
    fn section(&self, title: &str);

    /// Reserve display rows for the applications about to be processed.
    fn queued(&self, apps: &[AppName]);

    /// The presence check for an application has started.
    fn checking(&self, name: &AppName);

    /// A backend attempt has started.
    fn attempting(&self, name: &AppName, backend: BackendKind, attempt: u32, max_attempts: u32);

    /// Updates the progress of an installer download.
    fn downloading(&self, name: &AppName, current: u64, total: Option<u64>);

    /// Marks an application as successfully completed.
    fn done(&self, name: &AppName, detail: &str);

    /// Marks an application as failed with a specific reason.
    fn failed(&self, name: &AppName, reason: &str);

    /// Marks an application as skipped (already present, declined, dry run).
    fn skipped(&self, name: &AppName, reason: &str);

    /// Sequential-mode progress after each completed application.
    fn progress(&self, completed: usize, total: usize, remaining: Option<Duration>);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log a status line (phase transitions, counters).
    fn status(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn queued(&self, apps: &[AppName]) {
        (**self).queued(apps);
    }
    fn checking(&self, name: &AppName) {
        (**self).checking(name);
    }
    fn attempting(&self, name: &AppName, backend: BackendKind, attempt: u32, max_attempts: u32) {
        (**self).attempting(name, backend, attempt, max_attempts);
    }
    fn downloading(&self, name: &AppName, current: u64, total: Option<u64>) {
        (**self).downloading(name, current, total);
    }
    fn done(&self, name: &AppName, detail: &str) {
        (**self).done(name, detail);
    }
    fn failed(&self, name: &AppName, reason: &str) {
        (**self).failed(name, reason);
    }
    fn skipped(&self, name: &AppName, reason: &str) {
        (**self).skipped(name, reason);
    }
    fn progress(&self, completed: usize, total: usize, remaining: Option<Duration>) {
        (**self).progress(completed, total, remaining);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn status(&self, msg: &str) {
        (**self).status(msg);
    }
}

/// A no-op reporter for silent operations (e.g., presence checks, testing).
#[derive(Clone, Copy, Debug)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn queued(&self, _: &[AppName]) {}
    fn checking(&self, _: &AppName) {}
    fn attempting(&self, _: &AppName, _: BackendKind, _: u32, _: u32) {}
    fn downloading(&self, _: &AppName, _: u64, _: Option<u64>) {}
    fn done(&self, _: &AppName, _: &str) {}
    fn failed(&self, _: &AppName, _: &str) {}
    fn skipped(&self, _: &AppName, _: &str) {}
    fn progress(&self, _: usize, _: usize, _: Option<Duration>) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn status(&self, _: &str) {}
}
