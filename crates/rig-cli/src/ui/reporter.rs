//! `Reporter` implementation that forwards everything to the UI actor.

use std::sync::mpsc;
use std::time::Duration;

use rig_core::{BackendKind, Reporter};
use rig_schema::AppName;

use super::actor::UiEvent;
use super::log::LogLevel;

#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    sender: mpsc::Sender<UiEvent>,
}

impl ConsoleReporter {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: UiEvent) {
        // The actor only goes away at shutdown; late events are dropped.
        let _ = self.sender.send(event);
    }

    /// Write a line to the run log without printing it.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.send(UiEvent::Log {
            level,
            message: message.into(),
        });
    }

    /// Print pre-rendered text.
    pub fn print(&self, text: impl Into<String>) {
        self.send(UiEvent::Print(text.into()));
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        self.send(UiEvent::Section(title.to_string()));
    }

    fn queued(&self, apps: &[AppName]) {
        self.send(UiEvent::Queued(apps.to_vec()));
    }

    fn checking(&self, name: &AppName) {
        self.send(UiEvent::Checking(name.clone()));
    }

    fn attempting(&self, name: &AppName, backend: BackendKind, attempt: u32, max_attempts: u32) {
        self.send(UiEvent::Attempting {
            name: name.clone(),
            backend,
            attempt,
            max: max_attempts,
        });
    }

    fn downloading(&self, name: &AppName, current: u64, total: Option<u64>) {
        self.send(UiEvent::Downloading {
            name: name.clone(),
            current,
            total,
        });
    }

    fn done(&self, name: &AppName, detail: &str) {
        self.send(UiEvent::Done {
            name: name.clone(),
            detail: detail.to_string(),
        });
    }

    fn failed(&self, name: &AppName, reason: &str) {
        self.send(UiEvent::Failed {
            name: name.clone(),
            reason: reason.to_string(),
        });
    }

    fn skipped(&self, name: &AppName, reason: &str) {
        self.send(UiEvent::Skipped {
            name: name.clone(),
            reason: reason.to_string(),
        });
    }

    fn progress(&self, completed: usize, total: usize, remaining: Option<Duration>) {
        self.send(UiEvent::Progress {
            completed,
            total,
            remaining,
        });
    }

    fn info(&self, msg: &str) {
        self.send(UiEvent::Info(msg.to_string()));
    }

    fn success(&self, msg: &str) {
        self.send(UiEvent::Success(msg.to_string()));
    }

    fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }

    fn status(&self, msg: &str) {
        self.send(UiEvent::Status(msg.to_string()));
    }
}
