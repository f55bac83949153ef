//! Test doubles for the process and reporter seams.
//!
//! Compiled for this crate's unit tests and, behind the `testing` feature,
//! for the tests of crates built on top of it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rig_schema::{AppName, Settings};

use crate::backend::BackendKind;
use crate::context::{Context, RunOptions};
use crate::presence::PresenceChecker;
use crate::process::{CommandRunner, ProcessError, ProcessOutput};
use crate::reporter::Reporter;

/// A runner that replays scripted exit codes per program.
///
/// Programs are matched by their full string first, then by file name, so
/// downloaded installers (which live in a random temp dir) can be scripted
/// by their artifact name. The last scripted output repeats forever.
/// Unscripted programs fail to spawn.
#[derive(Default)]
pub struct ScriptedRunner {
    available: Mutex<HashSet<String>>,
    /// program -> client that becomes available once it exits 0
    installs: HashMap<String, String>,
    scripts: Mutex<HashMap<String, VecDeque<ProcessOutput>>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    delay: Duration,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn available(self, program: &str) -> Self {
        self.available.lock().unwrap().insert(program.to_string());
        self
    }

    /// `client` shows up on `PATH` once `program` exits 0.
    pub fn appears_after(mut self, program: &str, client: &str) -> Self {
        self.installs.insert(program.to_string(), client.to_string());
        self
    }

    pub fn exits(self, program: &str, codes: &[i32]) -> Self {
        let outputs = codes.iter().map(|c| ProcessOutput::with_code(*c)).collect();
        self.scripts
            .lock()
            .unwrap()
            .insert(program.to_string(), outputs);
        self
    }

    pub fn prints(self, program: &str, stdout: &str) -> Self {
        let output = ProcessOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        self.scripts
            .lock()
            .unwrap()
            .insert(program.to_string(), VecDeque::from([output]));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == program || file_name(p) == program)
            .count()
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_output(&self, program: &str) -> Option<ProcessOutput> {
        let mut scripts = self.scripts.lock().unwrap();
        let key = if scripts.contains_key(program) {
            program.to_string()
        } else {
            file_name(program).to_string()
        };
        let queue = scripts.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn file_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program)
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let output = self.next_output(program).ok_or_else(|| ProcessError::Spawn {
            program: program.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        if output.success() {
            if let Some(client) = self.installs.get(program) {
                self.available.lock().unwrap().insert(client.clone());
            }
        }
        Ok(output)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.available
            .lock()
            .unwrap()
            .contains(program)
            .then(|| PathBuf::from(program))
    }
}

/// Records every reporter call as a line of text.
///
/// Also tracks how many pipelines are between `checking` and their terminal
/// event (`done`, `failed` or `skipped`) at once.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    fn started(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
    }

    fn ended(&self) {
        let _ = self
            .running
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.push(format!("section {title}"));
    }
    fn queued(&self, apps: &[AppName]) {
        self.push(format!("queued {}", apps.len()));
    }
    fn checking(&self, name: &AppName) {
        self.started();
        self.push(format!("checking {name}"));
    }
    fn attempting(&self, name: &AppName, backend: BackendKind, attempt: u32, max: u32) {
        self.push(format!("attempt {name} {backend} {attempt}/{max}"));
    }
    fn downloading(&self, _: &AppName, _: u64, _: Option<u64>) {}
    fn done(&self, name: &AppName, detail: &str) {
        self.ended();
        self.push(format!("done {name} {detail}"));
    }
    fn failed(&self, name: &AppName, reason: &str) {
        self.ended();
        self.push(format!("failed {name} {reason}"));
    }
    fn skipped(&self, name: &AppName, reason: &str) {
        self.ended();
        self.push(format!("skipped {name} {reason}"));
    }
    fn progress(&self, completed: usize, total: usize, _: Option<Duration>) {
        self.push(format!("progress {completed}/{total}"));
    }
    fn info(&self, msg: &str) {
        self.push(format!("info {msg}"));
    }
    fn success(&self, msg: &str) {
        self.push(format!("success {msg}"));
    }
    fn warning(&self, msg: &str) {
        self.push(format!("warning {msg}"));
    }
    fn status(&self, msg: &str) {
        self.push(format!("status {msg}"));
    }
}

/// Settings with millisecond backoff so retry scenarios run fast.
pub fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    for policy in [
        &mut settings.retry.manager,
        &mut settings.retry.download,
        &mut settings.retry.bootstrap,
    ] {
        policy.initial_delay_ms = 1;
        policy.max_delay_ms = 2;
    }
    settings.download_timeout_secs = 5;
    settings
}

/// A context wired to the given doubles, with no uninstall-entry sources.
pub fn test_context(
    runner: Arc<ScriptedRunner>,
    reporter: Arc<dyn Reporter>,
    settings: Settings,
    tmp_dir: &Path,
) -> Context {
    let presence = PresenceChecker::with_sources(runner.clone(), Vec::new());
    Context::new(settings, runner, reporter, RunOptions::default())
        .expect("http client")
        .with_presence(presence)
        .with_tmp_dir(tmp_dir.to_path_buf())
}
