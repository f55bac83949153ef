//! UI Actor - Single-threaded event processing
//!
//! All console output and every run-log line go through one thread. Parallel
//! pipelines only send events; they never touch stdout or the log file, so
//! lines cannot tear or interleave.
use super::log::{LogLevel, RunLog};
use crossterm::style::Stylize;
use rig_core::BackendKind;
use rig_schema::AppName;
use std::collections::HashMap;
use std::io::Write;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const NAME_WIDTH: usize = 20;

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    /// Print a section header
    Section(String),
    /// Applications about to be processed
    Queued(Vec<AppName>),
    /// Presence check started
    Checking(AppName),
    /// A backend attempt started
    Attempting {
        name: AppName,
        backend: BackendKind,
        attempt: u32,
        max: u32,
    },
    /// Installer download progress
    Downloading {
        name: AppName,
        current: u64,
        total: Option<u64>,
    },
    /// Application installed
    Done { name: AppName, detail: String },
    /// Application failed
    Failed { name: AppName, reason: String },
    /// Application not installed by this run
    Skipped { name: AppName, reason: String },
    /// Sequential progress
    Progress {
        completed: usize,
        total: usize,
        remaining: Option<Duration>,
    },
    Info(String),
    Success(String),
    Warning(String),
    Status(String),
    /// Write to the run log only
    Log { level: LogLevel, message: String },
    /// Print pre-rendered text (tables, machine-readable lines) as is
    Print(String),
    /// Synchronize UI state (wait for all pending renders)
    Sync(tokio::sync::oneshot::Sender<()>),
    /// Shutdown the actor
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl UiActor {
    /// Spawn a new UI actor thread that owns `log`.
    pub fn spawn(log: RunLog) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || run_event_loop(&receiver, log));
        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }

    /// Wait until every event sent so far has been rendered.
    pub async fn sync(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if self.sender.send(UiEvent::Sync(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Main event loop for the UI actor
fn run_event_loop(receiver: &mpsc::Receiver<UiEvent>, mut log: RunLog) {
    let mut downloads: HashMap<AppName, u64> = HashMap::new();
    let mut stdout = std::io::stdout();

    while let Ok(event) = receiver.recv() {
        match event {
            UiEvent::Section(title) => {
                println!();
                println!("{}", title.as_str().bold());
                log.write(LogLevel::Status, &format!("=== {title} ==="));
            }
            UiEvent::Queued(names) => {
                let msg = format!("{} application(s) queued", names.len());
                println!("  {}", msg.as_str().dark_grey());
                log.write(LogLevel::Status, &msg);
            }
            UiEvent::Checking(name) => {
                println!("  {} {}", pad(&name), "checking".dark_grey());
            }
            UiEvent::Attempting {
                name,
                backend,
                attempt,
                max,
            } => {
                let msg = format!("{backend} attempt {attempt}/{max}");
                println!("  {} {}", pad(&name), msg.as_str().cyan());
                log.write(LogLevel::Info, &format!("{name}: {msg}"));
            }
            UiEvent::Downloading {
                name,
                current,
                total,
            } => {
                let step = download_step(current, total);
                if downloads.get(&name) != Some(&step) {
                    downloads.insert(name.clone(), step);
                    let msg = format_download(current, total);
                    println!("  {} {}", pad(&name), msg.as_str().dark_grey());
                }
            }
            UiEvent::Done { name, detail } => {
                downloads.remove(&name);
                println!("  {} {} {}", "✓".green(), pad(&name).green().bold(), detail);
                log.write(LogLevel::Success, &format!("{name}: {detail}"));
            }
            UiEvent::Failed { name, reason } => {
                downloads.remove(&name);
                println!("  {} {} {}", "✗".red(), pad(&name).red().bold(), reason);
                log.write(LogLevel::Warning, &format!("{name}: {reason}"));
            }
            UiEvent::Skipped { name, reason } => {
                println!("  {} {} {}", "-".dark_grey(), pad(&name), reason.as_str().dark_grey());
                log.write(LogLevel::Info, &format!("{name}: {reason}"));
            }
            UiEvent::Progress {
                completed,
                total,
                remaining,
            } => {
                let msg = match remaining {
                    Some(eta) => format!("[{completed}/{total}] about {} remaining", format_eta(eta)),
                    None => format!("[{completed}/{total}]"),
                };
                println!("  {}", msg.as_str().dark_grey());
                log.write(LogLevel::Status, &msg);
            }
            UiEvent::Info(msg) => {
                println!("  {} {msg}", "ℹ".blue());
                log.write(LogLevel::Info, &msg);
            }
            UiEvent::Success(msg) => {
                println!("  {} {}", "✓".green(), msg.as_str().green());
                log.write(LogLevel::Success, &msg);
            }
            UiEvent::Warning(msg) => {
                println!("  {} {}", "!".yellow().bold(), msg.as_str().yellow());
                log.write(LogLevel::Warning, &msg);
            }
            UiEvent::Status(msg) => {
                println!("  {}", msg.as_str().bold());
                log.write(LogLevel::Status, &msg);
            }
            UiEvent::Log { level, message } => log.write(level, &message),
            UiEvent::Print(text) => println!("{text}"),
            UiEvent::Sync(tx) => {
                let _ = stdout.flush();
                let _ = tx.send(());
            }
            UiEvent::Shutdown => break,
        }
    }
    let _ = stdout.flush();
}

fn pad(name: &AppName) -> String {
    format!("{:<width$}", name.as_str(), width = NAME_WIDTH)
}

/// Quartile bucket for a download, so the console prints at most five lines.
fn download_step(current: u64, total: Option<u64>) -> u64 {
    match total.filter(|&t| t > 0) {
        Some(t) => (current.min(t) * 4) / t,
        None => u64::from(current > 0),
    }
}

pub fn format_download(current: u64, total: Option<u64>) -> String {
    match total.filter(|&t| t > 0) {
        Some(t) if current >= t => format!("downloaded {}", format_size(t)),
        Some(t) => format!("downloading {} / {}", format_size(current), format_size(t)),
        None if current == 0 => "downloading".to_string(),
        None => format!("downloading {}", format_size(current)),
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB * KB {
        format!("{:.1} GB", b / (KB * KB * KB))
    } else if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.0} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

pub fn format_eta(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s:02}s"),
        (h, m, _) => format!("{h}h {m:02}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_formatting() {
        assert_eq!(format_eta(Duration::from_secs(42)), "42s");
        assert_eq!(format_eta(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_eta(Duration::from_secs(3 * 3600 + 7 * 60 + 9)), "3h 07m");
    }

    #[test]
    fn download_formatting() {
        assert_eq!(format_download(0, None), "downloading");
        assert_eq!(
            format_download(512 * 1024, Some(2 * 1024 * 1024)),
            "downloading 512 KB / 2.0 MB"
        );
        assert_eq!(format_download(2048, Some(2048)), "downloaded 2 KB");
    }

    #[test]
    fn download_steps_are_quartiles() {
        assert_eq!(download_step(0, Some(100)), 0);
        assert_eq!(download_step(30, Some(100)), 1);
        assert_eq!(download_step(100, Some(100)), 4);
        assert_eq!(download_step(5, None), 1);
    }

    #[test]
    fn actor_writes_the_log_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.log");
        let actor = UiActor::spawn(RunLog::open(&path));
        let sender = actor.sender();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = sender.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        let _ = sender.send(UiEvent::Log {
                            level: LogLevel::Info,
                            message: format!("worker {i} line {j}"),
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        drop(actor);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 100);
        assert!(text.lines().all(|l| l.contains(" [INFO] worker ")));
    }
}
