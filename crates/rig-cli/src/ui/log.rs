//! Append-only operator run log.
//!
//! One line per event: `YYYY-MM-DD HH:MM:SS [LEVEL] message`. Every line is a
//! single `write_all` on a file opened in append mode. Any I/O error is
//! swallowed; the log never aborts a run.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Status,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Status => "STATUS",
        })
    }
}

#[derive(Debug)]
pub struct RunLog {
    file: Option<File>,
}

impl RunLog {
    /// Open (or create) `path` for appending. Failure yields a disabled log.
    pub fn open(path: &Path) -> Self {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .inspect_err(|e| tracing::debug!(path = %path.display(), error = %e, "run log disabled"))
            .ok();
        Self { file }
    }

    pub fn write(&mut self, level: LogLevel, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let line = format_line(&chrono::Local::now(), level, message);
        let _ = file.write_all(line.as_bytes());
    }
}

/// Render one log line. Embedded newlines are flattened so a line stays a line.
pub fn format_line<Tz: chrono::TimeZone>(
    at: &chrono::DateTime<Tz>,
    level: LogLevel,
    message: &str,
) -> String
where
    Tz::Offset: fmt::Display,
{
    let message = message.replace(['\r', '\n'], " ");
    format!("{} [{level}] {message}\n", at.format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn line_format() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 5, 17, 9, 3, 7).unwrap();
        assert_eq!(
            format_line(&at, LogLevel::Success, "git: installed via manager-a"),
            "2024-05-17 09:03:07 [SUCCESS] git: installed via manager-a\n"
        );
        assert_eq!(
            format_line(&at, LogLevel::Warning, "two\nlines"),
            "2024-05-17 09:03:07 [WARNING] two lines\n"
        );
    }

    #[test]
    fn appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("rig.log");

        RunLog::open(&path).write(LogLevel::Info, "first");
        RunLog::open(&path).write(LogLevel::Status, "second");

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] first"));
        assert!(lines[1].ends_with("[STATUS] second"));
    }

    #[test]
    fn unwritable_log_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a file.
        let mut log = RunLog::open(dir.path());
        log.write(LogLevel::Info, "dropped");
    }
}
