//! Final run summary: a table for people, a `RESULT` line for scripts.

use comfy_table::{Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use rig_core::{AppReport, AttemptStatus, Disposition, RunResult};
use serde_json::{Value, json};

use crate::ui::{ConsoleReporter, LogLevel};

/// Print the summary and write one log line per application.
pub fn summarize(result: &RunResult, reporter: &ConsoleReporter, color: bool) {
    if result.is_empty() {
        reporter.print("Nothing to do.");
    } else {
        reporter.print(summary_table(result, color).to_string());
    }

    reporter.print(counts(result));

    for report in result.reports() {
        let (level, line) = log_line(report);
        reporter.log(level, line);
    }
    reporter.print(format!("RESULT {}", result_json(result)));
}

/// `2 installed, 3 failed (1 need attention), 1 skipped`.
///
/// Manual downloads count as failed but are not errors the operator must chase.
pub fn counts(result: &RunResult) -> String {
    let failed = result.failed().len();
    let attention = result.operator_errors().count();
    let failed = if attention == failed {
        failed.to_string()
    } else {
        format!("{failed} ({attention} need attention)")
    };
    format!(
        "{} installed, {failed} failed, {} skipped",
        result.successful().len(),
        result.skipped().len()
    )
}

pub fn summary_table(result: &RunResult, color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["App", "Result", "Methods", "Suggestion", "Link"]);

    for report in result.reports() {
        let label = report.disposition.label().to_string();
        let label = if color {
            match report.disposition {
                Disposition::Installed | Disposition::AlreadyInstalled => label.green().to_string(),
                Disposition::Failed => label.red().to_string(),
                Disposition::ManualRequired => label.yellow().to_string(),
                Disposition::Skipped(_) => label.dark_grey().to_string(),
            }
        } else {
            label
        };

        table.add_row(vec![
            Cell::new(report.name.as_str()),
            Cell::new(label),
            Cell::new(methods(report)),
            Cell::new(report.suggestions().join("\n")),
            Cell::new(report.link.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// One line per method; failures carry their error text.
fn methods(report: &AppReport) -> String {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|o| match o.status {
            AttemptStatus::Succeeded => format!("{}: ok ({} attempt(s))", o.backend, o.attempts),
            AttemptStatus::Failed => format!("{}: {} ({} attempt(s))", o.backend, o.detail, o.attempts),
            AttemptStatus::Skipped => format!("{}: {}", o.backend, o.detail),
        })
        .collect();
    if let Some(error) = &report.error {
        lines.push(error.to_string());
    }
    lines.join("\n")
}

fn log_line(report: &AppReport) -> (LogLevel, String) {
    let name = &report.name;
    match &report.disposition {
        Disposition::Installed => (LogLevel::Success, format!("{name}: installed")),
        Disposition::AlreadyInstalled => (LogLevel::Info, format!("{name}: already installed")),
        Disposition::Skipped(reason) => (LogLevel::Info, format!("{name}: skipped ({reason})")),
        Disposition::ManualRequired => (
            LogLevel::Warning,
            format!(
                "{name}: manual download required{}",
                report
                    .link
                    .as_deref()
                    .map(|l| format!(" at {l}"))
                    .unwrap_or_default()
            ),
        ),
        Disposition::Failed => (
            LogLevel::Warning,
            format!("{name}: failed ({})", report.errors().join("; ")),
        ),
    }
}

/// Machine-readable summary.
pub fn result_json(result: &RunResult) -> Value {
    let apps: serde_json::Map<String, Value> = result
        .reports()
        .map(|r| {
            let value = json!({
                "result": r.disposition.label(),
                "errors": r.errors(),
                "suggestions": r.suggestions(),
                "link": r.link,
                "elapsed_secs": r.elapsed.map(|d| d.as_secs_f64()),
            });
            (r.name.to_string(), value)
        })
        .collect();

    json!({
        "successful": result.successful(),
        "failed": result.failed(),
        "skipped": result.skipped(),
        "needs_attention": result.operator_errors().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "apps": apps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_core::FailureReason;
    use rig_schema::AppName;

    fn sample() -> RunResult {
        let mut result = RunResult::new();
        result.record_failure(
            AppName::new("steam"),
            FailureReason::AccessDenied,
            Some("https://store.example.com/about".into()),
        );
        result.record_skipped(AppName::new("vlc"), "not selected");
        result
    }

    #[test]
    fn table_lists_every_app_with_advice() {
        let text = summary_table(&sample(), false).to_string();
        assert!(text.contains("steam"));
        assert!(text.contains("access denied"));
        assert!(text.contains("elevated"));
        assert!(text.contains("https://store.example.com/about"));
        assert!(text.contains("vlc"));
        assert!(text.contains("not selected"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn json_partitions_names() {
        let value = result_json(&sample());
        assert_eq!(value["failed"], json!(["steam"]));
        assert_eq!(value["skipped"], json!(["vlc"]));
        assert_eq!(value["successful"], json!([]));
        assert_eq!(value["apps"]["steam"]["result"], "failed");
        assert_eq!(value["apps"]["steam"]["errors"], json!(["access denied"]));
        assert_eq!(value["apps"]["vlc"]["link"], Value::Null);
    }

    #[test]
    fn manual_downloads_are_not_counted_as_errors() {
        let mut result = sample();
        result.record_failure(
            AppName::new("visual-studio"),
            FailureReason::ManualActionRequired { url: None },
            None,
        );
        assert_eq!(
            counts(&result),
            "0 installed, 2 failed (1 need attention), 1 skipped"
        );
        assert_eq!(counts(&sample()), "0 installed, 1 failed, 1 skipped");
        assert_eq!(result_json(&result)["needs_attention"], json!(["steam"]));
    }

    #[test]
    fn log_lines_carry_level_and_errors() {
        let result = sample();
        let (level, line) = log_line(result.report("steam").unwrap());
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(line, "steam: failed (access denied)");

        let (level, line) = log_line(result.report("vlc").unwrap());
        assert_eq!(level, LogLevel::Info);
        assert_eq!(line, "vlc: skipped (not selected)");
    }
}
