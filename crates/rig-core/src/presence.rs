//! Already-installed detection.
//!
//! Strategy, first positive wins:
//!
//! 1. Run each configured probe command. A probe passes when it prints
//!    something that is not a known "not installed" message. Probe errors
//!    (missing executable, timeout) count as a miss.
//! 2. Scan the platform's uninstall entries for a display name containing the
//!    application's name.
//!
//! The checker is read-only and safe to call concurrently.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rig_schema::ApplicationSpec;

use crate::process::CommandRunner;

/// Probes are diagnostics, not installs; they never run unbounded.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

const NEGATIVE_PATTERNS: &[&str] = &[
    "not recognized",
    "not found",
    "no installed package",
    "is not installed",
    "no such file",
];

/// Where installed applications register themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallSource {
    /// A Windows registry key whose subkeys carry a `DisplayName` value.
    RegistryKey(String),
    /// A directory whose entry names are application names (`.app`, `.desktop`).
    Directory(PathBuf),
}

impl UninstallSource {
    /// The well-known locations for the current platform.
    pub fn platform_defaults() -> Vec<Self> {
        if cfg!(windows) {
            [
                r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
                r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
                r"HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
            ]
            .into_iter()
            .map(|k| Self::RegistryKey(k.to_string()))
            .collect()
        } else if cfg!(target_os = "macos") {
            let mut dirs = vec![Self::Directory(PathBuf::from("/Applications"))];
            if let Some(home) = dirs::home_dir() {
                dirs.push(Self::Directory(home.join("Applications")));
            }
            dirs
        } else {
            let mut dirs = vec![
                Self::Directory(PathBuf::from("/usr/share/applications")),
                Self::Directory(PathBuf::from("/usr/local/share/applications")),
            ];
            if let Some(data) = dirs::data_dir() {
                dirs.push(Self::Directory(data.join("applications")));
            }
            dirs
        }
    }
}

pub struct PresenceChecker {
    runner: Arc<dyn CommandRunner>,
    sources: Vec<UninstallSource>,
}

impl std::fmt::Debug for PresenceChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceChecker")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl PresenceChecker {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_sources(runner, UninstallSource::platform_defaults())
    }

    pub fn with_sources(runner: Arc<dyn CommandRunner>, sources: Vec<UninstallSource>) -> Self {
        Self { runner, sources }
    }

    pub async fn is_installed(&self, app: &ApplicationSpec) -> bool {
        for probe in &app.presence_probes {
            if self.probe_passes(probe).await {
                tracing::debug!(app = %app.name, ?probe, "presence probe passed");
                return true;
            }
        }

        for source in &self.sources {
            if self.source_lists(source, &app.name).await {
                tracing::debug!(app = %app.name, ?source, "found uninstall entry");
                return true;
            }
        }

        false
    }

    async fn probe_passes(&self, probe: &[String]) -> bool {
        let Some((program, args)) = probe.split_first() else {
            return false;
        };
        match self.runner.run(program, args, Some(PROBE_TIMEOUT)).await {
            Ok(output) => output_indicates_presence(&output.combined()),
            Err(e) => {
                tracing::trace!(program, error = %e, "probe did not run");
                false
            }
        }
    }

    async fn source_lists(&self, source: &UninstallSource, name: &str) -> bool {
        let entries = match source {
            UninstallSource::RegistryKey(key) => self.registry_display_names(key).await,
            UninstallSource::Directory(dir) => directory_entry_names(dir).await,
        };
        entries.iter().any(|entry| display_name_matches(entry, name))
    }

    async fn registry_display_names(&self, key: &str) -> Vec<String> {
        let args = ["query", key, "/s", "/v", "DisplayName"].map(String::from);
        match self.runner.run("reg", &args, Some(PROBE_TIMEOUT)).await {
            Ok(output) => parse_registry_display_names(&output.stdout),
            Err(_) => Vec::new(),
        }
    }
}

/// Non-empty output that is not a known negative result.
pub fn output_indicates_presence(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    !NEGATIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Case- and punctuation-insensitive substring match.
pub fn display_name_matches(display_name: &str, app_name: &str) -> bool {
    let needle = squash(app_name);
    !needle.is_empty() && squash(display_name).contains(&needle)
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == '+')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Extract `DisplayName` values from `reg query ... /v DisplayName` output.
pub fn parse_registry_display_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if !line.starts_with("DisplayName") {
                return None;
            }
            line.split_once("REG_SZ")
                .map(|(_, value)| value.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .collect()
}

async fn directory_entry_names(dir: &std::path::Path) -> Vec<String> {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return Vec::new();
    };
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    fn app_with_probes(name: &str, probes: &[&[&str]]) -> ApplicationSpec {
        ApplicationSpec {
            presence_probes: probes
                .iter()
                .map(|p| p.iter().map(|s| (*s).to_string()).collect())
                .collect(),
            ..ApplicationSpec::new(name)
        }
    }

    #[test]
    fn negative_patterns_are_rejected() {
        assert!(output_indicates_presence("git version 2.45.1"));
        assert!(!output_indicates_presence("   "));
        assert!(!output_indicates_presence(
            "'code' is not recognized as an internal or external command"
        ));
        assert!(!output_indicates_presence(
            "No installed package found matching input criteria."
        ));
    }

    #[test]
    fn parses_registry_output() {
        let output = r"
HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\7-Zip
    DisplayName    REG_SZ    7-Zip 24.08 (x64)

HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\Git_is1
    DisplayName    REG_SZ    Git

End of search: 2 match(es) found.
";
        assert_eq!(
            parse_registry_display_names(output),
            vec!["7-Zip 24.08 (x64)", "Git"]
        );
    }

    #[test]
    fn display_names_match_loosely() {
        assert!(display_name_matches("7-Zip 24.08 (x64)", "7zip"));
        assert!(display_name_matches(
            "Microsoft Visual Studio Community 2022",
            "visual-studio"
        ));
        assert!(display_name_matches("Notepad++ (64-bit x64)", "notepad++"));
        assert!(!display_name_matches("Mozilla Thunderbird", "firefox"));
        assert!(!display_name_matches("anything", "--"));
    }

    #[tokio::test]
    async fn first_passing_probe_wins() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .prints("py", "Python 3.12.4")
                .prints("python", "Python was not found; run without arguments to install"),
        );
        let checker = PresenceChecker::with_sources(runner.clone(), Vec::new());
        let app = app_with_probes("python", &[&["python", "--version"], &["py", "--version"]]);

        assert!(checker.is_installed(&app).await);
        assert_eq!(runner.calls_to("python"), 1);
        assert_eq!(runner.calls_to("py"), 1);
    }

    #[tokio::test]
    async fn probe_errors_are_misses() {
        let runner = Arc::new(ScriptedRunner::new());
        let checker = PresenceChecker::with_sources(runner, Vec::new());
        let app = app_with_probes("code", &[&["code", "--version"], &[]]);
        assert!(!checker.is_installed(&app).await);
    }

    #[tokio::test]
    async fn falls_back_to_uninstall_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("firefox.desktop"), "").unwrap();

        let runner = Arc::new(ScriptedRunner::new());
        let checker = PresenceChecker::with_sources(
            runner,
            vec![UninstallSource::Directory(dir.path().to_path_buf())],
        );

        assert!(checker.is_installed(&ApplicationSpec::new("Firefox")).await);
        assert!(!checker.is_installed(&ApplicationSpec::new("vlc")).await);
    }

    #[tokio::test]
    async fn scans_registry_keys_through_the_runner() {
        let runner = Arc::new(ScriptedRunner::new().prints(
            "reg",
            "    DisplayName    REG_SZ    VLC media player\n",
        ));
        let checker = PresenceChecker::with_sources(
            runner.clone(),
            vec![UninstallSource::RegistryKey(r"HKCU\Software\Uninstall".into())],
        );
        assert!(checker.is_installed(&ApplicationSpec::new("vlc")).await);
        assert_eq!(runner.calls_to("reg"), 1);
    }
}
