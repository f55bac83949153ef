//! Environment checks run before anything is installed.
//!
//! Missing administrator rights is fatal. Everything else (OS version, free
//! disk, free memory, network) is advisory: reported, and the operator
//! decides whether to continue.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use rig_core::CommandRunner;
use rig_schema::PreflightSettings;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

static VERSION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)+|\d+").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed(String),
    Advisory(String),
    /// The check could not be performed on this platform.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus) -> Self {
        Self { name, status }
    }

    pub fn is_advisory(&self) -> bool {
        matches!(self.status, CheckStatus::Advisory(_))
    }
}

/// Whether the current process has administrator (root) rights.
pub async fn is_elevated(runner: &dyn CommandRunner) -> bool {
    if cfg!(windows) {
        // `net session` only succeeds from an elevated shell.
        let args = ["session".to_string()];
        runner
            .run("net", &args, Some(PROBE_TIMEOUT))
            .await
            .is_ok_and(|o| o.success())
    } else {
        let args = ["-u".to_string()];
        runner
            .run("id", &args, Some(PROBE_TIMEOUT))
            .await
            .is_ok_and(|o| o.success() && o.stdout.trim() == "0")
    }
}

/// Run every advisory check.
pub async fn run_checks(
    runner: &dyn CommandRunner,
    client: &reqwest::Client,
    settings: &PreflightSettings,
) -> Vec<CheckResult> {
    vec![
        check_os_version(runner, settings.min_os_version.as_deref()).await,
        check_disk(runner, settings.min_free_disk_gb).await,
        check_memory(runner, settings.min_free_memory_mb).await,
        check_network(client, &settings.network_probe_url).await,
    ]
}

async fn capture(runner: &dyn CommandRunner, program: &str, args: &[&str]) -> Option<String> {
    let args: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();
    match runner.run(program, &args, Some(PROBE_TIMEOUT)).await {
        Ok(out) if out.success() => Some(out.stdout),
        Ok(out) => {
            tracing::debug!(program, code = ?out.code, "preflight probe failed");
            None
        }
        Err(e) => {
            tracing::debug!(program, error = %e, "preflight probe did not run");
            None
        }
    }
}

pub async fn check_os_version(runner: &dyn CommandRunner, minimum: Option<&str>) -> CheckResult {
    const NAME: &str = "OS version";
    let Some(minimum) = minimum else {
        return CheckResult::new(NAME, CheckStatus::Skipped("no minimum configured".into()));
    };

    let output = if cfg!(windows) {
        capture(runner, "cmd", &["/C", "ver"]).await
    } else if cfg!(target_os = "macos") {
        capture(runner, "sw_vers", &["-productVersion"]).await
    } else {
        capture(runner, "uname", &["-r"]).await
    };

    let Some(actual) = output.as_deref().and_then(parse_version) else {
        return CheckResult::new(NAME, CheckStatus::Skipped("could not determine the OS version".into()));
    };
    let Some(required) = parse_version(minimum) else {
        return CheckResult::new(NAME, CheckStatus::Skipped(format!("invalid minimum '{minimum}'")));
    };

    let shown = join_version(&actual);
    let status = if version_at_least(&actual, &required) {
        CheckStatus::Passed(shown)
    } else {
        CheckStatus::Advisory(format!("{shown} is older than the required {minimum}"))
    };
    CheckResult::new(NAME, status)
}

pub async fn check_disk(runner: &dyn CommandRunner, min_gb: u64) -> CheckResult {
    const NAME: &str = "Free disk";
    let free_bytes = if cfg!(windows) {
        capture(
            runner,
            "powershell",
            &["-NoProfile", "-Command", "(Get-PSDrive -Name $env:SystemDrive[0]).Free"],
        )
        .await
        .and_then(|s| s.trim().parse::<u64>().ok())
    } else {
        capture(runner, "df", &["-Pk", "/"])
            .await
            .as_deref()
            .and_then(parse_df_available_kb)
            .map(|kb| kb * 1024)
    };

    let Some(free) = free_bytes else {
        return CheckResult::new(NAME, CheckStatus::Skipped("could not determine free disk space".into()));
    };
    let free_gb = free / (1024 * 1024 * 1024);
    let status = if free_gb >= min_gb {
        CheckStatus::Passed(format!("{free_gb} GB free"))
    } else {
        CheckStatus::Advisory(format!("only {free_gb} GB free, {min_gb} GB recommended"))
    };
    CheckResult::new(NAME, status)
}

pub async fn check_memory(runner: &dyn CommandRunner, min_mb: u64) -> CheckResult {
    const NAME: &str = "Free memory";
    let free_kb = if cfg!(windows) {
        capture(
            runner,
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "(Get-CimInstance Win32_OperatingSystem).FreePhysicalMemory",
            ],
        )
        .await
        .and_then(|s| s.trim().parse::<u64>().ok())
    } else {
        tokio::fs::read_to_string("/proc/meminfo")
            .await
            .ok()
            .as_deref()
            .and_then(parse_meminfo_available_kb)
    };

    let Some(kb) = free_kb else {
        return CheckResult::new(NAME, CheckStatus::Skipped("could not determine free memory".into()));
    };
    let free_mb = kb / 1024;
    let status = if free_mb >= min_mb {
        CheckStatus::Passed(format!("{free_mb} MB free"))
    } else {
        CheckStatus::Advisory(format!("only {free_mb} MB free, {min_mb} MB recommended"))
    };
    CheckResult::new(NAME, status)
}

pub async fn check_network(client: &reqwest::Client, url: &str) -> CheckResult {
    const NAME: &str = "Network";
    let status = match client.head(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_server_error() => {
            CheckStatus::Advisory(format!("{url} answered {}", resp.status()))
        }
        Ok(_) => CheckStatus::Passed(format!("{url} reachable")),
        Err(e) => CheckStatus::Advisory(format!("{url} unreachable: {e}")),
    };
    CheckResult::new(NAME, status)
}

/// First dotted number in `text` (e.g. `10.0.19045` from `ver` output).
pub fn parse_version(text: &str) -> Option<Vec<u64>> {
    let re = VERSION_RE.as_ref()?;
    let m = re.find(text)?;
    m.as_str().split('.').map(|p| p.parse().ok()).collect()
}

fn join_version(parts: &[u64]) -> String {
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Component-wise comparison; missing components count as zero.
pub fn version_at_least(actual: &[u64], required: &[u64]) -> bool {
    let len = actual.len().max(required.len());
    for i in 0..len {
        let a = actual.get(i).copied().unwrap_or(0);
        let r = required.get(i).copied().unwrap_or(0);
        if a != r {
            return a > r;
        }
    }
    true
}

/// `Available` column of POSIX `df -Pk` output.
pub fn parse_df_available_kb(output: &str) -> Option<u64> {
    output.lines().nth(1)?.split_whitespace().nth(3)?.parse().ok()
}

pub fn parse_meminfo_available_kb(text: &str) -> Option<u64> {
    text.lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_core::testing::ScriptedRunner;

    #[test]
    fn versions() {
        assert_eq!(
            parse_version("Microsoft Windows [Version 10.0.19045.3803]"),
            Some(vec![10, 0, 19045, 3803])
        );
        assert_eq!(parse_version("6.8.0-45-generic"), Some(vec![6, 8, 0]));
        assert_eq!(parse_version("14"), Some(vec![14]));
        assert_eq!(parse_version("no digits"), None);

        assert!(version_at_least(&[10, 0, 19045], &[10, 0, 17763]));
        assert!(version_at_least(&[10, 0], &[10, 0, 0]));
        assert!(!version_at_least(&[6, 1], &[10]));
    }

    #[test]
    fn df_output() {
        let out = "Filesystem     1024-blocks      Used Available Capacity Mounted on\n\
                   /dev/nvme0n1p2   490617784 201234567 264383217      44% /\n";
        assert_eq!(parse_df_available_kb(out), Some(264_383_217));
        assert_eq!(parse_df_available_kb("garbage"), None);
    }

    #[test]
    fn meminfo() {
        let text = "MemTotal:       32589612 kB\nMemFree:         1234567 kB\nMemAvailable:   20480000 kB\n";
        assert_eq!(parse_meminfo_available_kb(text), Some(20_480_000));
        assert_eq!(parse_meminfo_available_kb("MemTotal: 1 kB"), None);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn root_is_detected_through_id() {
        let root = ScriptedRunner::new().prints("id", "0\n");
        assert!(is_elevated(&root).await);

        let user = ScriptedRunner::new().prints("id", "1000\n");
        assert!(!is_elevated(&user).await);

        assert!(!is_elevated(&ScriptedRunner::new()).await);
    }

    #[tokio::test]
    #[cfg(all(unix, not(target_os = "macos")))]
    async fn old_kernel_is_advisory() {
        let runner = ScriptedRunner::new().prints("uname", "4.19.0-generic\n");
        let result = check_os_version(&runner, Some("5.10")).await;
        assert!(result.is_advisory());

        let result = check_os_version(&runner, Some("4.4")).await;
        assert_eq!(result.status, CheckStatus::Passed("4.19.0".into()));

        let result = check_os_version(&runner, None).await;
        assert!(matches!(result.status, CheckStatus::Skipped(_)));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn low_disk_is_advisory() {
        let out = "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
                   /dev/sda1 100000000 99000000 1048576 99% /\n";
        let runner = ScriptedRunner::new().prints("df", out);
        let result = check_disk(&runner, 10).await;
        assert_eq!(
            result.status,
            CheckStatus::Advisory("only 1 GB free, 10 GB recommended".into())
        );
        assert!(!check_disk(&runner, 1).await.is_advisory());
    }

    #[tokio::test]
    async fn network_probe() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("HEAD", "/").with_status(200).create_async().await;
        let client = reqwest::Client::new();

        let result = check_network(&client, &server.url()).await;
        assert!(matches!(result.status, CheckStatus::Passed(_)));

        let result = check_network(&client, "http://127.0.0.1:9").await;
        assert!(result.is_advisory());
    }
}
