use dirs::home_dir;
use std::path::PathBuf;

/// Returns the rig home directory, or None if the user's home cannot be resolved.
pub fn try_rig_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("RIG_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".rig"))
}

/// Returns the rig home directory (`~/.rig`), or `./.rig` when no home exists.
pub fn rig_home() -> PathBuf {
    try_rig_home().unwrap_or_else(|| PathBuf::from(".rig"))
}

/// Default catalog path: ~/.rig/rig.toml
pub fn config_path() -> PathBuf {
    if let Ok(val) = std::env::var("RIG_CONFIG") {
        return PathBuf::from(val);
    }
    rig_home().join("rig.toml")
}

/// Logs directory: ~/.rig/logs
pub fn log_dir() -> PathBuf {
    rig_home().join("logs")
}

/// Default run log: ~/.rig/logs/rig.log
pub fn default_log_file() -> PathBuf {
    log_dir().join("rig.log")
}

/// Temp path for downloaded installers: ~/.rig/tmp
pub fn tmp_path() -> PathBuf {
    rig_home().join("tmp")
}

/// Extract the filename from a URL, ignoring any query string or fragment.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or("");
    path.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_strips_query() {
        assert_eq!(
            filename_from_url("https://example.com/dl/setup.exe?lang=en"),
            "setup.exe"
        );
        assert_eq!(filename_from_url("https://example.com/"), "");
        assert_eq!(filename_from_url(""), "");
    }
}
