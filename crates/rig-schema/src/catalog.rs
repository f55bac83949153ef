//! The application catalog.
//!
//! A catalog file is TOML with an optional `[settings]` table and an ordered
//! list of `[[app]]` entries:
//!
//! ```toml
//! [settings]
//! mode = "parallel"
//! max_parallel = 3
//!
//! [[app]]
//! name = "git"
//! category = "Development"
//! manager_a_id = "Git.Git"
//! manager_b_id = "git"
//! presence_probes = [["git", "--version"]]
//! ```
//!
//! Entry order is preserved; it is the order used by sequential runs.

use crate::hash::Sha256Digest;
use crate::settings::Settings;
use crate::types::AppName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Errors raised while loading a catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog is not valid TOML or does not match the schema.
    #[error("Invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Immutable descriptor of one installable application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationSpec {
    /// Unique catalog key.
    pub name: AppName,
    /// Display grouping.
    #[serde(default = "default_category")]
    pub category: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Identifier for the primary package manager.
    #[serde(default)]
    pub manager_a_id: Option<String>,
    /// Identifier for the secondary package manager.
    #[serde(default)]
    pub manager_b_id: Option<String>,
    /// Installer download location.
    #[serde(default)]
    pub direct_url: Option<String>,
    /// Fallback download location tried once when `direct_url` fails.
    #[serde(default)]
    pub alternate_url: Option<String>,
    /// Expected SHA256 of the downloaded installer.
    #[serde(default)]
    pub expected_hash: Option<Sha256Digest>,
    /// Commands whose output indicates the application is installed.
    #[serde(default)]
    pub presence_probes: Vec<Vec<String>>,
    /// Flags passed to a downloaded installer for an unattended install.
    #[serde(default = "default_silent_args")]
    pub silent_args: Vec<String>,
    /// Never install automatically; the operator must download it by hand.
    #[serde(default)]
    pub manual: bool,
    /// Vendor page for manual downloads.
    #[serde(default)]
    pub manual_url: Option<String>,
}

fn default_category() -> String {
    "Other".to_string()
}

fn default_silent_args() -> Vec<String> {
    vec!["/S".to_string()]
}

impl ApplicationSpec {
    /// A bare entry with no backends configured.
    pub fn new(name: impl Into<AppName>) -> Self {
        Self {
            name: name.into(),
            category: default_category(),
            description: String::new(),
            manager_a_id: None,
            manager_b_id: None,
            direct_url: None,
            alternate_url: None,
            expected_hash: None,
            presence_probes: Vec::new(),
            silent_args: default_silent_args(),
            manual: false,
            manual_url: None,
        }
    }

    /// Whether at least one automated backend identifier is configured.
    pub fn has_backend(&self) -> bool {
        self.manager_a_id.is_some() || self.manager_b_id.is_some() || self.direct_url.is_some()
    }

    /// Link shown to the operator when automated installation fails.
    pub fn download_link(&self) -> Option<&str> {
        self.manual_url.as_deref().or(self.direct_url.as_deref())
    }
}

/// A non-fatal problem found while validating a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Entry has none of `manager_a_id`, `manager_b_id`, `direct_url`.
    NoBackend(AppName),
    /// Entry is marked manual but has no `manual_url`.
    ManualWithoutUrl(AppName),
    /// Entry has an `alternate_url` but no primary `direct_url`.
    AlternateWithoutPrimary(AppName),
    /// A later entry reused an existing name and was ignored.
    Duplicate(AppName),
    /// `max_parallel` is zero and was treated as one.
    ZeroParallelism,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBackend(name) => write!(
                f,
                "'{name}' has no manager_a_id, manager_b_id or direct_url and cannot be installed"
            ),
            Self::ManualWithoutUrl(name) => {
                write!(f, "'{name}' is marked manual but has no manual_url")
            }
            Self::AlternateWithoutPrimary(name) => {
                write!(f, "'{name}' has an alternate_url but no direct_url")
            }
            Self::Duplicate(name) => write!(f, "duplicate entry '{name}' ignored"),
            Self::ZeroParallelism => write!(f, "max_parallel = 0, using 1"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    app: Vec<ApplicationSpec>,
}

/// The full set of known applications plus run settings.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Run configuration.
    pub settings: Settings,
    apps: Vec<ApplicationSpec>,
    duplicates: Vec<AppName>,
}

impl Catalog {
    /// Build a catalog from already-parsed parts. Later duplicates are dropped.
    pub fn new(settings: Settings, apps: Vec<ApplicationSpec>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(apps.len());
        let mut duplicates = Vec::new();
        for app in apps {
            if seen.insert(app.name.clone()) {
                kept.push(app);
            } else {
                duplicates.push(app.name);
            }
        }
        Self {
            settings,
            apps: kept,
            duplicates,
        }
    }

    /// Parse a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if the text is not a valid catalog.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Ok(Self::new(file.settings, file.app))
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or
    /// [`CatalogError::Parse`] if its content is invalid.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_toml_str(crate::DEFAULT_CATALOG).unwrap_or_default()
    }

    /// Load `path`, falling back to [`Catalog::builtin`] if it cannot be loaded.
    ///
    /// The load error, if any, is returned alongside so the caller can warn.
    pub fn load_or_builtin(path: &Path) -> (Self, Option<CatalogError>) {
        match Self::from_file(path) {
            Ok(catalog) => (catalog, None),
            Err(e) => (Self::builtin(), Some(e)),
        }
    }

    /// All applications in catalog order.
    pub fn apps(&self) -> &[ApplicationSpec] {
        &self.apps
    }

    /// Look up an application by (case-insensitive) name.
    pub fn find(&self, name: &str) -> Option<&ApplicationSpec> {
        self.apps.iter().find(|app| app.name == name)
    }

    /// Number of applications.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the catalog has no applications.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Applications grouped by category, each group in catalog order.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ApplicationSpec>> {
        let mut groups: BTreeMap<&str, Vec<&ApplicationSpec>> = BTreeMap::new();
        for app in &self.apps {
            groups.entry(app.category.as_str()).or_default().push(app);
        }
        groups
    }

    /// Check the catalog for entries that cannot behave as intended.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.settings.max_parallel == 0 {
            warnings.push(ConfigWarning::ZeroParallelism);
        }
        for app in &self.apps {
            if app.manual {
                if app.manual_url.is_none() {
                    warnings.push(ConfigWarning::ManualWithoutUrl(app.name.clone()));
                }
            } else if !app.has_backend() {
                warnings.push(ConfigWarning::NoBackend(app.name.clone()));
            }
            if app.alternate_url.is_some() && app.direct_url.is_none() {
                warnings.push(ConfigWarning::AlternateWithoutPrimary(app.name.clone()));
            }
        }
        warnings.extend(self.duplicates.iter().cloned().map(ConfigWarning::Duplicate));
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RunMode;

    #[test]
    fn builtin_catalog_parses_and_is_clean() {
        let catalog = Catalog::from_toml_str(crate::DEFAULT_CATALOG).unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.validate().is_empty(), "{:?}", catalog.validate());
        assert!(catalog.apps().iter().any(|a| a.manual));
    }

    #[test]
    fn preserves_order_and_drops_duplicates() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[app]]
            name = "zeta"
            manager_b_id = "zeta"

            [[app]]
            name = "alpha"
            manager_b_id = "alpha"

            [[app]]
            name = "Zeta"
            direct_url = "https://example.com/zeta.exe"
            "#,
        )
        .unwrap();

        let names: Vec<&str> = catalog.apps().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(
            catalog.validate(),
            vec![ConfigWarning::Duplicate(AppName::new("zeta"))]
        );
        assert_eq!(catalog.settings.mode, RunMode::Parallel);
    }

    #[test]
    fn validation_reports_missing_backends() {
        let catalog = Catalog::from_toml_str(
            r#"
            [settings]
            max_parallel = 0

            [[app]]
            name = "orphan"

            [[app]]
            name = "big"
            manual = true

            [[app]]
            name = "half"
            alternate_url = "https://mirror.example.com/half.exe"
            "#,
        )
        .unwrap();

        let warnings = catalog.validate();
        assert!(warnings.contains(&ConfigWarning::ZeroParallelism));
        assert!(warnings.contains(&ConfigWarning::NoBackend(AppName::new("orphan"))));
        assert!(warnings.contains(&ConfigWarning::ManualWithoutUrl(AppName::new("big"))));
        assert!(warnings.contains(&ConfigWarning::AlternateWithoutPrimary(AppName::new(
            "half"
        ))));
        assert!(!warnings.contains(&ConfigWarning::NoBackend(AppName::new("big"))));
    }

    #[test]
    fn invalid_hash_fails_the_load() {
        let err = Catalog::from_toml_str(
            r#"
            [[app]]
            name = "tool"
            direct_url = "https://example.com/tool.exe"
            expected_hash = "not-a-hash"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("SHA256"));
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, err) = Catalog::load_or_builtin(&dir.path().join("missing.toml"));
        assert!(matches!(err, Some(CatalogError::Io { .. })));
        assert_eq!(catalog.len(), Catalog::builtin().len());
    }

    #[test]
    fn broken_file_falls_back_with_its_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.toml");
        std::fs::write(&path, "[[app]]\nname = \"git\"\nmanual = \"sometimes\"\n").unwrap();
        let (catalog, err) = Catalog::load_or_builtin(&path);
        assert!(matches!(err, Some(CatalogError::Parse(_))));
        assert_eq!(catalog.len(), Catalog::builtin().len());
    }

    #[test]
    fn partial_retry_table_keeps_the_declared_apps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.toml");
        std::fs::write(
            &path,
            r#"
            [settings.retry.manager]
            max_attempts = 5

            [[app]]
            name = "git"
            manager_a_id = "Git.Git"
            "#,
        )
        .unwrap();

        let (catalog, err) = Catalog::load_or_builtin(&path);
        assert!(err.is_none(), "{err:?}");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.find("git").is_some());
        assert_eq!(catalog.settings.retry.manager.max_attempts, 5);
    }

    #[test]
    fn groups_by_category() {
        let catalog = Catalog::builtin();
        let groups = catalog.by_category();
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, catalog.len());
    }

    #[test]
    fn find_is_case_insensitive() {
        let catalog = Catalog::new(Settings::default(), vec![ApplicationSpec::new("Git")]);
        assert!(catalog.find("GIT").is_some());
        assert!(catalog.find("svn").is_none());
    }
}
