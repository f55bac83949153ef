//! Installation backends.
//!
//! A [`Backend`] is one concrete way of installing an application. The set is
//! closed: adding a backend means adding a variant here, and every `match`
//! below tells you what else needs to learn about it.

pub mod download;
pub mod manager;
pub mod manual;

use std::fmt;

use rig_schema::{ApplicationSpec, Settings};

use crate::context::Context;
use crate::error::FailureReason;
use crate::retry::RetryPolicy;

/// Discriminant of [`Backend`], used in reports and progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    PackageManagerA,
    PackageManagerB,
    DirectDownload,
    Manual,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackageManagerA => "manager-a",
            Self::PackageManagerB => "manager-b",
            Self::DirectDownload => "download",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    PackageManagerA { id: String },
    PackageManagerB { id: String },
    DirectDownload {
        primary: String,
        alternate: Option<String>,
    },
    Manual { url: Option<String> },
}

impl Backend {
    /// Ordered method list for one application.
    ///
    /// Manual entries never get an automated backend. Otherwise the order is
    /// manager A, manager B, direct download, each only if configured.
    pub fn plan(app: &ApplicationSpec) -> Vec<Self> {
        if app.manual {
            return vec![Self::Manual {
                url: app.download_link().map(str::to_string),
            }];
        }

        let mut methods = Vec::with_capacity(3);
        if let Some(id) = &app.manager_a_id {
            methods.push(Self::PackageManagerA { id: id.clone() });
        }
        if let Some(id) = &app.manager_b_id {
            methods.push(Self::PackageManagerB { id: id.clone() });
        }
        if let Some(primary) = &app.direct_url {
            methods.push(Self::DirectDownload {
                primary: primary.clone(),
                alternate: app.alternate_url.clone(),
            });
        }
        methods
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::PackageManagerA { .. } => BackendKind::PackageManagerA,
            Self::PackageManagerB { .. } => BackendKind::PackageManagerB,
            Self::DirectDownload { .. } => BackendKind::DirectDownload,
            Self::Manual { .. } => BackendKind::Manual,
        }
    }

    /// Whether the backend can be attempted on this machine.
    ///
    /// Package managers need their client on `PATH`; the other backends are
    /// always available.
    pub fn is_available(&self, ctx: &Context) -> bool {
        match self {
            Self::PackageManagerA { .. } => ctx.runner.locate(&ctx.settings.manager_a.program).is_some(),
            Self::PackageManagerB { .. } => ctx.runner.locate(&ctx.settings.manager_b.program).is_some(),
            Self::DirectDownload { .. } | Self::Manual { .. } => true,
        }
    }

    /// Retry bounds for this backend.
    pub fn retry_policy(&self, settings: &Settings) -> RetryPolicy {
        match self {
            Self::PackageManagerA { .. } | Self::PackageManagerB { .. } => settings.retry.manager.into(),
            Self::DirectDownload { .. } => settings.retry.download.into(),
            Self::Manual { .. } => RetryPolicy::once(),
        }
    }

    /// Perform a single attempt. Retrying is the caller's job.
    pub async fn attempt(&self, ctx: &Context, app: &ApplicationSpec) -> Result<(), FailureReason> {
        match self {
            Self::PackageManagerA { id } => {
                manager::install(ctx, &ctx.settings.manager_a, id, manager::classify_a).await
            }
            Self::PackageManagerB { id } => {
                manager::install(ctx, &ctx.settings.manager_b, id, manager::classify_b).await
            }
            Self::DirectDownload { primary, alternate } => {
                download::install(ctx, app, primary, alternate.as_deref()).await
            }
            Self::Manual { url } => manual::request(ctx, &app.name, url.as_deref()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_follows_priority_order() {
        let app = ApplicationSpec {
            manager_a_id: Some("Git.Git".into()),
            manager_b_id: Some("git".into()),
            direct_url: Some("https://example.invalid/git.exe".into()),
            ..ApplicationSpec::new("git")
        };
        let kinds: Vec<_> = Backend::plan(&app).iter().map(Backend::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BackendKind::PackageManagerA,
                BackendKind::PackageManagerB,
                BackendKind::DirectDownload
            ]
        );
    }

    #[test]
    fn plan_skips_unconfigured_methods() {
        let app = ApplicationSpec {
            manager_b_id: Some("vlc".into()),
            ..ApplicationSpec::new("vlc")
        };
        assert_eq!(
            Backend::plan(&app),
            vec![Backend::PackageManagerB { id: "vlc".into() }]
        );
        assert!(Backend::plan(&ApplicationSpec::new("nothing")).is_empty());
    }

    #[test]
    fn manual_apps_bypass_automated_backends() {
        let app = ApplicationSpec {
            manual: true,
            manager_a_id: Some("Microsoft.VisualStudio.2022.Community".into()),
            manual_url: Some("https://visualstudio.microsoft.com/downloads/".into()),
            ..ApplicationSpec::new("visual-studio")
        };
        assert_eq!(
            Backend::plan(&app),
            vec![Backend::Manual {
                url: Some("https://visualstudio.microsoft.com/downloads/".into())
            }]
        );
    }

    #[test]
    fn each_backend_has_its_own_bounds() {
        let mut settings = Settings::default();
        settings.retry.manager.max_attempts = 7;
        settings.retry.download.max_attempts = 2;

        let a = Backend::PackageManagerA { id: "x".into() };
        let d = Backend::DirectDownload {
            primary: "u".into(),
            alternate: None,
        };
        let m = Backend::Manual { url: None };
        assert_eq!(a.retry_policy(&settings).max_attempts, 7);
        assert_eq!(d.retry_policy(&settings).max_attempts, 2);
        assert_eq!(m.retry_policy(&settings), RetryPolicy::once());
    }
}
