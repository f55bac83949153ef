//! Direct-download adapter.
//!
//! Streams an installer to a private temp directory while hashing it,
//! verifies it, and runs it with the application's silent flags. The temp
//! directory is a [`tempfile::TempDir`], so the artifact is removed on every
//! exit path, including unwinding.

use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use rig_schema::{AppName, ApplicationSpec, Sha256Digest};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::context::Context;
use crate::error::FailureReason;
use crate::reporter::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Downloaded file is empty")]
    Empty,

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

impl DownloadError {
    fn into_reason(self, timeout_secs: u64) -> FailureReason {
        match self {
            Self::Http(e) if e.is_timeout() => FailureReason::TimedOut(timeout_secs),
            Self::Http(e) => match e.status() {
                Some(status) => FailureReason::HttpStatus(status.as_u16()),
                None => FailureReason::Network(e.to_string()),
            },
            Self::Io(e) => FailureReason::Io(e.to_string()),
            Self::Empty => FailureReason::EmptyArtifact,
            Self::HashMismatch { expected, actual } => {
                FailureReason::IntegrityFailure { expected, actual }
            }
        }
    }
}

/// Download `url` into `dest`, returning the hex SHA256 of the content.
///
/// The file is removed again if it turns out empty or does not match
/// `expected`.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected: Option<&Sha256Digest>,
    name: &AppName,
    reporter: &dyn Reporter,
) -> Result<String, DownloadError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let total_size = response.content_length();
    reporter.downloading(name, 0, total_size);

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        reporter.downloading(name, downloaded, total_size);
    }

    file.flush().await?;
    drop(file);
    let actual_hash = hex::encode(hasher.finalize());

    if downloaded == 0 {
        tokio::fs::remove_file(dest).await.ok();
        return Err(DownloadError::Empty);
    }

    if let Some(expected) = expected {
        if !expected.matches(&actual_hash) {
            tokio::fs::remove_file(dest).await.ok();
            return Err(DownloadError::HashMismatch {
                expected: expected.to_string(),
                actual: actual_hash,
            });
        }
    }

    Ok(actual_hash)
}

/// File name for the downloaded artifact.
pub fn artifact_name(app: &AppName, url: &str) -> String {
    let from_url = crate::filename_from_url(url);
    if from_url.is_empty() || !from_url.contains('.') {
        format!("{app}-setup{}", std::env::consts::EXE_SUFFIX)
    } else {
        from_url.to_string()
    }
}

pub(crate) async fn install(
    ctx: &Context,
    app: &ApplicationSpec,
    primary: &str,
    alternate: Option<&str>,
) -> Result<(), FailureReason> {
    let io = |e: std::io::Error| FailureReason::Io(e.to_string());

    tokio::fs::create_dir_all(&ctx.tmp_dir).await.map_err(io)?;
    let workdir = tempfile::Builder::new()
        .prefix("rig-")
        .tempdir_in(&ctx.tmp_dir)
        .map_err(io)?;

    let result = download_and_run(ctx, app, primary, alternate, workdir.path()).await;

    if let Err(e) = workdir.close() {
        tracing::warn!(app = %app.name, error = %e, "failed to remove download directory");
    }
    result
}

async fn download_and_run(
    ctx: &Context,
    app: &ApplicationSpec,
    primary: &str,
    alternate: Option<&str>,
    workdir: &Path,
) -> Result<(), FailureReason> {
    let installer = match download_one(ctx, app, primary, workdir).await {
        Ok(path) => path,
        Err(e) => match alternate {
            Some(alt) => {
                tracing::info!(app = %app.name, error = %e, "primary download failed, trying alternate");
                ctx.reporter
                    .info(&format!("{}: primary download failed ({e}), trying alternate URL", app.name));
                download_one(ctx, app, alt, workdir).await?
            }
            None => return Err(e),
        },
    };

    run_installer(ctx, app, &installer).await
}

async fn download_one(
    ctx: &Context,
    app: &ApplicationSpec,
    url: &str,
    workdir: &Path,
) -> Result<PathBuf, FailureReason> {
    let dest = workdir.join(artifact_name(&app.name, url));
    tracing::debug!(app = %app.name, url, dest = %dest.display(), "downloading installer");

    fetch(
        &ctx.client,
        url,
        &dest,
        app.expected_hash.as_ref(),
        &app.name,
        ctx.reporter.as_ref(),
    )
    .await
    .map_err(|e| e.into_reason(ctx.settings.download_timeout_secs))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o755);
        tokio::fs::set_permissions(&dest, perms)
            .await
            .map_err(|e| FailureReason::Io(e.to_string()))?;
    }

    Ok(dest)
}

async fn run_installer(
    ctx: &Context,
    app: &ApplicationSpec,
    installer: &Path,
) -> Result<(), FailureReason> {
    let program = installer.to_string_lossy();
    let output = ctx
        .runner
        .run(&program, &app.silent_args, ctx.install_timeout())
        .await?;

    match output.code {
        Some(0) | Some(super::manager::REBOOT_REQUIRED) => Ok(()),
        Some(code) => Err(FailureReason::ExitCode(code)),
        None => Err(FailureReason::Terminated),
    }
}
