//! Applications that are never installed automatically.

use rig_schema::AppName;

use crate::context::Context;
use crate::error::FailureReason;

/// Platform command that opens `url` in the default browser.
pub fn opener(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(windows) {
        ("cmd", ["/C", "start", "", url].map(String::from).to_vec())
    } else if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}

/// Always fails with [`FailureReason::ManualActionRequired`].
///
/// In interactive runs with `open_browser` set, the vendor page is opened
/// first. A failing opener is logged and otherwise ignored.
pub(crate) async fn request(
    ctx: &Context,
    name: &AppName,
    url: Option<&str>,
) -> Result<(), FailureReason> {
    if let Some(url) = url {
        ctx.reporter
            .warning(&format!("{name} must be downloaded manually: {url}"));
        if ctx.options.interactive && ctx.settings.open_browser {
            let (program, args) = opener(url);
            if let Err(e) = ctx.runner.run(program, &args, None).await {
                tracing::warn!(%name, error = %e, "could not open browser");
            }
        }
    } else {
        ctx.reporter
            .warning(&format!("{name} must be downloaded manually"));
    }

    Err(FailureReason::ManualActionRequired {
        url: url.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunOptions;
    use crate::reporter::NullReporter;
    use crate::testing::{ScriptedRunner, fast_settings, test_context};
    use std::sync::Arc;

    const URL: &str = "https://visualstudio.microsoft.com/downloads/";

    #[tokio::test]
    async fn unattended_runs_never_open_a_browser() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = test_context(runner.clone(), Arc::new(NullReporter), fast_settings(), tmp.path());

        let err = request(&ctx, &AppName::new("visual-studio"), Some(URL))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FailureReason::ManualActionRequired {
                url: Some(URL.to_string())
            }
        );
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn interactive_runs_open_the_vendor_page() {
        let tmp = tempfile::tempdir().unwrap();
        let (program, _) = opener(URL);
        let runner = Arc::new(ScriptedRunner::new().exits(program, &[0]));
        let mut ctx = test_context(runner.clone(), Arc::new(NullReporter), fast_settings(), tmp.path());
        ctx.options = RunOptions {
            interactive: true,
            ..RunOptions::default()
        };

        let err = request(&ctx, &AppName::new("visual-studio"), Some(URL))
            .await
            .unwrap_err();
        assert!(!err.is_operator_error());
        assert_eq!(runner.calls_to(program), 1);
    }
}
