//! Make sure at least one package manager is usable before installing.

use rig_core::{CommandRunner, FailureReason, Reporter, RetryPolicy, with_retry};
use rig_schema::Settings;

use super::error::RunError;

/// Install manager B's client if it is missing.
///
/// The bootstrap command runs through the retry engine with the `bootstrap`
/// policy. A failed bootstrap is only fatal when manager A is missing too.
pub async fn ensure_backend(
    runner: &dyn CommandRunner,
    settings: &Settings,
    reporter: &dyn Reporter,
) -> Result<(), RunError> {
    let a = runner.locate(&settings.manager_a.program).is_some();
    let mut b = runner.locate(&settings.manager_b.program).is_some();

    if a {
        reporter.info(&format!("{} found", settings.manager_a.program));
    }

    let mut last_error = None;
    if b {
        reporter.info(&format!("{} found", settings.manager_b.program));
    } else if let Some((program, args)) = settings.manager_b.bootstrap.split_first() {
        reporter.info(&format!(
            "{} not found, bootstrapping",
            settings.manager_b.program
        ));
        let policy = RetryPolicy::from(settings.retry.bootstrap);
        let result = with_retry(policy, move |attempt| async move {
            tracing::debug!(attempt, program, "bootstrap attempt");
            let output = runner.run(program, args, None).await?;
            match output.code {
                Some(0) => Ok(()),
                Some(code) => Err(FailureReason::ExitCode(code)),
                None => Err(FailureReason::Terminated),
            }
        })
        .await;

        match result {
            Ok(done) => {
                b = runner.locate(&settings.manager_b.program).is_some();
                if b {
                    reporter.success(&format!(
                        "{} installed after {} attempt(s)",
                        settings.manager_b.program, done.attempts
                    ));
                } else {
                    reporter.warning(&format!(
                        "{} bootstrap finished but the client is not on PATH yet",
                        settings.manager_b.program
                    ));
                }
            }
            Err(e) => {
                reporter.warning(&format!("{} bootstrap failed: {e}", settings.manager_b.program));
                last_error = Some(e.to_string());
            }
        }
    }

    if !a && !b {
        let detail = last_error.unwrap_or_else(|| {
            format!(
                "neither {} nor {} is installed",
                settings.manager_a.program, settings.manager_b.program
            )
        });
        return Err(RunError::NoBackend(detail));
    }
    if !b {
        reporter.warning(&format!(
            "continuing with {} only",
            settings.manager_a.program
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_core::testing::ScriptedRunner;
    use rig_core::NullReporter;

    fn settings(bootstrap_attempts: u32) -> Settings {
        let mut s = Settings::default();
        s.retry.bootstrap.max_attempts = bootstrap_attempts;
        s.retry.bootstrap.initial_delay_ms = 1;
        s.retry.bootstrap.max_delay_ms = 2;
        s
    }

    #[tokio::test]
    async fn present_clients_need_no_bootstrap() {
        let runner = ScriptedRunner::new().available("winget").available("choco");
        ensure_backend(&runner, &settings(5), &NullReporter).await.unwrap();
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn bootstrap_is_retried_until_it_works() {
        let runner = ScriptedRunner::new()
            .exits("powershell", &[1, 1, 0])
            .appears_after("powershell", "choco");
        ensure_backend(&runner, &settings(5), &NullReporter).await.unwrap();
        assert_eq!(runner.calls_to("powershell"), 3);
        assert!(runner.locate("choco").is_some());
    }

    #[tokio::test]
    async fn failed_bootstrap_without_manager_a_is_fatal() {
        let runner = ScriptedRunner::new().exits("powershell", &[1]);
        let err = ensure_backend(&runner, &settings(2), &NullReporter)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NoBackend(_)));
        assert_eq!(runner.calls_to("powershell"), 2);
    }

    #[tokio::test]
    async fn failed_bootstrap_with_manager_a_continues() {
        let runner = ScriptedRunner::new().available("winget").exits("powershell", &[1]);
        ensure_backend(&runner, &settings(2), &NullReporter).await.unwrap();
        assert_eq!(runner.calls_to("powershell"), 2);
    }
}
