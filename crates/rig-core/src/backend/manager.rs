//! Package manager adapters.
//!
//! Both managers share the same shape: render the install command from the
//! settings template, run it, then map the exit code through a per-manager
//! table.

use rig_schema::ManagerCommand;

use crate::context::Context;
use crate::error::FailureReason;

/// `E_ACCESSDENIED` as a signed exit code.
pub const A_ACCESS_DENIED: i32 = 0x8007_0005_u32 as i32;
/// `APPINSTALLER_CLI_ERROR_NO_APPLICATIONS_FOUND`.
pub const A_PACKAGE_NOT_FOUND: i32 = 0x8A15_0014_u32 as i32;

/// Installer finished, reboot required.
pub const REBOOT_REQUIRED: i32 = 3010;
/// Installer finished and started a reboot.
pub const REBOOT_INITIATED: i32 = 1641;

pub fn classify_a(code: i32) -> Result<(), FailureReason> {
    match code {
        0 => Ok(()),
        A_ACCESS_DENIED => Err(FailureReason::AccessDenied),
        A_PACKAGE_NOT_FOUND => Err(FailureReason::PackageNotFound),
        other => Err(FailureReason::ExitCode(other)),
    }
}

pub fn classify_b(code: i32) -> Result<(), FailureReason> {
    match code {
        0 | REBOOT_REQUIRED | REBOOT_INITIATED => Ok(()),
        5 => Err(FailureReason::AccessDenied),
        other => Err(FailureReason::ExitCode(other)),
    }
}

pub(crate) async fn install(
    ctx: &Context,
    command: &ManagerCommand,
    id: &str,
    classify: fn(i32) -> Result<(), FailureReason>,
) -> Result<(), FailureReason> {
    let args = command.render_install_args(id);
    let output = ctx
        .runner
        .run(&command.program, &args, ctx.install_timeout())
        .await?;

    match output.code {
        Some(code) => classify(code).inspect_err(|reason| {
            tracing::warn!(program = %command.program, id, code, %reason, "install failed");
            let tail = output.combined();
            if !tail.is_empty() {
                tracing::debug!(program = %command.program, output = %tail);
            }
        }),
        None => Err(FailureReason::Terminated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use crate::testing::{ScriptedRunner, fast_settings, test_context};
    use std::sync::Arc;

    #[test]
    fn manager_a_table() {
        assert_eq!(classify_a(0), Ok(()));
        assert_eq!(classify_a(-2_147_024_891), Err(FailureReason::AccessDenied));
        assert_eq!(classify_a(-1_978_335_212), Err(FailureReason::PackageNotFound));
        assert_eq!(classify_a(3010), Err(FailureReason::ExitCode(3010)));
    }

    #[test]
    fn manager_b_table() {
        assert_eq!(classify_b(0), Ok(()));
        assert_eq!(classify_b(3010), Ok(()));
        assert_eq!(classify_b(1641), Ok(()));
        assert_eq!(classify_b(5), Err(FailureReason::AccessDenied));
        assert_eq!(classify_b(1), Err(FailureReason::ExitCode(1)));
    }

    #[tokio::test]
    async fn renders_identifier_into_the_command() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().exits("choco", &[0]));
        let ctx = test_context(runner.clone(), Arc::new(NullReporter), fast_settings(), tmp.path());

        install(&ctx, &ctx.settings.manager_b, "7zip", classify_b)
            .await
            .unwrap();
        assert_eq!(runner.calls_to("choco"), 1);
    }

    #[tokio::test]
    async fn missing_client_is_a_spawn_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = test_context(runner, Arc::new(NullReporter), fast_settings(), tmp.path());

        let err = install(&ctx, &ctx.settings.manager_a, "Git.Git", classify_a)
            .await
            .unwrap_err();
        assert!(matches!(err, FailureReason::Spawn { ref program, .. } if program == "winget"));
    }
}
