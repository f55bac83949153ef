//! The `install` run, start to finish.
//!
//! ```text
//! preflight -> bootstrap -> selection -> confirmation -> coordinator
//!           -> post-install steps -> summary
//! ```
//!
//! Only preflight, bootstrap and confirmation can abort the run. Once the
//! coordinator starts, every selected application gets a terminal outcome.

use rig_core::{CommandRunner, Reporter, RunOptions, RunResult, coordinator};
use rig_schema::{AppName, RunMode, Settings};

use super::error::{Exit, RunError};
use super::preflight::{self, CheckStatus};
use super::select::{self, Selection};
use super::setup::{self, Session};
use super::{bootstrap, report};
use crate::ui::actor::format_eta;
use crate::{Cli, InstallArgs};

/// Run the full install flow.
pub async fn run_install(session: &Session, cli: &Cli, args: &InstallArgs) -> Result<Exit, RunError> {
    let reporter = &session.reporter;
    let runner: &dyn CommandRunner = &*session.runner;
    let interactive = setup::is_interactive(args.yes);
    let settings = effective_settings(&session.catalog.settings, args);

    for warning in session.catalog.validate() {
        reporter.warning(&warning.to_string());
    }
    reporter.status(&format!(
        "run started: {} catalog entries, {} mode{}",
        session.catalog.len(),
        mode_label(&settings),
        if cli.dry_run { ", dry run" } else { "" }
    ));

    reporter.section("Preflight");
    check_admin(runner, reporter, args.no_admin_check, cli.dry_run).await?;
    if args.skip_preflight {
        reporter.info("advisory checks skipped");
    } else {
        let client = reqwest::Client::builder()
            .user_agent(rig_core::USER_AGENT)
            .build()?;
        let checks = preflight::run_checks(runner, &client, &settings.preflight).await;
        let mut advisories = 0;
        for check in &checks {
            match &check.status {
                CheckStatus::Passed(msg) => reporter.success(&format!("{}: {msg}", check.name)),
                CheckStatus::Advisory(msg) => {
                    advisories += 1;
                    reporter.warning(&format!("{}: {msg}", check.name));
                }
                CheckStatus::Skipped(msg) => reporter.info(&format!("{}: {msg}", check.name)),
            }
        }
        if advisories > 0 && interactive {
            session.sync().await;
            if !select::confirm("Continue despite the warnings above?", false)? {
                reporter.warning("run cancelled after preflight warnings");
                return Err(RunError::Cancelled);
            }
        }
    }

    if cli.dry_run {
        reporter.info("dry run: package manager bootstrap skipped");
    } else {
        reporter.section("Package managers");
        bootstrap::ensure_backend(runner, &settings, reporter).await?;
    }

    let selection = choose(session, args, interactive).await?;
    for name in &selection.unknown {
        reporter.warning(&format!("unknown application '{name}', skipping"));
    }

    if !selection.apps.is_empty() && !args.yes && !cli.dry_run && interactive {
        let estimate = select::estimate(
            selection.apps.len(),
            settings.estimate_per_app_secs,
            match settings.mode {
                RunMode::Sequential => 1,
                RunMode::Parallel => settings.parallelism(),
            },
        );
        session.sync().await;
        let question = format!(
            "Install {} application(s)? Estimated time: {}",
            selection.apps.len(),
            format_eta(estimate)
        );
        if !select::confirm(&question, true)? {
            reporter.warning("run cancelled at confirmation");
            return Err(RunError::Cancelled);
        }
    }

    let options = RunOptions {
        force: args.force,
        dry_run: cli.dry_run,
        interactive,
    };
    let post_install = settings.post_install.clone();
    let ctx = session.context(settings, options)?;

    reporter.section("Installing");
    let mut result = coordinator::run_all(&ctx, &selection.apps).await;
    record_unselected(&mut result, &selection);

    if !cli.dry_run && !post_install.is_empty() {
        reporter.section("Post-install");
        run_post_install(runner, &post_install, reporter).await;
    }

    reporter.section("Summary");
    report::summarize(&result, reporter, interactive);
    reporter.status(&format!(
        "run finished: {} installed, {} failed, {} skipped",
        result.successful().len(),
        result.failed().len(),
        result.skipped().len()
    ));
    reporter.info(&format!("run log: {}", session.log_path().display()));
    session.sync().await;

    Ok(exit_for(&result, &selection))
}

/// 0 only when every requested name was known and none ended failed.
fn exit_for(result: &RunResult, selection: &Selection) -> Exit {
    if result.all_succeeded() && selection.unknown.is_empty() {
        Exit::Ok
    } else {
        Exit::Failures
    }
}

/// Catalog settings with the command-line scheduling overrides applied.
pub fn effective_settings(base: &Settings, args: &InstallArgs) -> Settings {
    let mut settings = base.clone();
    if args.sequential {
        settings.mode = RunMode::Sequential;
    }
    if let Some(n) = args.parallel {
        settings.mode = RunMode::Parallel;
        settings.max_parallel = n;
    }
    settings
}

fn mode_label(settings: &Settings) -> String {
    match settings.mode {
        RunMode::Sequential => "sequential".to_string(),
        RunMode::Parallel => format!("parallel (max {})", settings.parallelism()),
    }
}

async fn check_admin(
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
    skip: bool,
    dry_run: bool,
) -> Result<(), RunError> {
    if skip {
        reporter.info("administrator check skipped");
        return Ok(());
    }
    if preflight::is_elevated(runner).await {
        reporter.success("running with administrator rights");
        Ok(())
    } else if dry_run {
        reporter.warning("not running with administrator rights; a real run would stop here");
        Ok(())
    } else {
        reporter.warning("administrator rights are required");
        Err(RunError::PermissionDenied)
    }
}

async fn choose(session: &Session, args: &InstallArgs, interactive: bool) -> Result<Selection, RunError> {
    let catalog = &session.catalog;
    if args.all {
        Ok(select::all(catalog))
    } else if !args.names.is_empty() {
        Ok(select::by_names(catalog, &args.names))
    } else if interactive {
        session.sync().await;
        select::interactive(catalog)
    } else {
        Err(RunError::MissingArgument("NAMES (or --all)"))
    }
}

fn record_unselected(result: &mut RunResult, selection: &Selection) {
    for name in &selection.not_selected {
        result.record_skipped(name.clone(), "not selected");
    }
    for name in &selection.unknown {
        result.record_skipped(AppName::new(name), "unknown application");
    }
}

/// Run each configured post-install command once. Failures are warnings.
pub async fn run_post_install(
    runner: &dyn CommandRunner,
    steps: &[Vec<String>],
    reporter: &dyn Reporter,
) -> usize {
    let mut failures = 0;
    for step in steps {
        let Some((program, step_args)) = step.split_first() else {
            continue;
        };
        let shown = step.join(" ");
        match runner.run(program, step_args, None).await {
            Ok(out) if out.success() => reporter.success(&format!("{shown}: done")),
            Ok(out) => {
                failures += 1;
                let code = out.code.map_or_else(|| "none".to_string(), |c| c.to_string());
                reporter.warning(&format!("{shown}: exited with code {code}"));
            }
            Err(e) => {
                failures += 1;
                reporter.warning(&format!("{shown}: {e}"));
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_core::testing::ScriptedRunner;
    use rig_core::NullReporter;

    #[test]
    fn flags_override_catalog_mode() {
        let base = Settings::default();

        let args = InstallArgs {
            sequential: true,
            ..InstallArgs::default()
        };
        assert_eq!(effective_settings(&base, &args).mode, RunMode::Sequential);

        let args = InstallArgs {
            parallel: Some(5),
            ..InstallArgs::default()
        };
        let settings = effective_settings(&base, &args);
        assert_eq!(settings.mode, RunMode::Parallel);
        assert_eq!(settings.max_parallel, 5);

        let untouched = effective_settings(&base, &InstallArgs::default());
        assert_eq!(untouched, base);
    }

    #[tokio::test]
    async fn post_install_failures_are_counted_not_fatal() {
        let runner = ScriptedRunner::new().exits("refreshenv", &[0]).exits("gpupdate", &[1]);
        let steps = vec![
            vec!["refreshenv".to_string()],
            vec!["gpupdate".to_string(), "/force".to_string()],
            vec!["missing-tool".to_string()],
            vec![],
        ];
        let failures = run_post_install(&runner, &steps, &NullReporter).await;
        assert_eq!(failures, 2);
        assert_eq!(runner.calls(), 3);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn admin_check() {
        let user = ScriptedRunner::new().prints("id", "1000\n");
        assert!(matches!(
            check_admin(&user, &NullReporter, false, false).await,
            Err(RunError::PermissionDenied)
        ));
        assert!(check_admin(&user, &NullReporter, false, true).await.is_ok());
        assert!(check_admin(&user, &NullReporter, true, false).await.is_ok());

        let root = ScriptedRunner::new().prints("id", "0\n");
        assert!(check_admin(&root, &NullReporter, false, false).await.is_ok());
    }

    #[test]
    fn unselected_and_unknown_names_are_skipped() {
        let selection = Selection {
            apps: Vec::new(),
            unknown: vec!["nope".to_string()],
            not_selected: vec![AppName::new("vlc")],
        };
        let mut result = RunResult::new();
        record_unselected(&mut result, &selection);
        assert_eq!(result.skipped().len(), 2);
        assert!(result.all_succeeded());
    }

    #[test]
    fn unknown_names_fail_the_run() {
        let known_only = Selection {
            apps: Vec::new(),
            unknown: Vec::new(),
            not_selected: vec![AppName::new("vlc")],
        };
        let mut result = RunResult::new();
        record_unselected(&mut result, &known_only);
        assert_eq!(exit_for(&result, &known_only), Exit::Ok);

        let with_typo = Selection {
            unknown: vec!["gti".to_string()],
            ..known_only
        };
        record_unselected(&mut result, &with_typo);
        assert_eq!(exit_for(&result, &with_typo), Exit::Failures);
    }
}
