//! rig - unattended workstation provisioning CLI

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use rig_cli::cmd;
use rig_cli::ops::{Exit, RunError};
use rig_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // RIG_LOG takes precedence over RUST_LOG
    let filter = EnvFilter::try_from_env("RIG_LOG").unwrap_or_else(|_| EnvFilter::from_default_env());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install(ref args) => cmd::install::install(&cli, args).await,
        Commands::InstallOne { ref name, force } => {
            cmd::install_one::install_one(&cli, name.as_deref(), force).await
        }
        Commands::List { check } => cmd::list::list(&cli, check).await,
        Commands::Check { ref name } => cmd::check::check(&cli, name).await,
        Commands::Validate => cmd::validate::validate(&cli),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(Exit::Ok)
        }
    };

    match result {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            e.downcast_ref::<RunError>()
                .map_or(Exit::Fatal, RunError::exit)
                .into()
        }
    }
}
