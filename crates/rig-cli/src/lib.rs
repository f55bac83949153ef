//! rig - unattended workstation provisioning
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Installs a declarative catalog of applications on a fresh machine.
//!
//! # Overview
//!
//! Each application is checked for presence first, then installed through an
//! ordered chain of backends (package manager A, package manager B, direct
//! download), each retried with capped exponential backoff. Applications run
//! sequentially or in a bounded parallel pool, and one failure never aborts
//! the rest of the run.
//!
//! # Architecture
//!
//! - **Engine**: `rig_core` owns presence checks, backends, the pipeline state
//!   machine and the coordinator. It reports through the `Reporter` trait.
//! - **Actor Pattern**: console output and the run log are serialized through
//!   a single UI thread (`ui::actor`).
//! - **Orchestrator**: `ops::orchestrator` drives preflight, bootstrap,
//!   selection, the run and the summary.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.rig/
//! ├── rig.toml    # Catalog (falls back to the built-in one)
//! ├── logs/       # Run log
//! └── tmp/        # Per-download temp directories
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

pub use rig_core::paths::*;
pub use rig_core::USER_AGENT;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rig")]
#[command(author, version = env!("RIG_VERSION"), about = "rig - unattended workstation provisioning")]
pub struct Cli {
    /// Catalog file (defaults to $RIG_HOME/rig.toml)
    #[arg(long, global = true, env = "RIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run log file (defaults to $RIG_HOME/logs/rig.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Check presence and show what would be attempted, without installing
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install applications from the catalog
    Install(InstallArgs),
    /// Install exactly one application, without preflight or prompts
    #[command(name = "install-one")]
    InstallOne {
        /// Application name
        name: Option<String>,
        /// Reinstall even if already present
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// List the catalog grouped by category
    List {
        /// Also run the presence check for every application
        #[arg(long)]
        check: bool,
    },
    /// Check whether one application is installed
    Check {
        /// Application name
        name: String,
    },
    /// Validate the catalog and print configuration warnings
    Validate,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct InstallArgs {
    /// Application name(s); omit for an interactive selection
    pub names: Vec<String>,
    /// Install every application in the catalog
    #[arg(long, short = 'a', conflicts_with = "names")]
    pub all: bool,
    /// Reinstall applications that are already present
    #[arg(long, short = 'f')]
    pub force: bool,
    /// Skip confirmation prompts (advisories are logged as warnings)
    #[arg(long, short = 'y')]
    pub yes: bool,
    /// Run one application at a time
    #[arg(long, conflicts_with = "parallel")]
    pub sequential: bool,
    /// Run up to N applications at once
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,
    /// Skip the advisory environment checks
    #[arg(long)]
    pub skip_preflight: bool,
    /// Do not require administrator rights
    #[arg(long)]
    pub no_admin_check: bool,
}
