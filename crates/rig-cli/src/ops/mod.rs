//! Run orchestration: everything between argument parsing and the engine.

pub mod bootstrap;
pub mod error;
pub mod orchestrator;
pub mod preflight;
pub mod report;
pub mod select;
pub mod setup;

pub use error::{Exit, RunError};
pub use orchestrator::run_install;
pub use setup::Session;
