//! Terminal output and the run log

pub mod actor;
pub mod log;
pub mod reporter;

pub use actor::{UiActor, UiEvent};
pub use log::{LogLevel, RunLog};
pub use reporter::ConsoleReporter;

impl UiActor {
    /// A reporter that sends to this actor.
    pub fn reporter(&self) -> ConsoleReporter {
        ConsoleReporter::new(self.sender())
    }
}
