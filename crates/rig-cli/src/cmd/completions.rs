use clap::CommandFactory;
use clap_complete::Shell;

use crate::Cli;

/// Write shell completions to stdout.
pub fn completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
