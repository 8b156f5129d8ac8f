//! completions command - Generate shell completion scripts
//!
//! Runs before any configuration is loaded, so it works without a config file.

use clap::CommandFactory;
use clap_complete::Shell;

use super::Cli;
use crate::exit_code::ExitCode;

/// Binary name the scripts complete
const BIN_NAME: &str = "sm";

/// Arguments for the completions command
#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print the completion script for `args.shell` to stdout
pub fn execute(args: CompletionsArgs) -> ExitCode {
    write_script(args.shell, &mut std::io::stdout());
    ExitCode::Success
}

fn write_script(shell: Shell, out: &mut dyn std::io::Write) {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
}
