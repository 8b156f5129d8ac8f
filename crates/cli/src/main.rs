//! sm - multi-store S3 adapter registry
//!
//! A command-line interface over a registry of declaratively configured
//! S3 stores, each with its own bucket, credentials and write policy.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod exit_code;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is reserved for command output
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = tokio::select! {
        code = commands::execute(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            exit_code::ExitCode::Interrupted
        }
    };

    std::process::exit(exit_code.as_i32());
}
