//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! The store registry is loaded once, before any command runs, and handed to
//! the command through [`AppContext`].

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sm_core::{ConfigManager, Registry, RemotePath};
use sm_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod check;
mod completions;
mod ls;
mod put;
mod rm;
mod stat;
mod stores;
mod url;

/// sm - multi-store S3 adapter registry
///
/// Inspect the stores declared in the s3multi configuration file and run
/// object operations against them.
#[derive(Parser, Debug)]
#[command(name = "sm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ~/.config/s3multi/config.toml)
    #[arg(long, global = true, env = "SM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect configured stores
    #[command(subcommand)]
    Stores(stores::StoresCommands),

    /// Validate the configuration file
    Check,

    /// List objects of a store
    Ls(ls::LsArgs),

    /// Show object metadata
    Stat(stat::StatArgs),

    /// Display object contents
    Cat(cat::CatArgs),

    /// Upload a local file to a store
    Put(put::PutArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Print the URL an object is served from
    Url(url::UrlArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Everything a command needs: the loaded registry and the output formatter
pub struct AppContext {
    pub config_path: PathBuf,
    pub registry: Registry,
    pub formatter: Formatter,
}

impl AppContext {
    /// Create a storage client for one store
    pub async fn open_store(&self, store: &str) -> anyhow::Result<S3Client> {
        let adapter = self.registry.get(store)?;
        let client = S3Client::new(store, adapter)
            .await
            .with_context(|| format!("Failed to create client for store '{store}'"))?;
        Ok(client)
    }

    /// Report an error and map it to an exit code
    pub fn fail(&self, err: &anyhow::Error) -> ExitCode {
        self.formatter.error(&format!("{err:#}"));
        exit_code_for(err)
    }
}

/// Parse `store/name`, rejecting paths that name a prefix
pub fn parse_object_path(path: &str) -> sm_core::Result<RemotePath> {
    let parsed = RemotePath::parse(path)?;
    if parsed.is_dir || sm_core::path::join_object("", &parsed.name).is_err() {
        return Err(sm_core::Error::InvalidPath(format!(
            "'{path}' does not name an object. Use format: store/name"
        )));
    }
    Ok(parsed)
}

/// Exit code for an error, looking through any added context
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<sm_core::Error>()
        .map(ExitCode::from)
        .unwrap_or(ExitCode::GeneralError)
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    if let Commands::Completions(args) = cli.command {
        return completions::execute(args);
    }

    let mut output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                Formatter::new(output_config).error(&e.to_string());
                return ExitCode::from(&e);
            }
        },
    };

    // Invalid configuration is fatal before any command runs.
    let config = match manager.load() {
        Ok(config) => config,
        Err(e) => {
            Formatter::new(output_config).error(&format!(
                "Failed to load {}: {e}",
                manager.config_path().display()
            ));
            return ExitCode::from(&e);
        }
    };

    output_config.json |= config.defaults.output == "json";
    output_config.no_color |= config.defaults.color == "never";
    let formatter = Formatter::new(output_config);

    let registry = match config.registry_with_env(std::env::vars()) {
        Ok(registry) => registry,
        Err(e) => {
            formatter.error(&format!(
                "Invalid store configuration in {}: {e}",
                manager.config_path().display()
            ));
            return ExitCode::from(&e);
        }
    };

    let ctx = AppContext {
        config_path: manager.config_path().clone(),
        registry,
        formatter,
    };

    match cli.command {
        Commands::Stores(cmd) => stores::execute(cmd, &ctx),
        Commands::Check => check::execute(&ctx),
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Stat(args) => stat::execute(args, &ctx).await,
        Commands::Cat(args) => cat::execute(args, &ctx).await,
        Commands::Put(args) => put::execute(args, &ctx).await,
        Commands::Rm(args) => rm::execute(args, &ctx).await,
        Commands::Url(args) => url::execute(args, &ctx).await,
        Commands::Completions(_) => unreachable!("handled before configuration is loaded"),
    }
}
