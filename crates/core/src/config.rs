//! Configuration management
//!
//! This module loads the s3multi configuration file. The file is stored in
//! TOML format at ~/.config/s3multi/config.toml unless `SM_CONFIG` or an
//! explicit path says otherwise. Each `[stores.<name>]` table is one store's
//! settings block.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::{store_blocks, Registry};
use crate::settings::{EnvSettings, Layered};

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable that overrides the configuration file path
pub const CONFIG_ENV: &str = "SM_CONFIG";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Store name -> settings block
    #[serde(default)]
    pub stores: toml::Table,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            stores: toml::Table::new(),
        }
    }
}

impl Config {
    /// Build the store registry from the file's blocks alone
    pub fn registry(&self) -> Result<Registry> {
        Registry::build(&self.stores)
    }

    /// Build the store registry with `SM_<STORE>_<OPTION>` overrides applied
    ///
    /// `vars` is a snapshot of the environment, taken once before the build.
    pub fn registry_with_env<I>(&self, vars: I) -> Result<Registry>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let layered = store_blocks(&self.stores)?
            .into_iter()
            .map(|(store, block)| {
                let overrides = EnvSettings::for_store(store, vars.iter().cloned());
                if !overrides.is_empty() {
                    tracing::debug!(store = %store, overrides = overrides.len(), "Applying environment overrides");
                }
                (store, Layered::new(overrides, block))
            });

        Registry::from_sources(layered)
    }
}

/// Configuration manager handles loading the config file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    ///
    /// `SM_CONFIG` takes precedence over the platform config directory.
    pub fn new() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("s3multi").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration
    /// with no stores. If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No configuration file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Check schema version and migrate if necessary
        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade sm.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Load the configuration and build the store registry, with
    /// environment overrides taken from the process environment
    pub fn load_registry(&self) -> Result<Registry> {
        self.load()?.registry_with_env(std::env::vars())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;

        // Version 0 files predate the schema field and have the same layout.
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
