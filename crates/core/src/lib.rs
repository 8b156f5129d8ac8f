//! sm-core: Core library for s3multi
//!
//! This crate turns declarative store configuration into a registry of
//! resolved adapter settings, including:
//! - Settings sources (map, struct and environment backed) and typed resolution
//! - The adapter factory that produces one `AdapterConfig` per store
//! - The store registry and the configuration file that feeds it
//! - Key and URL derivation shared by storage clients
//! - The ObjectStore trait implemented by the S3 client
//!
//! This crate is independent of any S3 SDK.

pub mod adapter;
pub mod config;
pub mod error;
pub mod path;
pub mod registry;
pub mod settings;
pub mod traits;

pub use adapter::{AdapterConfig, CallingFormat, Credentials};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use path::RemotePath;
pub use registry::Registry;
pub use settings::{get_setting, EnvSettings, Layered, Resolver, SettingsSource, StoreSettings};
pub use traits::{ListOptions, ListResult, ObjectInfo, ObjectStore};
