//! Error types for sm-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for sm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sm-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Top-level configuration is not shaped as store name -> settings block
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A store option is present but has the wrong shape
    #[error("Invalid setting {name} for store '{store}': expected {expected}")]
    InvalidSetting {
        store: String,
        name: String,
        expected: &'static str,
    },

    /// Store not configured
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    /// Invalid path or object name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) => 2,
            Error::Config(_) | Error::InvalidConfig(_) | Error::InvalidSetting { .. } => 2,
            Error::TomlParse(_) => 2,
            Error::Network(_) => 3,
            Error::Auth(_) => 4,
            Error::NotFound(_) | Error::StoreNotFound(_) => 5,
            Error::Conflict(_) => 6,
            _ => 1,
        }
    }

    pub(crate) fn invalid_setting(store: &str, name: &str, expected: &'static str) -> Self {
        Error::InvalidSetting {
            store: store.to_string(),
            name: name.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidConfig("test".into()).exit_code(), 2);
        assert_eq!(
            Error::invalid_setting("media", "AWS_S3_PORT", "a port number").exit_code(),
            2
        );
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::StoreNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Conflict("test".into()).exit_code(), 6);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::StoreNotFound("media".into());
        assert_eq!(err.to_string(), "Store not found: media");

        let err = Error::invalid_setting("media", "AWS_QUERYSTRING_EXPIRE", "an integer");
        assert_eq!(
            err.to_string(),
            "Invalid setting AWS_QUERYSTRING_EXPIRE for store 'media': expected an integer"
        );
    }
}
