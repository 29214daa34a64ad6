//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or merged into the settings
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config_rs::ConfigError),

    /// A configuration file is missing
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A value is outside its allowed range
    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A host/port pair did not resolve to a socket address
    #[error("Cannot resolve address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Serializing settings back to TOML failed
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
