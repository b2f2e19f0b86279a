//! Settings errors

use std::io;

use thiserror::Error;

/// Anything that can go wrong reading or writing the config file
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The config file could not be read or written
    #[error("Cannot access settings file: {0}")]
    Io(#[from] io::Error),

    /// A `.json` config file did not parse
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.toml` config file did not parse
    #[error("Invalid TOML settings: {0}")]
    TomlRead(#[from] toml::de::Error),

    /// The config could not be written as TOML
    #[error("Cannot encode settings as TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// The file parsed but a value is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The view-state file failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// A config value that parsed but cannot be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Dotted path of a key that is empty
    #[error("'{0}' must be set")]
    MissingKey(String),

    /// File extension other than `.toml` or `.json`
    #[error("Unsupported config format '{0}', use .toml or .json")]
    UnsupportedFormat(String),

    /// A value parsed but is outside what the client accepts
    #[error("'{key}' has an invalid value: {value}")]
    ValueOutOfRange { key: String, value: String },

    /// `dirs` found no config directory for this OS
    #[error("No config directory on {0}")]
    UnsupportedPlatform(String),
}

/// Failures of the view-state file
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The view-state file could not be read or written
    #[error("View state I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The view-state file did not parse
    #[error("View state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;
