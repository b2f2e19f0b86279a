//! mkremote Settings Crate
//!
//! Handles the configuration file and the small amount of client state that
//! survives a restart.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    Config, ConnectionSettings, JogSettings, PollingSettings, UploadSettings, CONFIG_FILE_NAME,
};
pub use error::{
    ConfigError, ConfigResult, PersistenceError, PersistenceResult, SettingsError, SettingsResult,
};
pub use persistence::{SelectedView, ViewState, ViewStatePersistence, VIEW_STATE_FILE_NAME};

/// Directory holding every mkremote file, e.g. `~/.config/mkremote`
pub fn config_dir() -> ConfigResult<std::path::PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("mkremote"))
        .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
}
