//! Configuration for mkremote
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, chosen by file extension.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (bridge URL, credential, timeout)
//! - Polling intervals
//! - Endpoint paths
//! - Upload allow-list
//! - Jog defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use mkremote_communication::upload::DEFAULT_ALLOWED_EXTENSIONS;
use mkremote_communication::{PollIntervals, TransportConfig, UploadPolicy};
use mkremote_core::{Endpoints, JogRequest};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SettingsResult};

/// Default configuration file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Bridge base URL
    pub base_url: String,
    /// Credential sent with every request except uploads
    pub api_key: Option<String>,
    /// Header carrying the credential
    pub api_key_header: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_key: None,
            api_key_header: "API_KEY".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Polling intervals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Interval while the machine moves, in milliseconds
    pub fast_interval_ms: u64,
    /// Interval while the machine is stationary, in milliseconds
    pub slow_interval_ms: u64,
    /// Interval while a latched condition is active, in milliseconds
    pub backoff_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            fast_interval_ms: 200,
            slow_interval_ms: 2000,
            backoff_interval_ms: 50_000,
        }
    }
}

/// Upload settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Extensions that may be uploaded
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Jog defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JogSettings {
    /// Jog speed sent with every jog
    pub speed: f64,
    /// Multiplier applied to each requested increment
    pub increment_multiplier: f64,
}

impl Default for JogSettings {
    fn default() -> Self {
        Self {
            speed: 10.0,
            increment_multiplier: 1.0,
        }
    }
}

impl JogSettings {
    /// Build a jog for `axis` with the configured speed and multiplier
    pub fn request(&self, axis: u32, increment: f64) -> JogRequest {
        JogRequest {
            axis,
            speed: self.speed,
            increment: increment * self.increment_multiplier,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Polling intervals
    pub polling: PollingSettings,
    /// Endpoint paths
    pub endpoints: Endpoints,
    /// Upload allow-list
    pub upload: UploadSettings,
    /// Jog defaults
    pub jog: JogSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location
    pub fn default_path() -> SettingsResult<PathBuf> {
        Ok(crate::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.base_url.trim().is_empty() {
            return Err(ConfigError::MissingKey("connection.base_url".to_string()));
        }
        if self.connection.api_key_header.trim().is_empty() {
            return Err(ConfigError::MissingKey(
                "connection.api_key_header".to_string(),
            ));
        }
        if self.connection.timeout_ms == 0 {
            return Err(out_of_range("connection.timeout_ms", 0));
        }

        let polling = &self.polling;
        for (key, value) in [
            ("polling.fast_interval_ms", polling.fast_interval_ms),
            ("polling.slow_interval_ms", polling.slow_interval_ms),
            ("polling.backoff_interval_ms", polling.backoff_interval_ms),
        ] {
            if value == 0 {
                return Err(out_of_range(key, value));
            }
        }
        if polling.fast_interval_ms > polling.slow_interval_ms {
            return Err(out_of_range(
                "polling.fast_interval_ms",
                polling.fast_interval_ms,
            ));
        }

        for (name, path) in self.endpoints.iter() {
            if !path.starts_with('/') {
                return Err(ConfigError::ValueOutOfRange {
                    key: format!("endpoints.{}", name),
                    value: path.to_string(),
                });
            }
        }

        if self.upload_policy().allowed_extensions().is_empty() {
            return Err(ConfigError::MissingKey(
                "upload.allowed_extensions".to_string(),
            ));
        }

        for (key, value) in [
            ("jog.speed", self.jog.speed),
            ("jog.increment_multiplier", self.jog.increment_multiplier),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(out_of_range(key, value));
            }
        }

        Ok(())
    }

    /// Transport parameters for the HTTP client
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.connection.base_url.trim_end_matches('/').to_string(),
            api_key: self
                .connection
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            api_key_header: self.connection.api_key_header.clone(),
            timeout: Duration::from_millis(self.connection.timeout_ms),
        }
    }

    /// Poll intervals for the monitor
    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            fast: Duration::from_millis(self.polling.fast_interval_ms),
            slow: Duration::from_millis(self.polling.slow_interval_ms),
            backoff: Duration::from_millis(self.polling.backoff_interval_ms),
        }
    }

    /// Upload allow-list
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(&self.upload.allowed_extensions)
    }
}

fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
