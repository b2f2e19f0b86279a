//! Persisted view state
//!
//! Remembers which view the operator had open so the next start lands on
//! it again. A missing or unreadable file is never an error on load; the
//! default view is used instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceResult, SettingsResult};

/// File name of the view state inside the config directory
pub const VIEW_STATE_FILE_NAME: &str = "view_state.json";

/// Top-level view of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectedView {
    /// Machine controller view
    #[default]
    Controller,
    /// File manager and queue view
    FileManager,
}

impl std::fmt::Display for SelectedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Controller => write!(f, "controller"),
            Self::FileManager => write!(f, "file manager"),
        }
    }
}

/// Everything persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    /// Last selected view
    pub view: SelectedView,
}

/// JSON file store for [`ViewState`]
#[derive(Debug, Clone)]
pub struct ViewStatePersistence {
    path: PathBuf,
}

impl ViewStatePersistence {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default config directory
    pub fn in_config_dir() -> SettingsResult<Self> {
        Ok(Self::new(crate::config_dir()?.join(VIEW_STATE_FILE_NAME)))
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, falling back to the default
    pub fn load(&self) -> ViewState {
        match self.try_load() {
            Ok(Some(state)) => state,
            Ok(None) => ViewState::default(),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable view state {}: {}",
                    self.path.display(),
                    e
                );
                ViewState::default()
            }
        }
    }

    /// Persist the state, creating the directory if needed
    pub fn save(&self, state: &ViewState) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    }

    fn try_load(&self) -> PersistenceResult<Option<ViewState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
