//! Operator-facing error list
//!
//! Transient errors are shown in a dismissible list. A message that is
//! already on the list is not added a second time; once the operator
//! dismisses it, the same message may be announced again.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;

/// One entry of the displayed error list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncedError {
    /// The message as shown
    pub message: String,
    /// When it was first announced
    pub announced_at: DateTime<Utc>,
    /// How many times it was reported while displayed
    pub occurrences: u32,
}

/// Deduplicating list of displayed error messages
#[derive(Debug, Clone, Default)]
pub struct ErrorAnnouncer {
    displayed: Vec<AnnouncedError>,
}

impl ErrorAnnouncer {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a message
    ///
    /// Returns the index of the new entry, or `None` if the message is
    /// already displayed.
    pub fn announce(&mut self, message: impl Into<String>) -> Option<usize> {
        let message = message.into();
        if let Some(existing) = self.displayed.iter_mut().find(|e| e.message == message) {
            existing.occurrences = existing.occurrences.saturating_add(1);
            return None;
        }

        self.displayed.push(AnnouncedError {
            message,
            announced_at: Utc::now(),
            occurrences: 1,
        });
        Some(self.displayed.len() - 1)
    }

    /// Remove the entry at `index`
    pub fn dismiss(&mut self, index: usize) -> Result<AnnouncedError, ValidationError> {
        if index >= self.displayed.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.displayed.len(),
            });
        }
        Ok(self.displayed.remove(index))
    }

    /// Check if a message is currently displayed
    pub fn is_displayed(&self, message: &str) -> bool {
        self.displayed.iter().any(|e| e.message == message)
    }

    /// Displayed entries, oldest first
    pub fn entries(&self) -> &[AnnouncedError] {
        &self.displayed
    }

    /// Displayed messages, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.displayed.iter().map(|e| e.message.clone()).collect()
    }

    /// Number of displayed entries
    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    /// Check if nothing is displayed
    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }
}
