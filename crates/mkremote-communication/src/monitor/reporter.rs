//! Transient error reporting
//!
//! Shared by the poll loop and the user-facing controls: classify a failure,
//! and if it is not a latched condition put it on the displayed error list.

use std::sync::Arc;

use mkremote_core::{
    AnnouncedError, ApiError, AppEvent, ErrorAnnouncer, ErrorEvent, EventBus, OperationalCondition,
    ValidationError,
};
use parking_lot::Mutex;

use crate::classifier::classify;

/// Classifies failures and keeps the displayed error list
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    announcer: Arc<Mutex<ErrorAnnouncer>>,
    bus: Arc<EventBus>,
}

impl ErrorReporter {
    /// Create a reporter publishing on `bus`
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            announcer: Arc::new(Mutex::new(ErrorAnnouncer::new())),
            bus,
        }
    }

    /// Classify `error`; transient ones are announced
    pub fn report(&self, error: &ApiError) -> OperationalCondition {
        let condition = classify(error);
        if let OperationalCondition::UnknownError(message) = &condition {
            tracing::warn!("{}", message);
            self.announce(message.clone());
        }
        condition
    }

    /// Put a message on the displayed list unless it is already there
    pub fn announce(&self, message: String) {
        let index = self.announcer.lock().announce(message.clone());
        if let Some(index) = index {
            self.bus
                .publish(AppEvent::Error(ErrorEvent::Announced { index, message }))
                .ok();
        }
    }

    /// Remove a displayed message
    pub fn dismiss(&self, index: usize) -> Result<AnnouncedError, ValidationError> {
        let dismissed = self.announcer.lock().dismiss(index)?;
        self.bus
            .publish(AppEvent::Error(ErrorEvent::Dismissed {
                index,
                message: dismissed.message.clone(),
            }))
            .ok();
        Ok(dismissed)
    }

    /// Displayed messages, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.announcer.lock().messages()
    }
}
