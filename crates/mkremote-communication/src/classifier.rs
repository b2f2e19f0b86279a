//! Error classifier
//!
//! Maps any [`ApiError`] onto an [`OperationalCondition`]. The mapping is
//! total: every error, including an empty or garbled one, lands on exactly
//! one condition. Rules are applied in order; the first match wins.

use mkremote_core::{ApiError, OperationalCondition};

/// Fragments meaning the controller process behind the bridge is not running
pub const CONTROLLER_OFFLINE_MARKERS: [&str; 2] = ["emcstatusbuffer invalid", "not running"];

/// Fragment meaning the request itself never got through
pub const SERVICE_DOWN_MARKER: &str = "failed to fetch";

/// HTTP status of a rejected credential
pub const UNAUTHORIZED_STATUS: u16 = 403;

/// Classify a transport error
pub fn classify(error: &ApiError) -> OperationalCondition {
    let message = error.to_string();
    if error.is_network() && !is_controller_offline(&message) {
        return OperationalCondition::ServiceDown;
    }
    classify_message(error.status(), &message)
}

/// Classify a raw status/message pair
pub fn classify_message(status: Option<u16>, message: &str) -> OperationalCondition {
    if is_controller_offline(message) {
        OperationalCondition::ControllerOffline
    } else if message.to_lowercase().contains(SERVICE_DOWN_MARKER) {
        OperationalCondition::ServiceDown
    } else if status == Some(UNAUTHORIZED_STATUS) {
        OperationalCondition::Unauthorized
    } else {
        OperationalCondition::UnknownError(message.to_string())
    }
}

fn is_controller_offline(message: &str) -> bool {
    let message = message.to_lowercase();
    CONTROLLER_OFFLINE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
