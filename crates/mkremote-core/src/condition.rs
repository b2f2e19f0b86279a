//! Operational conditions
//!
//! A condition is derived from the outcome of the latest request, never
//! stored on the wire. It drives both the polling cadence and the view mode
//! the presentation layer switches into.

use serde::{Deserialize, Serialize};

/// How a condition affects the polling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Fast/slow selection from snapshot diffing
    Adaptive,
    /// Switch to the long backoff interval
    Long,
    /// Leave the current interval untouched
    KeepCurrent,
}

/// Polling cadence of the status loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollMode {
    /// Short interval: machine moving or a command was just issued
    Fast,
    /// Long interval: machine stationary
    Slow,
    /// Long backoff: a latched condition is active
    Backoff,
}

impl std::fmt::Display for PollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Slow => write!(f, "slow"),
            Self::Backoff => write!(f, "backoff"),
        }
    }
}

/// Operational condition of the remote link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationalCondition {
    /// Everything answered normally
    #[default]
    Nominal,
    /// The bridge service could not be reached
    ServiceDown,
    /// The bridge is up but the machine controller process is not running
    ControllerOffline,
    /// The credential was rejected
    Unauthorized,
    /// Any other failure, carrying its message
    UnknownError(String),
}

impl OperationalCondition {
    /// Latched conditions persist across polls until a successful poll
    pub fn is_latched(&self) -> bool {
        matches!(
            self,
            Self::ServiceDown | Self::ControllerOffline | Self::Unauthorized
        )
    }

    /// Check if the link is healthy
    pub fn is_nominal(&self) -> bool {
        matches!(self, Self::Nominal)
    }

    /// Polling policy attached to this condition
    pub fn backoff(&self) -> BackoffPolicy {
        match self {
            Self::Nominal => BackoffPolicy::Adaptive,
            Self::ServiceDown | Self::ControllerOffline | Self::Unauthorized => {
                BackoffPolicy::Long
            }
            Self::UnknownError(_) => BackoffPolicy::KeepCurrent,
        }
    }

    /// Short machine-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::ServiceDown => "service-down",
            Self::ControllerOffline => "controller-offline",
            Self::Unauthorized => "not-authorized",
            Self::UnknownError(_) => "error",
        }
    }
}

impl std::fmt::Display for OperationalCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nominal => write!(f, "Nominal"),
            Self::ServiceDown => write!(f, "Server is down, please start the server"),
            Self::ControllerOffline => write!(
                f,
                "Machine controller is offline, start it and then restart the server"
            ),
            Self::Unauthorized => write!(f, "Not authorized"),
            Self::UnknownError(msg) => write!(f, "Error: {}", msg),
        }
    }
}
