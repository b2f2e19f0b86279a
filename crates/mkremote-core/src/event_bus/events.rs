//! Events published by the status monitor.
//!
//! Events are what the presentation layer hears about: condition changes,
//! fresh snapshots, queue changes and announced errors. They are cloneable
//! and serializable for logging.

use serde::{Deserialize, Serialize};

use crate::condition::{OperationalCondition, PollMode};
use crate::data::SnapshotField;

/// Root event enum for all client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Link health and polling cadence
    Link(LinkEvent),
    /// Machine status
    Machine(MachineEvent),
    /// File queue and loaded file
    Queue(QueueEvent),
    /// Operator-facing error list
    Error(ErrorEvent),
}

impl AppEvent {
    /// Category used by [`EventFilter`](super::EventFilter)
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Link(_) => EventCategory::Link,
            AppEvent::Machine(_) => EventCategory::Machine,
            AppEvent::Queue(_) => EventCategory::Queue,
            AppEvent::Error(_) => EventCategory::Error,
        }
    }

    /// One-line summary for log output
    pub fn description(&self) -> String {
        match self {
            AppEvent::Link(e) => e.description(),
            AppEvent::Machine(e) => e.description(),
            AppEvent::Queue(e) => e.description(),
            AppEvent::Error(e) => e.description(),
        }
    }
}

/// Coarse grouping of events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Link health and polling cadence events.
    Link,
    /// Machine status events.
    Machine,
    /// File queue events.
    Queue,
    /// Error list events.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Link => write!(f, "Link"),
            EventCategory::Machine => write!(f, "Machine"),
            EventCategory::Queue => write!(f, "Queue"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// Link health events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkEvent {
    /// The operational condition changed.
    ConditionChanged {
        /// Condition before the poll.
        from: OperationalCondition,
        /// Condition after the poll.
        to: OperationalCondition,
    },
    /// The poll loop switched cadence.
    PollModeChanged {
        /// Previous cadence.
        from: PollMode,
        /// New cadence.
        to: PollMode,
        /// Delay before the next poll, in milliseconds.
        interval_ms: u64,
    },
}

impl LinkEvent {
    fn description(&self) -> String {
        match self {
            LinkEvent::ConditionChanged { from, to } => {
                format!("Condition: {} -> {}", from.label(), to.label())
            }
            LinkEvent::PollModeChanged {
                from,
                to,
                interval_ms,
            } => format!("Polling: {} -> {} ({} ms)", from, to, interval_ms),
        }
    }
}

/// Machine status events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// A new snapshot replaced the previous one.
    StatusUpdated {
        /// Field groups that differ from the previous snapshot.
        changed: Vec<SnapshotField>,
    },
    /// The run state entered `DONE`.
    ProgramCompleted {
        /// File that was loaded when the program finished.
        file: Option<String>,
    },
    /// A command was accepted by the bridge.
    CommandAccepted {
        /// Endpoint the command was posted to.
        endpoint: String,
    },
}

impl MachineEvent {
    fn description(&self) -> String {
        match self {
            MachineEvent::StatusUpdated { changed } if changed.is_empty() => {
                "Status unchanged".to_string()
            }
            MachineEvent::StatusUpdated { changed } => format!("Status changed: {:?}", changed),
            MachineEvent::ProgramCompleted { file } => match file {
                Some(file) => format!("Program completed: {}", file),
                None => "Program completed".to_string(),
            },
            MachineEvent::CommandAccepted { endpoint } => format!("Command accepted: {}", endpoint),
        }
    }
}

/// File queue events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueueEvent {
    /// The local queue changed and was pushed to the bridge.
    Synced {
        /// Queue contents after the change.
        files: Vec<String>,
    },
    /// The local queue changed but the push failed; it will be retried.
    SyncDeferred {
        /// Queue contents after the change.
        files: Vec<String>,
        /// Why the push failed.
        reason: String,
    },
    /// A file was loaded into the controller, or the loaded file was cleared.
    FileOpened {
        /// The loaded file, `None` when cleared.
        file: Option<String>,
    },
    /// A file was uploaded to the bridge.
    FileUploaded {
        /// Uploaded file name.
        file: String,
    },
}

impl QueueEvent {
    fn description(&self) -> String {
        match self {
            QueueEvent::Synced { files } => format!("Queue synced ({} files)", files.len()),
            QueueEvent::SyncDeferred { files, reason } => {
                format!("Queue sync deferred ({} files): {}", files.len(), reason)
            }
            QueueEvent::FileOpened { file: Some(file) } => format!("Opened: {}", file),
            QueueEvent::FileOpened { file: None } => "Loaded file cleared".to_string(),
            QueueEvent::FileUploaded { file } => format!("Uploaded: {}", file),
        }
    }
}

/// Operator-facing error list events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorEvent {
    /// A message was added to the displayed list.
    Announced {
        /// Position in the displayed list.
        index: usize,
        /// The message.
        message: String,
    },
    /// A message was dismissed by the operator.
    Dismissed {
        /// Position it had in the displayed list.
        index: usize,
        /// The message.
        message: String,
    },
}

impl ErrorEvent {
    fn description(&self) -> String {
        match self {
            ErrorEvent::Announced { index, message } => format!("Error [{}]: {}", index, message),
            ErrorEvent::Dismissed { index, message } => {
                format!("Dismissed [{}]: {}", index, message)
            }
        }
    }

    /// The message carried by this event
    pub fn message(&self) -> &str {
        match self {
            ErrorEvent::Announced { message, .. } | ErrorEvent::Dismissed { message, .. } => {
                message
            }
        }
    }
}
