//! Error handling for mkremote
//!
//! Provides the error types shared by every layer of the client:
//! - Validation errors (bad local input, rejected before any request)
//! - API errors (the uniform value every transport failure is folded into)
//!
//! All error types use `thiserror` for ergonomic error handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical request channel.
///
/// Each mutating channel owns its own single-flight gate, so a slow request
/// on one channel never blocks another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestChannel {
    /// Status polling (read-only, never gated)
    Status,
    /// Machine commands issued by the operator
    Command,
    /// File-queue pushes and file opens
    Queue,
    /// File uploads
    Upload,
}

impl std::fmt::Display for RequestChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status => write!(f, "status"),
            Self::Command => write!(f, "command"),
            Self::Queue => write!(f, "queue"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// Validation error type
///
/// Raised locally, before anything is sent to the controller bridge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// File extension is not in the allow-list
    #[error("Unsupported file '{file}', allowed extensions: {}", .allowed.join(", "))]
    UnsupportedExtension {
        /// The rejected file name.
        file: String,
        /// The accepted extensions.
        allowed: Vec<String>,
    },

    /// A required input was empty
    #[error("{field} cannot be empty")]
    EmptyInput {
        /// The name of the empty field.
        field: String,
    },

    /// Queue index does not exist
    #[error("Queue index {index} out of range (queue has {len} entries)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The queue length at the time of the request.
        len: usize,
    },

    /// A reorder request did not contain exactly the queued files
    #[error("New queue order must contain exactly the queued files")]
    NotAPermutation,

    /// A numeric value is outside its accepted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// The name of the field.
        field: String,
        /// The rejected value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// A command name is not one the bridge understands
    #[error("Unknown command '{command}', expected one of: {}", .expected.join(", "))]
    UnknownCommand {
        /// The rejected command name.
        command: String,
        /// The accepted command names.
        expected: Vec<String>,
    },
}

/// API error type
///
/// Every failure of a request against the controller bridge ends up as one
/// of these values; nothing raised by the HTTP stack crosses the transport
/// boundary in any other shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never got a response (service unreachable)
    #[error("Failed to fetch {url}: {reason}")]
    Network {
        /// The requested URL.
        url: String,
        /// The underlying failure.
        reason: String,
    },

    /// Non-success HTTP status without a usable error body
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The reason phrase or raw body.
        message: String,
    },

    /// The response body carried an `errors` or `error` key
    #[error("{message}")]
    Remote {
        /// The message reported by the bridge.
        message: String,
        /// The status reported in the body, or the HTTP status.
        status: Option<u16>,
    },

    /// The response body could not be decoded
    #[error("Malformed response body: {reason}")]
    MalformedBody {
        /// The decoding failure.
        reason: String,
    },

    /// Another mutating request is still outstanding on the channel
    #[error("Request has not been processed yet ({channel} request in flight)")]
    RequestInFlight {
        /// The busy channel.
        channel: RequestChannel,
    },

    /// The file queue was never fetched from the bridge, so it cannot be pushed
    #[error("File queue has not been loaded from the server yet")]
    QueueNotLoaded,

    /// Local validation rejected the request
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// Create a remote error from a message and optional status
    pub fn remote(message: impl Into<String>, status: Option<u16>) -> Self {
        ApiError::Remote {
            message: message.into(),
            status,
        }
    }

    /// Create a malformed-body error
    pub fn malformed(reason: impl Into<String>) -> Self {
        ApiError::MalformedBody {
            reason: reason.into(),
        }
    }

    /// HTTP-level status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if this is a local single-flight rejection
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ApiError::RequestInFlight { .. })
    }

    /// Check if this is a local validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    /// Check if the request failed before reaching the service
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}

/// Main error type for mkremote
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Request against the controller bridge failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
