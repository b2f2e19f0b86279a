//! Transport layer
//!
//! [`MachineApi`] is the seam between the client and the network. Every
//! implementation folds its failures into [`ApiError`]; nothing else crosses
//! this boundary. Retries are not done here.

pub mod gate;
pub mod http;

use async_trait::async_trait;
use mkremote_core::ApiError;
use serde_json::Value;

pub use gate::{InFlightGuard, SingleFlight};
pub use http::{HttpTransport, TransportConfig};

/// A file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name as it will be stored on the bridge
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Create an upload from a name and contents
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping its base name
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }
}

/// Raw request surface of the controller bridge
#[async_trait]
pub trait MachineApi: Send + Sync {
    /// GET `path` and decode the JSON body
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    /// POST `body` as JSON to `path` and decode the JSON reply
    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError>;

    /// POST a multipart body with the file in field `file`
    async fn upload(&self, path: &str, file: FileUpload) -> Result<Value, ApiError>;
}

/// Turn a body that reports failure into an error
///
/// An `errors` key anywhere in the body means failure, whatever the HTTP
/// status said. A top-level `error` key is the status endpoint's way of
/// saying the same thing.
pub fn reject_error_body(body: Value, http_status: Option<u16>) -> Result<Value, ApiError> {
    if let Some(errors) = find_key(&body, "errors") {
        return Err(error_from_payload(errors, http_status));
    }
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        return Err(error_from_payload(error, http_status));
    }
    Ok(body)
}

fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Build a remote error from an `error`/`errors` payload
///
/// The bridge sends a plain string, a `{message, status, type}` object, or a
/// list of either.
fn error_from_payload(payload: &Value, http_status: Option<u16>) -> ApiError {
    match payload {
        Value::String(message) => ApiError::remote(message.clone(), http_status),
        Value::Object(map) => {
            let message = map
                .get("message")
                .map(value_text)
                .unwrap_or_else(|| payload.to_string());
            let status = map
                .get("status")
                .and_then(|s| s.as_u64().or_else(|| s.as_str()?.parse().ok()))
                .and_then(|s| u16::try_from(s).ok())
                .or(http_status);
            ApiError::remote(message, status)
        }
        Value::Array(items) if !items.is_empty() => {
            let messages: Vec<String> = items
                .iter()
                .map(|item| error_from_payload(item, http_status).to_string())
                .collect();
            ApiError::remote(messages.join("; "), http_status)
        }
        other => ApiError::remote(other.to_string(), http_status),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
