//! Typed client for the controller bridge
//!
//! [`MachineClient`] sits on top of a [`MachineApi`] and knows the endpoint
//! layout, the status envelope and which channel each request belongs to.
//! Mutating requests on the command and queue channels go through their
//! channel's single-flight gate; status reads and uploads do not.

use std::sync::Arc;

use mkremote_core::{
    ApiError, Endpoints, FileListing, FileQueue, MachineCommand, RequestChannel, StatusSnapshot,
};
use serde_json::{json, Value};

use crate::transport::{reject_error_body, FileUpload, MachineApi, SingleFlight};
use crate::upload::UploadPolicy;

/// Typed access to every bridge endpoint
pub struct MachineClient {
    api: Arc<dyn MachineApi>,
    endpoints: Endpoints,
    upload_policy: UploadPolicy,
    command_gate: SingleFlight,
    queue_gate: SingleFlight,
}

impl MachineClient {
    /// Create a client with the default endpoint layout and upload policy
    pub fn new(api: Arc<dyn MachineApi>) -> Self {
        Self::with_options(api, Endpoints::default(), UploadPolicy::default())
    }

    /// Create a client with explicit endpoints and upload policy
    pub fn with_options(
        api: Arc<dyn MachineApi>,
        endpoints: Endpoints,
        upload_policy: UploadPolicy,
    ) -> Self {
        Self {
            api,
            endpoints,
            upload_policy,
            command_gate: SingleFlight::new(RequestChannel::Command),
            queue_gate: SingleFlight::new(RequestChannel::Queue),
        }
    }

    /// Endpoint layout in use
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Upload allow-list in use
    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    /// Check if a channel has a request outstanding
    pub fn is_busy(&self, channel: RequestChannel) -> bool {
        self.gate(channel).is_some_and(SingleFlight::is_busy)
    }

    fn gate(&self, channel: RequestChannel) -> Option<&SingleFlight> {
        match channel {
            RequestChannel::Command => Some(&self.command_gate),
            RequestChannel::Queue => Some(&self.queue_gate),
            RequestChannel::Status | RequestChannel::Upload => None,
        }
    }

    /// Fetch and decode one status snapshot
    pub async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
        let body = self.api.get_json(&self.endpoints.status).await?;
        decode_status(body)
    }

    /// POST `payload` to `path` on `channel`
    ///
    /// Fails with [`ApiError::RequestInFlight`] without touching the network
    /// if the channel is busy. The gate is released however the request ends.
    pub async fn send_command(
        &self,
        channel: RequestChannel,
        path: &str,
        payload: Value,
    ) -> Result<Value, ApiError> {
        let _guard = self.gate(channel).map(SingleFlight::try_acquire).transpose()?;
        self.api.post_json(path, payload).await
    }

    /// Validate and send a typed command on the command channel
    pub async fn execute(&self, command: &MachineCommand) -> Result<Value, ApiError> {
        command.validate()?;
        tracing::debug!("Executing {}", command.name());
        self.send_command(
            RequestChannel::Command,
            command.endpoint(&self.endpoints),
            command.payload(),
        )
        .await
    }

    /// Acknowledge a pending tool change
    pub async fn toolchange(&self) -> Result<Value, ApiError> {
        let _guard = self.command_gate.try_acquire()?;
        self.api.get_json(&self.endpoints.toolchange).await
    }

    /// Upload a file after checking its extension
    pub async fn upload_file(&self, file: FileUpload) -> Result<Value, ApiError> {
        self.upload_policy.validate(&file.file_name)?;
        self.api.upload(&self.endpoints.file_upload, file).await
    }

    /// Fetch the file listing and the persisted queue
    pub async fn fetch_files(&self) -> Result<FileListing, ApiError> {
        let body = self.api.get_json(&self.endpoints.files).await?;
        FileListing::from_value(body)
    }

    /// Replace the persisted queue with `queue`
    pub async fn update_file_queue(&self, queue: &FileQueue) -> Result<Value, ApiError> {
        self.send_command(
            RequestChannel::Queue,
            &self.endpoints.update_file_queue,
            json!({ "new_queue": queue }),
        )
        .await
    }

    /// Load `file` into the controller, or clear the loaded file with `None`
    pub async fn open_file(&self, file: Option<&str>) -> Result<Value, ApiError> {
        self.send_command(
            RequestChannel::Queue,
            &self.endpoints.open_file,
            json!({ "name": file.unwrap_or_default() }),
        )
        .await
    }
}

impl std::fmt::Debug for MachineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineClient")
            .field("endpoints", &self.endpoints)
            .field("command_busy", &self.command_gate.is_busy())
            .field("queue_busy", &self.queue_gate.is_busy())
            .finish()
    }
}

/// Decode a status response
///
/// Accepts `{machineStatus: {...}}`, a bare status object, `{error: "..."}`
/// and `{errors: ...}`.
pub fn decode_status(body: Value) -> Result<StatusSnapshot, ApiError> {
    let body = reject_error_body(body, None)?;
    match body {
        Value::Object(mut map) if map.contains_key("machineStatus") => {
            let status = map.remove("machineStatus").unwrap_or_default();
            StatusSnapshot::from_value(status)
        }
        Value::Object(_) => StatusSnapshot::from_value(body),
        other => Err(ApiError::malformed(format!(
            "expected a status object, got {}",
            other
        ))),
    }
}
