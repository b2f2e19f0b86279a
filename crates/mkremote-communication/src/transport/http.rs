//! HTTP transport over reqwest

use std::time::Duration;

use async_trait::async_trait;
use mkremote_core::ApiError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::{reject_error_body, FileUpload, MachineApi};

/// Connection parameters for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bridge base URL, e.g. `http://beaglebone.local:5000`
    pub base_url: String,
    /// Opaque credential sent on every non-upload request
    pub api_key: Option<String>,
    /// Header carrying the credential
    pub api_key_header: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_key: None,
            api_key_header: "API_KEY".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// [`MachineApi`] implementation talking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    auth_headers: HeaderMap,
}

impl HttpTransport {
    /// Build the transport and its HTTP client
    pub fn new(config: TransportConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        let mut auth_headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            match (
                HeaderName::from_bytes(config.api_key_header.as_bytes()),
                HeaderValue::from_str(key),
            ) {
                (Ok(name), Ok(mut value)) => {
                    value.set_sensitive(true);
                    auth_headers.insert(name, value);
                }
                _ => tracing::warn!(
                    "Ignoring unusable credential header '{}'",
                    config.api_key_header
                ),
            }
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_headers,
        })
    }

    /// Absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn finish(&self, url: &str, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| network(url, &e))?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => body,
                Err(_) if !status.is_success() => {
                    return Err(ApiError::HttpStatus {
                        status: status.as_u16(),
                        message: String::from_utf8_lossy(&bytes).trim().to_string(),
                    })
                }
                Err(e) => return Err(ApiError::malformed(e.to_string())),
            }
        };

        let body = reject_error_body(body, Some(status.as_u16()))?;
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string()),
            });
        }
        Ok(body)
    }
}

fn network(url: &str, err: &reqwest::Error) -> ApiError {
    ApiError::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl MachineApi for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers.clone())
            .send()
            .await
            .map_err(|e| network(&url, &e))?;
        self.finish(&url, response).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!("POST {} {}", url, body);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| network(&url, &e))?;
        self.finish(&url, response).await
    }

    async fn upload(&self, path: &str, file: FileUpload) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!("UPLOAD {} ({} bytes) -> {}", file.file_name, file.bytes.len(), url);
        let form = Form::new().part("file", Part::bytes(file.bytes).file_name(file.file_name));
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| network(&url, &e))?;
        self.finish(&url, response).await
    }
}
