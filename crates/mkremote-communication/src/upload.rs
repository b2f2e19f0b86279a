//! Upload validation
//!
//! Only machine-code files may be uploaded. The check runs before any
//! request is built.

use mkremote_core::ValidationError;

/// Extensions accepted by default
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["nc", "ngc", "gcode"];

/// Allow-list of uploadable file extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS)
    }
}

impl UploadPolicy {
    /// Create a policy; extensions are compared case-insensitively, with or
    /// without a leading dot
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: allowed
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Accepted extensions
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Check that `file_name` may be uploaded
    pub fn validate(&self, file_name: &str) -> Result<(), ValidationError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ValidationError::EmptyInput {
                field: "file name".to_string(),
            });
        }

        let accepted = file_name
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.allowed_extensions.contains(&ext));

        if accepted {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedExtension {
                file: file_name.to_string(),
                allowed: self.allowed_extensions.clone(),
            })
        }
    }
}
