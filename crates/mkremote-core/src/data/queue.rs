//! File queue model
//!
//! The ordered list of files waiting to run. Position is implicit: an entry's
//! index is its place in line, index 0 is the queue head.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ValidationError};

/// Ordered queue of file identifiers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileQueue(Vec<String>);

impl FileQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Next file to run
    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Number of queued files
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Queued files in order
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Append a file to the end of the queue
    pub fn push(&mut self, file: impl Into<String>) -> Result<(), ValidationError> {
        let file = file.into();
        if file.trim().is_empty() {
            return Err(ValidationError::EmptyInput {
                field: "file name".to_string(),
            });
        }
        self.0.push(file);
        Ok(())
    }

    /// Remove the entry at `index`
    pub fn remove(&mut self, index: usize) -> Result<String, ValidationError> {
        if index >= self.0.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(self.0.remove(index))
    }

    /// Remove and return the head
    pub fn pop_head(&mut self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        }
    }

    /// Replace the order; `new_order` must hold exactly the queued files
    pub fn reorder(&mut self, new_order: Vec<String>) -> Result<(), ValidationError> {
        let mut current = self.0.clone();
        let mut proposed = new_order.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(ValidationError::NotAPermutation);
        }
        self.0 = new_order;
        Ok(())
    }
}

impl From<Vec<String>> for FileQueue {
    fn from(files: Vec<String>) -> Self {
        Self(files)
    }
}

impl<'a> IntoIterator for &'a FileQueue {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A file known to the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerFile {
    /// File identifier (last column of the listing row)
    pub name: String,
    /// Remaining columns of the row, stringified
    pub details: Vec<String>,
}

/// Response of the file listing endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FileListing {
    /// Persisted server-side queue
    pub queue: FileQueue,
    /// Files stored on the bridge
    pub files: Vec<ServerFile>,
}

#[derive(Deserialize)]
struct ListingWire {
    #[serde(default)]
    file_queue: Vec<String>,
    #[serde(default)]
    result: Vec<Vec<serde_json::Value>>,
}

impl FileListing {
    /// Decode `{file_queue: [...], result: [[..., fileId], ...]}`
    pub fn from_value(value: serde_json::Value) -> Result<Self, ApiError> {
        let wire: ListingWire = serde_json::from_value(value)
            .map_err(|e| ApiError::malformed(format!("invalid file listing: {}", e)))?;

        let files = wire
            .result
            .into_iter()
            .filter_map(|mut row| {
                let name = value_to_string(row.pop()?);
                let details = row.into_iter().map(value_to_string).collect();
                Some(ServerFile { name, details })
            })
            .collect();

        Ok(Self {
            queue: FileQueue::from(wire.file_queue),
            files,
        })
    }

    /// Check if the bridge knows a file
    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
