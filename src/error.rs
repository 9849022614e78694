//! Error types for the aliyundrive_open crate.

use thiserror::Error;

/// Errors that can occur when talking to the Aliyun Drive open API.
#[derive(Error, Debug)]
pub enum DriveError {
    /// A required input was missing; no request was sent.
    #[error("Missing required input: {0}")]
    Precondition(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The vendor answered with an error envelope (`code`/`message`).
    #[error("{message} (code: {code})")]
    Service {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Upload of part {part_number} failed ({status}): {message}")]
    PartUpload {
        part_number: u32,
        status: u16,
        message: String,
    },

    /// Per-item failures collected by a batch operation, as `<file_id>:<error>`.
    #[error("Batch operation failed for {} item(s): {}", .0.len(), .0.join(","))]
    PartialBatch(Vec<String>),

    #[error("File {file_id} ({name:?}) does not contain {pattern:?}")]
    NoMatch {
        file_id: String,
        name: String,
        pattern: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    pub(crate) fn precondition(what: impl Into<String>) -> Self {
        DriveError::Precondition(what.into())
    }

    /// The vendor error code, if this is a service error.
    pub fn service_code(&self) -> Option<&str> {
        match self {
            DriveError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
