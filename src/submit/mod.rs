//! Submission protocol: one multipart POST per queued file.

pub mod client;

pub use client::{HttpSubmitClient, MockSubmitClient};

use thiserror::Error;

/// Fallback message when a failure response carries no usable detail.
pub const FALLBACK_ERROR: &str = "Upload failed";

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Cannot reach extraction service at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response. `detail` is already resolved to the server's
    /// message or the fallback, and displays alone — it is what lands in
    /// the entry's error field.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Client seam for the extraction endpoint. The queue only needs "send
/// these bytes under this name, give me JSON back".
pub trait SubmitClient: Send + Sync {
    fn submit(&self, file_name: &str, bytes: &[u8]) -> Result<serde_json::Value, SubmitError>;
}
