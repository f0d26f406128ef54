//! Client-side download of an extraction result.
//!
//! Serializes the stored result verbatim as pretty-printed JSON. The file
//! name combines the source file's base name with a millisecond timestamp,
//! so repeated exports of the same entry never collide.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::models::entry::{EntryStatus, FileEntry};
use crate::queue::QueueError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Entry is not finished: {0}")]
    NotReady(EntryStatus),

    #[error("No result to export")]
    NoResult,

    #[error("JSON serialization error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Base name for the export: source name with a trailing `.pdf` removed.
fn base_name(file_name: &str) -> &str {
    let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
    if stem.is_empty() {
        "result"
    } else {
        stem
    }
}

/// Export file name: `extraction_{basename}_{timestamp}.json`.
pub fn export_file_name(file_name: &str, timestamp_millis: i64) -> String {
    format!("extraction_{}_{}.json", base_name(file_name), timestamp_millis)
}

/// Write the entry's result as pretty-printed UTF-8 JSON into `dir`.
/// Only finished (`done`) entries can be exported.
pub fn export_result(entry: &FileEntry, dir: &Path) -> Result<PathBuf, ExportError> {
    if entry.status != EntryStatus::Done {
        return Err(ExportError::NotReady(entry.status));
    }
    let result = entry.result.as_ref().ok_or(ExportError::NoResult)?;
    let pretty =
        serde_json::to_string_pretty(result).map_err(|e| ExportError::Json(e.to_string()))?;

    let path = dir.join(export_file_name(
        &entry.file_name,
        Utc::now().timestamp_millis(),
    ));
    std::fs::write(&path, pretty)?;

    tracing::info!(file = %path.display(), "Extraction result exported");
    Ok(path)
}
