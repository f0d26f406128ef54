//! Entry types for the upload queue.
//!
//! A `FileEntry` tracks one user-selected PDF through its processing
//! lifecycle: Pending → Processing → Done | Error. Done and Error are
//! terminal; an entry never leaves them.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════
// Status
// ═══════════════════════════════════════════

/// Lifecycle state of a queued file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Done and Error accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn all() -> &'static [EntryStatus] {
        &[Self::Pending, Self::Processing, Self::Done, Self::Error]
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Entry
// ═══════════════════════════════════════════

/// Generate an entry id: enqueue-time millis plus a random hex suffix.
/// Uniqueness only needs to hold within one session.
pub fn new_entry_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::random();
    format!("{millis}-{suffix:08x}")
}

/// Round elapsed seconds to the two-decimal precision the UI shows.
pub fn round_duration(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// One user-selected PDF tracked through its processing lifecycle.
///
/// `result` and `error` are mutually exclusive and both unset while the
/// entry is pending or processing; `duration_secs` is set only on Done.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: String,
    pub file_name: String,
    /// Declared content type from the selection (always application/pdf
    /// after intake filtering).
    pub mime_type: String,
    pub size_bytes: u64,
    pub queued_at: NaiveDateTime,
    pub status: EntryStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub duration_secs: Option<f64>,
    bytes: Vec<u8>,
}

impl FileEntry {
    pub fn new(file_name: String, mime_type: String, bytes: Vec<u8>) -> Self {
        Self {
            id: new_entry_id(),
            file_name,
            mime_type,
            size_bytes: bytes.len() as u64,
            queued_at: Utc::now().naive_utc(),
            status: EntryStatus::Pending,
            result: None,
            error: None,
            duration_secs: None,
            bytes,
        }
    }

    /// Raw payload, owned exclusively by this entry.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
