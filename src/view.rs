//! State → display mapping for the two surfaces a front end renders: the
//! file list rows and the detail pane.
//!
//! Pure functions over the session. Nothing here touches the network or
//! the filesystem, so every visual state is testable in isolation.

use serde::{Deserialize, Serialize};

use crate::models::entry::{EntryStatus, FileEntry};
use crate::queue::session::Session;

/// Neutral prompt when nothing is selected.
pub const SELECT_PROMPT: &str = "Select a file to extract data";
/// Empty-state and timing text for a queued entry.
pub const WAITING_LABEL: &str = "Waiting to process...";
pub const PROCESSING_LABEL: &str = "Processing...";
pub const FAILED_LABEL: &str = "Failed";

/// One row in the file list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRow {
    pub id: String,
    pub file_name: String,
    pub status: EntryStatus,
    pub status_label: String,
    pub active: bool,
}

/// What the preview surface shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewState {
    /// Nothing loaded; the empty state is visible.
    EmptyState,
    /// The named document is loaded in the embedded viewer.
    Document { file_name: String },
}

/// Color tone of the output area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonTone {
    Normal,
    Alert,
}

/// Rendered content of the output area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonArea {
    pub text: String,
    pub tone: JsonTone,
}

/// Display state of the detail pane, derived from the active entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPane {
    pub preview: PreviewState,
    pub loader_visible: bool,
    /// Prompt text when the output area has nothing to show.
    pub empty_state_text: Option<String>,
    pub json_area: Option<JsonArea>,
    pub download_visible: bool,
    pub timing_label: String,
}

impl DetailPane {
    /// Neutral pane shown when no entry is selected.
    pub fn neutral() -> Self {
        Self {
            preview: PreviewState::EmptyState,
            loader_visible: false,
            empty_state_text: Some(SELECT_PROMPT.to_string()),
            json_area: None,
            download_visible: false,
            timing_label: String::new(),
        }
    }
}

/// List-row label for a status.
pub fn status_label(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Pending => "Pending",
        EntryStatus::Processing => "Processing...",
        EntryStatus::Done => "Success",
        EntryStatus::Error => "Failed",
    }
}

/// Map the session's entries to list rows, in queue order.
pub fn file_rows(session: &Session) -> Vec<FileRow> {
    session
        .entries()
        .iter()
        .map(|entry| FileRow {
            id: entry.id.clone(),
            file_name: entry.file_name.clone(),
            status: entry.status,
            status_label: status_label(entry.status).to_string(),
            active: session.active_id() == Some(entry.id.as_str()),
        })
        .collect()
}

/// Map the active entry, if any, to the detail pane.
pub fn detail_pane(session: &Session) -> DetailPane {
    match session.active_entry() {
        Some(entry) => pane_for(entry),
        None => DetailPane::neutral(),
    }
}

fn pane_for(entry: &FileEntry) -> DetailPane {
    let preview = PreviewState::Document {
        file_name: entry.file_name.clone(),
    };

    match entry.status {
        EntryStatus::Pending => DetailPane {
            preview,
            loader_visible: false,
            empty_state_text: Some(WAITING_LABEL.to_string()),
            json_area: None,
            download_visible: false,
            timing_label: WAITING_LABEL.to_string(),
        },
        EntryStatus::Processing => DetailPane {
            preview,
            loader_visible: true,
            empty_state_text: None,
            json_area: None,
            download_visible: false,
            timing_label: PROCESSING_LABEL.to_string(),
        },
        EntryStatus::Done => DetailPane {
            preview,
            loader_visible: false,
            empty_state_text: None,
            json_area: Some(JsonArea {
                text: pretty_json(entry.result.as_ref()),
                tone: JsonTone::Normal,
            }),
            download_visible: true,
            timing_label: format!(
                "Processed in {:.2}s",
                entry.duration_secs.unwrap_or_default()
            ),
        },
        EntryStatus::Error => DetailPane {
            preview,
            loader_visible: false,
            empty_state_text: None,
            json_area: Some(JsonArea {
                text: format!("Error: {}", entry.error.clone().unwrap_or_default()),
                tone: JsonTone::Alert,
            }),
            download_visible: false,
            timing_label: FAILED_LABEL.to_string(),
        },
    }
}

fn pretty_json(value: Option<&serde_json::Value>) -> String {
    value
        .and_then(|v| serde_json::to_string_pretty(v).ok())
        .unwrap_or_default()
}
