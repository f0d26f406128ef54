//! In-memory session state: the ordered entry list and the active selection.
//!
//! Pure state transitions, no I/O. The controller drives this and the view
//! layer reads it, which keeps the queue logic testable without a front end.
//!
//! Invariants enforced here:
//! - entries are append-only and never reordered,
//! - at most one entry is `Processing` at any time,
//! - terminal entries accept no further transitions.

use uuid::Uuid;

use super::QueueError;
use crate::models::entry::{EntryStatus, FileEntry};

/// The session: everything the queue knows between startup and exit.
/// Created empty; cleared only by dropping it.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    entries: Vec<FileEntry>,
    active: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            entries: Vec::new(),
            active: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut FileEntry, QueueError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| QueueError::UnknownEntry(id.to_string()))
    }

    /// Append an entry. Returns its id.
    pub fn push(&mut self, entry: FileEntry) -> String {
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    // ── Selection ───────────────────────────────────────────

    pub fn activate(&mut self, id: &str) -> Result<(), QueueError> {
        if self.get(id).is_none() {
            return Err(QueueError::UnknownEntry(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_entry(&self) -> Option<&FileEntry> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    // ── Transitions ─────────────────────────────────────────

    /// Oldest entry still waiting, in insertion order.
    pub fn next_pending(&self) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.status == EntryStatus::Pending)
            .map(|e| e.id.clone())
    }

    /// Pending → Processing. Refused while any other entry is processing.
    pub fn begin_processing(&mut self, id: &str) -> Result<(), QueueError> {
        if self
            .entries
            .iter()
            .any(|e| e.status == EntryStatus::Processing)
        {
            return Err(QueueError::AlreadyProcessing);
        }
        let entry = self.get_mut(id)?;
        if entry.status != EntryStatus::Pending {
            return Err(QueueError::InvalidTransition {
                from: entry.status,
                to: EntryStatus::Processing,
            });
        }
        entry.status = EntryStatus::Processing;
        Ok(())
    }

    /// Processing → Done, recording the parsed response and elapsed seconds.
    pub fn finish_done(
        &mut self,
        id: &str,
        result: serde_json::Value,
        duration_secs: f64,
    ) -> Result<(), QueueError> {
        let entry = self.get_mut(id)?;
        if entry.status != EntryStatus::Processing {
            return Err(QueueError::InvalidTransition {
                from: entry.status,
                to: EntryStatus::Done,
            });
        }
        entry.status = EntryStatus::Done;
        entry.result = Some(result);
        entry.duration_secs = Some(duration_secs);
        Ok(())
    }

    /// Processing → Error, recording the failure message.
    pub fn finish_error(&mut self, id: &str, message: String) -> Result<(), QueueError> {
        let entry = self.get_mut(id)?;
        if entry.status != EntryStatus::Processing {
            return Err(QueueError::InvalidTransition {
                from: entry.status,
                to: EntryStatus::Error,
            });
        }
        entry.status = EntryStatus::Error;
        entry.error = Some(message);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
