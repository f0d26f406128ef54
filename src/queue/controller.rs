//! The upload queue controller — accepts selections, serializes submissions,
//! and keeps view state consistent with each entry's status.
//!
//! Concurrency model: all session mutation happens under one `RwLock`; the
//! drain loop holds an in-flight flag so there is never more than one
//! outstanding submission, no matter how many threads call `drain`. Events
//! are emitted with no locks held.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::intake::{filter_pdfs, IncomingFile};
use super::session::Session;
use super::QueueError;
use crate::export::{self, ExportError};
use crate::models::entry::{round_duration, EntryStatus, FileEntry};
use crate::submit::SubmitClient;
use crate::view::{self, DetailPane, FileRow};

// ═══════════════════════════════════════════
// Events
// ═══════════════════════════════════════════

/// Emitted as entries move through the queue. A front end listens to these
/// and pulls fresh view snapshots when they arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    EntryQueued { id: String, file_name: String },
    EntryStarted { id: String },
    EntryFinished { id: String, status: EntryStatus },
}

type Listener = Box<dyn Fn(QueueEvent) + Send + Sync>;

// ═══════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════

pub struct QueueController {
    session: RwLock<Session>,
    /// Single-slot in-flight token: at most one drain loop runs at a time.
    in_flight: AtomicBool,
    client: Box<dyn SubmitClient>,
    listener: Option<Listener>,
    /// Wakeup counter + signal for the background worker.
    wakeups: Mutex<u64>,
    wakeup_signal: Condvar,
}

impl QueueController {
    pub fn new(client: Box<dyn SubmitClient>) -> Self {
        Self {
            session: RwLock::new(Session::new()),
            in_flight: AtomicBool::new(false),
            client,
            listener: None,
            wakeups: Mutex::new(0),
            wakeup_signal: Condvar::new(),
        }
    }

    /// Attach an event listener.
    pub fn with_listener(
        mut self,
        listener: impl Fn(QueueEvent) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Session>, QueueError> {
        self.session.read().map_err(|_| QueueError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Session>, QueueError> {
        self.session.write().map_err(|_| QueueError::LockPoisoned)
    }

    // ── Operations ──────────────────────────────────────────

    /// Accept a new selection. Filters it to PDFs, appends entries in order,
    /// and signals the worker. A batch with no PDFs is rejected with no
    /// state change. Returns the new entry ids.
    pub fn enqueue(&self, files: Vec<IncomingFile>) -> Result<Vec<String>, QueueError> {
        let pdfs = filter_pdfs(files)?;

        let mut queued: Vec<(String, String)> = Vec::with_capacity(pdfs.len());
        {
            let mut session = self.write()?;
            for file in pdfs {
                let entry = FileEntry::new(file.name, file.mime_type, file.bytes);
                queued.push((entry.id.clone(), entry.file_name.clone()));
                session.push(entry);
            }
        }

        for (id, file_name) in &queued {
            tracing::info!(file = %file_name, id = %id, "File queued");
            self.emit(QueueEvent::EntryQueued {
                id: id.clone(),
                file_name: file_name.clone(),
            });
        }

        self.notify_worker();
        Ok(queued.into_iter().map(|(id, _)| id).collect())
    }

    /// Select an entry for the detail pane. No network effect.
    pub fn activate(&self, id: &str) -> Result<DetailPane, QueueError> {
        let mut session = self.write()?;
        session.activate(id)?;
        Ok(view::detail_pane(&session))
    }

    /// Clear the selection; the pane returns to its neutral state.
    pub fn deactivate(&self) -> Result<DetailPane, QueueError> {
        let mut session = self.write()?;
        session.deactivate();
        Ok(view::detail_pane(&session))
    }

    /// Process pending entries one at a time until none remain.
    ///
    /// Re-entrant-guarded: a second caller returns immediately while a
    /// submission is in flight. A failed submission marks its entry and
    /// never stops the loop.
    pub fn drain(&self) -> Result<(), QueueError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        let outcome = self.drain_loop();
        self.in_flight.store(false, Ordering::Release);
        outcome
    }

    fn drain_loop(&self) -> Result<(), QueueError> {
        loop {
            let work = {
                let mut session = self.write()?;
                match session.next_pending() {
                    Some(id) => {
                        session.begin_processing(&id)?;
                        // Auto-select when nothing is active, so the pane
                        // follows the first file through its lifecycle.
                        if session.active_id().is_none() {
                            session.activate(&id)?;
                        }
                        let entry = session
                            .get(&id)
                            .ok_or_else(|| QueueError::UnknownEntry(id.clone()))?;
                        Some((id, entry.file_name.clone(), entry.bytes().to_vec()))
                    }
                    None => None,
                }
            };
            let Some((id, file_name, bytes)) = work else {
                break;
            };

            self.emit(QueueEvent::EntryStarted { id: id.clone() });
            tracing::info!(file = %file_name, "Submitting file for extraction");

            let started = Instant::now();
            let submitted = self.client.submit(&file_name, &bytes);
            let duration = round_duration(started.elapsed().as_secs_f64());

            let status = {
                let mut session = self.write()?;
                match submitted {
                    Ok(result) => {
                        session.finish_done(&id, result, duration)?;
                        tracing::info!(
                            file = %file_name,
                            duration_secs = duration,
                            "Extraction finished"
                        );
                        EntryStatus::Done
                    }
                    Err(e) => {
                        tracing::warn!(file = %file_name, error = %e, "Extraction failed");
                        session.finish_error(&id, e.to_string())?;
                        EntryStatus::Error
                    }
                }
            };
            self.emit(QueueEvent::EntryFinished { id, status });
        }
        Ok(())
    }

    // ── Snapshots ───────────────────────────────────────────

    pub fn session_id(&self) -> Result<Uuid, QueueError> {
        Ok(self.read()?.id())
    }

    pub fn file_rows(&self) -> Result<Vec<FileRow>, QueueError> {
        let session = self.read()?;
        Ok(view::file_rows(&session))
    }

    pub fn detail_pane(&self) -> Result<DetailPane, QueueError> {
        let session = self.read()?;
        Ok(view::detail_pane(&session))
    }

    /// Owned snapshot of one entry.
    pub fn entry(&self, id: &str) -> Result<FileEntry, QueueError> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| QueueError::UnknownEntry(id.to_string()))
    }

    /// True when every queued entry has reached Done or Error.
    pub fn is_settled(&self) -> Result<bool, QueueError> {
        Ok(self
            .read()?
            .entries()
            .iter()
            .all(|e| e.status.is_terminal()))
    }

    /// Export the active entry's result as a downloadable JSON file.
    pub fn download_active(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let session = self.read()?;
        let entry = session.active_entry().ok_or(QueueError::NoActiveEntry)?;
        export::export_result(entry, dir)
    }

    // ── Worker signaling ────────────────────────────────────

    pub(crate) fn notify_worker(&self) {
        if let Ok(mut count) = self.wakeups.lock() {
            *count += 1;
            self.wakeup_signal.notify_all();
        }
    }

    /// Block until the wakeup counter moves past `last_seen` or `timeout`
    /// elapses. Returns the counter value observed.
    pub(crate) fn wait_for_work(&self, last_seen: u64, timeout: Duration) -> u64 {
        let Ok(guard) = self.wakeups.lock() else {
            return last_seen;
        };
        self.wakeup_signal
            .wait_timeout_while(guard, timeout, |count| *count == last_seen)
            .map(|(count, _)| *count)
            .unwrap_or(last_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::intake::PDF_MIME;
    use crate::submit::{MockSubmitClient, SubmitError};
    use std::sync::Arc;

    fn pdf(name: &str) -> IncomingFile {
        IncomingFile::new(name, PDF_MIME, b"%PDF-1.4".to_vec())
    }

    fn recording_controller(
        client: MockSubmitClient,
    ) -> (Arc<QueueController>, Arc<Mutex<Vec<QueueEvent>>>) {
        let events: Arc<Mutex<Vec<QueueEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let controller = QueueController::new(Box::new(client))
            .with_listener(move |event| sink.lock().unwrap().push(event));
        (Arc::new(controller), events)
    }

    #[test]
    fn rejected_batch_changes_nothing() {
        let (controller, events) = recording_controller(MockSubmitClient::new());
        let err = controller
            .enqueue(vec![IncomingFile::new("x.jpg", "image/jpeg", Vec::new())])
            .unwrap_err();

        assert_eq!(err.to_string(), "Please upload PDF files only.");
        assert!(controller.file_rows().unwrap().is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn enqueue_filters_and_keeps_order() {
        let (controller, _) = recording_controller(MockSubmitClient::new());
        let ids = controller
            .enqueue(vec![
                pdf("a.pdf"),
                IncomingFile::new("x.jpg", "image/jpeg", Vec::new()),
                pdf("b.pdf"),
            ])
            .unwrap();

        assert_eq!(ids.len(), 2);
        let rows = controller.file_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file_name, "a.pdf");
        assert_eq!(rows[1].file_name, "b.pdf");
        assert!(rows.iter().all(|r| r.status == EntryStatus::Pending));
    }

    #[test]
    fn drain_processes_fifo_and_strictly_sequentially() {
        let client = MockSubmitClient::new()
            .push_ok(serde_json::json!({"n": 1}))
            .push_ok(serde_json::json!({"n": 2}));
        let (controller, events) = recording_controller(client);

        let ids = controller.enqueue(vec![pdf("a.pdf"), pdf("b.pdf")]).unwrap();
        controller.drain().unwrap();

        let events = events.lock().unwrap();
        let shape: Vec<String> = events
            .iter()
            .map(|e| match e {
                QueueEvent::EntryQueued { file_name, .. } => format!("queued:{file_name}"),
                QueueEvent::EntryStarted { id } => format!("started:{id}"),
                QueueEvent::EntryFinished { id, status } => format!("finished:{id}:{status}"),
            })
            .collect();
        // B starts only after A reaches a terminal state.
        assert_eq!(
            shape,
            vec![
                "queued:a.pdf".to_string(),
                "queued:b.pdf".to_string(),
                format!("started:{}", ids[0]),
                format!("finished:{}:done", ids[0]),
                format!("started:{}", ids[1]),
                format!("finished:{}:done", ids[1]),
            ]
        );
        assert!(controller.is_settled().unwrap());
    }

    #[test]
    fn drain_auto_activates_the_first_entry() {
        let (controller, _) = recording_controller(MockSubmitClient::new());
        let ids = controller.enqueue(vec![pdf("a.pdf"), pdf("b.pdf")]).unwrap();
        controller.drain().unwrap();

        let rows = controller.file_rows().unwrap();
        assert!(rows[0].active);
        assert!(!rows[1].active);
        assert_eq!(controller.entry(&ids[0]).unwrap().status, EntryStatus::Done);
    }

    #[test]
    fn explicit_selection_is_not_stolen_by_drain() {
        let (controller, _) = recording_controller(MockSubmitClient::new());
        let ids = controller.enqueue(vec![pdf("a.pdf"), pdf("b.pdf")]).unwrap();
        controller.activate(&ids[1]).unwrap();
        controller.drain().unwrap();

        let rows = controller.file_rows().unwrap();
        assert!(!rows[0].active);
        assert!(rows[1].active);
    }

    #[test]
    fn server_detail_becomes_the_entry_error() {
        let client = MockSubmitClient::new().push_rejected(500, "bad scan");
        let (controller, _) = recording_controller(client);

        let ids = controller.enqueue(vec![pdf("a.pdf")]).unwrap();
        controller.drain().unwrap();

        let entry = controller.entry(&ids[0]).unwrap();
        assert_eq!(entry.status, EntryStatus::Error);
        assert_eq!(entry.error.as_deref(), Some("bad scan"));
        assert!(entry.result.is_none());
    }

    #[test]
    fn transport_failure_message_becomes_the_entry_error() {
        let client = MockSubmitClient::new()
            .push_failure(SubmitError::Connection("http://localhost:8000".to_string()));
        let (controller, _) = recording_controller(client);

        let ids = controller.enqueue(vec![pdf("a.pdf")]).unwrap();
        controller.drain().unwrap();

        let entry = controller.entry(&ids[0]).unwrap();
        assert_eq!(
            entry.error.as_deref(),
            Some("Cannot reach extraction service at http://localhost:8000")
        );
    }

    #[test]
    fn failure_does_not_halt_the_queue() {
        let client = MockSubmitClient::new()
            .push_rejected(500, "bad scan")
            .push_ok(serde_json::json!({"fields": []}));
        let (controller, _) = recording_controller(client);

        let ids = controller.enqueue(vec![pdf("a.pdf"), pdf("b.pdf")]).unwrap();
        controller.drain().unwrap();

        assert_eq!(controller.entry(&ids[0]).unwrap().status, EntryStatus::Error);
        let b = controller.entry(&ids[1]).unwrap();
        assert_eq!(b.status, EntryStatus::Done);
        assert_eq!(b.result, Some(serde_json::json!({"fields": []})));
    }

    #[test]
    fn done_entries_carry_two_decimal_durations() {
        let client = MockSubmitClient::new().push_ok(serde_json::json!({}));
        let (controller, _) = recording_controller(client);

        let ids = controller.enqueue(vec![pdf("a.pdf")]).unwrap();
        controller.drain().unwrap();

        let duration = controller.entry(&ids[0]).unwrap().duration_secs.unwrap();
        assert!(duration >= 0.0);
        assert_eq!(duration, round_duration(duration));
    }

    #[test]
    fn drain_while_in_flight_returns_immediately() {
        use std::sync::Barrier;

        /// Client that parks on a barrier so the test can observe the
        /// in-flight window from another thread.
        struct BlockingClient {
            release: Arc<Barrier>,
        }
        impl SubmitClient for BlockingClient {
            fn submit(
                &self,
                _file_name: &str,
                _bytes: &[u8],
            ) -> Result<serde_json::Value, SubmitError> {
                self.release.wait();
                Ok(serde_json::json!({}))
            }
        }

        let release = Arc::new(Barrier::new(2));
        let controller = Arc::new(QueueController::new(Box::new(BlockingClient {
            release: release.clone(),
        })));
        let ids = controller.enqueue(vec![pdf("a.pdf")]).unwrap();

        let background = {
            let controller = controller.clone();
            std::thread::spawn(move || controller.drain())
        };

        // Wait until the entry is actually in flight.
        while controller.entry(&ids[0]).unwrap().status != EntryStatus::Processing {
            std::thread::yield_now();
        }

        // The guarded second drain returns at once without touching anything.
        controller.drain().unwrap();
        assert_eq!(
            controller.entry(&ids[0]).unwrap().status,
            EntryStatus::Processing
        );

        release.wait();
        background.join().unwrap().unwrap();
        assert_eq!(controller.entry(&ids[0]).unwrap().status, EntryStatus::Done);
    }

    #[test]
    fn deactivate_returns_the_neutral_pane() {
        let (controller, _) = recording_controller(MockSubmitClient::new());
        let ids = controller.enqueue(vec![pdf("a.pdf")]).unwrap();
        controller.drain().unwrap();
        controller.activate(&ids[0]).unwrap();

        let pane = controller.deactivate().unwrap();
        assert_eq!(
            pane.empty_state_text.as_deref(),
            Some(crate::view::SELECT_PROMPT)
        );
        assert!(pane.json_area.is_none());
    }

    #[test]
    fn download_active_round_trips_the_result() {
        let client = MockSubmitClient::new().push_ok(serde_json::json!({"fields": [1, 2]}));
        let (controller, _) = recording_controller(client);
        let dir = tempfile::tempdir().unwrap();

        controller.enqueue(vec![pdf("invoice.pdf")]).unwrap();
        controller.drain().unwrap();

        let path = controller.download_active(dir.path()).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"fields": [1, 2]}));
    }

    #[test]
    fn download_without_selection_fails() {
        let (controller, _) = recording_controller(MockSubmitClient::new());
        let dir = tempfile::tempdir().unwrap();
        let err = controller.download_active(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Queue(QueueError::NoActiveEntry)
        ));
    }

    #[test]
    fn download_of_a_failed_entry_fails() {
        let client = MockSubmitClient::new().push_rejected(500, "bad scan");
        let (controller, _) = recording_controller(client);
        let dir = tempfile::tempdir().unwrap();

        controller.enqueue(vec![pdf("a.pdf")]).unwrap();
        controller.drain().unwrap();

        let err = controller.download_active(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::NotReady(EntryStatus::Error)));
    }

    #[test]
    fn wait_for_work_sees_notifications() {
        let (controller, _) = recording_controller(MockSubmitClient::new());
        let seen = controller.wait_for_work(0, Duration::from_millis(1));
        assert_eq!(seen, 0);

        controller.notify_worker();
        let seen = controller.wait_for_work(0, Duration::from_secs(5));
        assert_eq!(seen, 1);
    }
}
