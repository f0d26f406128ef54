//! Background drain worker.
//!
//! `enqueue` only appends entries and signals; this thread picks up the
//! signal and runs the drain loop, so UI callers never block on the
//! network path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::controller::QueueController;

/// Fallback re-check interval when no signal arrives.
const WAIT_GRANULARITY_SECS: u64 = 5;

/// Handle for the background drain thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on
/// `Drop`. An in-flight submission completes; no new drain pass starts.
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    controller: Arc<QueueController>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Wake the thread so it notices immediately.
        self.controller.notify_worker();
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Start the drain worker on its own thread.
pub fn spawn_worker(controller: Arc<QueueController>) -> WorkerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let ctrl = controller.clone();

    let handle = std::thread::spawn(move || {
        tracing::debug!("Queue worker started");
        let mut seen = 0u64;
        while !flag.load(Ordering::Relaxed) {
            if let Err(e) = ctrl.drain() {
                tracing::error!(error = %e, "Drain pass failed");
            }
            seen = ctrl.wait_for_work(seen, Duration::from_secs(WAIT_GRANULARITY_SECS));
        }
        tracing::debug!("Queue worker shutting down");
    });

    WorkerHandle {
        shutdown,
        controller,
        handle: Some(handle),
    }
}
