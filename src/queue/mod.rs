//! The upload queue: session state, intake filtering, the drain loop, and
//! the background worker that runs it.

pub mod controller;
pub mod intake;
pub mod session;
pub mod worker;

pub use controller::{QueueController, QueueEvent};
pub use intake::{filter_pdfs, load_incoming, IncomingFile, IntakeError, PDF_MIME};
pub use session::Session;
pub use worker::{spawn_worker, WorkerHandle};

use thiserror::Error;

use crate::models::entry::EntryStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    #[error("Cannot move entry from {from} to {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    #[error("Another entry is already processing")]
    AlreadyProcessing,

    #[error("No active entry")]
    NoActiveEntry,

    #[error("Queue lock poisoned")]
    LockPoisoned,
}
