pub mod entry;

pub use entry::{new_entry_id, round_duration, EntryStatus, FileEntry};
