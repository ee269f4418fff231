//! autodraft - autosave and offline-draft-recovery engine.
//!
//! Backs a long-form, multi-section report editor: watches an in-memory form
//! snapshot, debounces server saves, keeps a durable local draft backup, and
//! offers recovery of orphaned local work after a crash or reload. The engine
//! is UI-framework-agnostic and sans-IO: the host notifies it of snapshot
//! changes, drives it from its tick loop, and supplies the network save as a
//! plain function.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use autodraft::{AutosaveController, MemoryBackupStore};
//!
//! let mut engine = AutosaveController::new("report-42", MemoryBackupStore::new());
//!
//! // On session load, after the server snapshot arrived:
//! if let Some(offer) = engine.check_recovery(&server_snapshot) {
//!     // ask the user; offer.recover() or engine.clear_draft_backup()
//! }
//!
//! // On every edit:
//! engine.notify_change(&snapshot, Instant::now());
//!
//! // From the tick loop:
//! engine.run_pending_save(Instant::now(), &mut save_fn);
//! ```

mod backup;
mod controller;
mod error;
mod executor;
mod recovery;
mod scheduler;
mod snapshot;

#[cfg(test)]
mod tests;

pub use backup::{
    BackupStore, DraftBackup, MemoryBackupStore, clear_backup, read_backup, write_backup,
};
pub use controller::{AutosaveController, AutosaveStatus};
pub use error::{SaveError, StorageError};
pub use executor::{SaveExecutor, SaveRequest};
pub use recovery::{RecoveryOffer, detect_recovery};
pub use scheduler::DebounceScheduler;
pub use snapshot::{Snapshot, changed};

#[cfg(not(target_arch = "wasm32"))]
pub use backup::FileBackupStore;

#[cfg(target_arch = "wasm32")]
pub use backup::LocalStorageBackupStore;
