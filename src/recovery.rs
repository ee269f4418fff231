//! Orphaned-draft detection and the recovery decision.
//!
//! On session initialization, after the server-authoritative snapshot has
//! loaded, the host asks whether a local draft backup exists that diverges
//! from it (the signature of a tab crash, an unload mid-edit, or work done
//! offline). If so, a binary [`RecoveryOffer`] is surfaced:
//!
//! - **recover**: overwrite the in-memory form state with the backup. The
//!   stored backup is left untouched; normal autosave pushes it to the
//!   server on the next cycle.
//! - **dismiss**: discard the backup and keep the server snapshot.
//!
//! No automatic merge is attempted. The two sources can diverge in
//! unpredictable ways (someone else may have completed the report from
//! another device), so conflicting drafts are a user decision, not an
//! algorithmic one. A corrupt backup is treated as absent and produces no
//! offer.

use crate::backup::{self, BackupStore, DraftBackup};
use crate::snapshot::{self, Snapshot};

/// A divergent local draft, awaiting the user's recover/dismiss decision.
#[derive(Debug, Clone)]
pub struct RecoveryOffer<S> {
    backup: DraftBackup<S>,
}

impl<S: Snapshot> RecoveryOffer<S> {
    /// The backed-up snapshot, for preview in the recovery prompt.
    pub fn snapshot(&self) -> &S {
        &self.backup.snapshot
    }

    /// When the draft was backed up, in milliseconds since the Unix epoch.
    pub fn saved_at(&self) -> u64 {
        self.backup.saved_at
    }

    /// Accept the offer: take the backed-up snapshot to overwrite the
    /// in-memory form state.
    ///
    /// The stored backup is deliberately left in place: it keeps protecting
    /// the recovered work until autosave has pushed it to the server.
    pub fn recover(self) -> S {
        log::info!("Recovery: restoring local draft over server state");
        self.backup.snapshot
    }

    /// Decline the offer: delete the backup and keep the server snapshot.
    pub fn dismiss<B: BackupStore>(self, store: &mut B, key: &str) {
        log::info!("Recovery: local draft dismissed");
        backup::clear_backup(store, key);
    }
}

/// Compare the stored backup for `key` against the freshly loaded server
/// snapshot and return an offer if they diverge.
///
/// Returns `None` when no backup exists, when the backup is corrupt, or when
/// it matches the server state (nothing to recover).
pub fn detect_recovery<S: Snapshot, B: BackupStore>(
    store: &B,
    key: &str,
    server_snapshot: &S,
) -> Option<RecoveryOffer<S>> {
    let backup = backup::read_backup::<S, B>(store, key)?;

    if !snapshot::changed(Some(server_snapshot), &backup.snapshot) {
        log::debug!("Recovery: backup for '{}' matches server state", key);
        return None;
    }

    log::info!("Recovery: divergent local draft found for '{}'", key);
    Some(RecoveryOffer { backup })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::{MemoryBackupStore, write_backup};

    #[test]
    fn test_no_backup_no_offer() {
        let store = MemoryBackupStore::new();
        assert!(detect_recovery(&store, "k", &1).is_none());
    }

    #[test]
    fn test_matching_backup_no_offer() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "k", &DraftBackup::capture(&42));
        assert!(detect_recovery(&store, "k", &42).is_none());
    }

    #[test]
    fn test_divergent_backup_offered() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "k", &DraftBackup::capture(&43));

        let offer = detect_recovery(&store, "k", &42).unwrap();
        assert_eq!(*offer.snapshot(), 43);
    }

    #[test]
    fn test_corrupt_backup_no_offer() {
        let mut store = MemoryBackupStore::new();
        store.write("k", "not json at all").unwrap();
        assert!(detect_recovery::<i32, _>(&store, "k", &42).is_none());
    }

    #[test]
    fn test_recover_leaves_backup_in_place() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "k", &DraftBackup::capture(&43));

        let offer = detect_recovery(&store, "k", &42).unwrap();
        assert_eq!(offer.recover(), 43);

        // Still protected until autosave pushes the recovered state.
        assert!(detect_recovery(&store, "k", &42).is_some());
    }

    #[test]
    fn test_dismiss_clears_backup() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "k", &DraftBackup::capture(&43));

        let offer = detect_recovery(&store, "k", &42).unwrap();
        offer.dismiss(&mut store, "k");

        assert!(store.is_empty());
        assert!(detect_recovery(&store, "k", &42).is_none());
    }
}
