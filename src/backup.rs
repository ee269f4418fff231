//! Draft backup store: a durable, per-session local slot for the latest
//! form snapshot.
//!
//! The backup is the crash/reload safety net. It is written synchronously on
//! every detected edit, independent of network state, and cleared only by an
//! explicit recovery dismissal or by terminal session completion, never by a
//! successful network save.
//!
//! Storage failures are deliberately soft: the typed layer
//! ([`write_backup`], [`read_backup`], [`clear_backup`]) logs and swallows
//! them, degrading that cycle to network-only autosave instead of blocking
//! data entry. A corrupt entry reads as absent, not as an error state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::snapshot::Snapshot;

/// A locally persisted draft: the snapshot plus the time it was captured.
///
/// The serialized shape is the snapshot's own shape under `snapshot` plus
/// `saved_at` (milliseconds since the Unix epoch). No further envelope, so
/// host and engine agree on the format without the engine understanding
/// field semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftBackup<S> {
    /// The backed-up form snapshot.
    pub snapshot: S,
    /// When the backup was written, in milliseconds since the Unix epoch.
    pub saved_at: u64,
}

impl<S: Snapshot> DraftBackup<S> {
    /// Capture a backup of the given snapshot, stamped with the current time.
    pub fn capture(snapshot: &S) -> Self {
        Self {
            snapshot: snapshot.clone(),
            saved_at: now_millis(),
        }
    }
}

/// Milliseconds since the Unix epoch, on native and wasm alike.
fn now_millis() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Storage seam for draft backups.
///
/// Implementations are plain string key-value slots; serialization happens in
/// the typed layer above. The store never merges two entries: last writer
/// wins. Keys partition sessions, so two sessions never collide.
pub trait BackupStore {
    /// Store `json` under `key`, overwriting any prior value. Idempotent.
    fn write(&mut self, key: &str, json: &str) -> Result<(), StorageError>;

    /// Return the stored value for `key`, or `Ok(None)` if absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Remove the entry for `key`. Idempotent; clearing an absent key is fine.
    fn clear(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Serialize and store a backup, swallowing storage failures.
///
/// A failed write is logged and dropped; the engine continues with
/// network-only autosave for that cycle.
pub fn write_backup<S: Snapshot, B: BackupStore>(store: &mut B, key: &str, backup: &DraftBackup<S>) {
    let json = match serde_json::to_string(backup) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Draft backup for '{}' not serializable: {}", key, e);
            return;
        }
    };

    if let Err(e) = store.write(key, &json) {
        log::warn!("Draft backup write for '{}' failed: {}", key, e);
    } else {
        log::trace!("Draft backup written for '{}' ({} bytes)", key, json.len());
    }
}

/// Read and deserialize the backup for `key`.
///
/// Returns `None` if the entry is absent, unreadable, or corrupt; a corrupt
/// entry is logged and treated as absent.
pub fn read_backup<S: Snapshot, B: BackupStore>(store: &B, key: &str) -> Option<DraftBackup<S>> {
    let json = match store.read(key) {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Draft backup read for '{}' failed: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&json) {
        Ok(backup) => Some(backup),
        Err(e) => {
            log::warn!("Draft backup for '{}' is corrupt, treating as absent: {}", key, e);
            None
        }
    }
}

/// Remove the backup for `key`, swallowing storage failures.
pub fn clear_backup<B: BackupStore>(store: &mut B, key: &str) {
    if let Err(e) = store.clear(key) {
        log::warn!("Draft backup clear for '{}' failed: {}", key, e);
    } else {
        log::debug!("Draft backup cleared for '{}'", key);
    }
}

// ============================================================================
// Backends
// ============================================================================

/// In-memory backend: a plain map.
///
/// Not durable. Used in tests and as a degraded fallback when no durable
/// storage is available on the platform.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackupStore {
    entries: HashMap<String, String>,
}

impl MemoryBackupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BackupStore for MemoryBackupStore {
    fn write(&mut self, key: &str, json: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn clear(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed backend for native builds: one JSON file per session key.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileBackupStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileBackupStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store in the platform-local data directory.
    ///
    /// Returns `None` if no data directory can be determined, in which case
    /// callers typically fall back to [`MemoryBackupStore`].
    pub fn in_default_location() -> Option<Self> {
        let dir = dirs::data_local_dir()?.join("autodraft").join("drafts");
        Some(Self::new(dir))
    }

    /// The directory backing this store.
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(filename_for_key(key))
    }
}

/// Map an arbitrary session key to a safe, unique filename.
///
/// Readable characters are kept, the rest become `_`; a hash of the full key
/// keeps distinct keys distinct after sanitization.
#[cfg(not(target_arch = "wasm32"))]
fn filename_for_key(key: &str) -> String {
    use std::hash::{Hash, Hasher};

    let sanitized: String = key
        .chars()
        .take(48)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);

    format!("{}-{:016x}.json", sanitized, hasher.finish())
}

#[cfg(not(target_arch = "wasm32"))]
impl BackupStore for FileBackupStore {
    fn write(&mut self, key: &str, json: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), json)?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn clear(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Browser localStorage backend (WASM only).
///
/// Entries are namespaced with a fixed prefix plus the session key, scoped to
/// the browser profile; drafts are not shared across devices.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageBackupStore {
    prefix: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageBackupStore {
    /// Default localStorage key prefix.
    pub const DEFAULT_PREFIX: &'static str = "autodraft-backup:";

    /// Create a store with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }

    /// Create a store with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window object available".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageBackupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl BackupStore for LocalStorageBackupStore {
    fn write(&mut self, key: &str, json: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(&self.storage_key(key), json)
            .map_err(|e| StorageError::WriteRefused(format!("{:?}", e)))
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(&self.storage_key(key))
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn clear(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(&self.storage_key(key))
            .map_err(|e| StorageError::WriteRefused(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let mut store = MemoryBackupStore::new();
        let backup = DraftBackup::capture(&vec!["a".to_string(), "b".to_string()]);

        write_backup(&mut store, "session-1", &backup);
        let read: DraftBackup<Vec<String>> = read_backup(&store, "session-1").unwrap();

        assert_eq!(read.snapshot, backup.snapshot);
        assert_eq!(read.saved_at, backup.saved_at);
    }

    #[test]
    fn test_last_writer_wins() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "k", &DraftBackup::capture(&1));
        write_backup(&mut store, "k", &DraftBackup::capture(&2));

        let read: DraftBackup<i32> = read_backup(&store, "k").unwrap();
        assert_eq!(read.snapshot, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_absent_key_reads_none() {
        let store = MemoryBackupStore::new();
        assert!(read_backup::<i32, _>(&store, "missing").is_none());
    }

    #[test]
    fn test_corrupt_entry_treated_as_absent() {
        let mut store = MemoryBackupStore::new();
        store.write("k", "{not valid json").unwrap();
        assert!(read_backup::<i32, _>(&store, "k").is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "k", &DraftBackup::capture(&1));

        clear_backup(&mut store, "k");
        clear_backup(&mut store, "k");

        assert!(read_backup::<i32, _>(&store, "k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_do_not_collide() {
        let mut store = MemoryBackupStore::new();
        write_backup(&mut store, "report-1", &DraftBackup::capture(&1));
        write_backup(&mut store, "report-2", &DraftBackup::capture(&2));

        assert_eq!(read_backup::<i32, _>(&store, "report-1").unwrap().snapshot, 1);
        assert_eq!(read_backup::<i32, _>(&store, "report-2").unwrap().snapshot, 2);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("autodraft-test-rt-{}", std::process::id()));
        let mut store = FileBackupStore::new(&dir);

        write_backup(&mut store, "report/42", &DraftBackup::capture(&vec![1, 2, 3]));
        let read: DraftBackup<Vec<i32>> = read_backup(&store, "report/42").unwrap();
        assert_eq!(read.snapshot, vec![1, 2, 3]);

        clear_backup(&mut store, "report/42");
        assert!(read_backup::<Vec<i32>, _>(&store, "report/42").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_filename_sanitization_keeps_keys_distinct() {
        let a = filename_for_key("report/42");
        let b = filename_for_key("report:42");
        assert_ne!(a, b);
        assert!(a.ends_with(".json"));
        assert!(!a.contains('/'));
    }
}
