//! Autosave controller: the engine's state machine.
//!
//! Orchestrates the comparator, the draft backup store, the debounce
//! scheduler, and the save executor into one observable status for the UI.
//!
//! The controller is sans-IO and tick-driven, matching the host's
//! single-threaded, cooperative model. Three kinds of events drive every
//! transition:
//!
//! 1. snapshot-change notifications from the host form
//!    ([`notify_change`](AutosaveController::notify_change)),
//! 2. scheduler fire/flush, observed via
//!    [`poll`](AutosaveController::poll) from the host's tick,
//! 3. save settlement
//!    ([`complete_save`](AutosaveController::complete_save)).
//!
//! A save is represented by a [`SaveRequest`] handed out by `poll`. The
//! in-flight slot is an `Option<SaveAttempt>` owned by the controller: while
//! it is occupied, `poll` cannot produce a second request, so the
//! single-flight invariant is structural rather than convention-based.

use std::time::Duration;

use web_time::{Instant, SystemTime};

use crate::backup::{self, BackupStore, DraftBackup};
use crate::error::SaveError;
use crate::executor::{SaveExecutor, SaveRequest};
use crate::recovery::{self, RecoveryOffer};
use crate::scheduler::DebounceScheduler;
use crate::snapshot::{self, Snapshot};

/// The single authoritative autosave state exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutosaveStatus {
    /// No unsynced change since the last successful save or initialization.
    #[default]
    Idle,
    /// A change has been detected and backed up locally; the debounce timer
    /// is armed but has not fired.
    Pending,
    /// Exactly one save is outstanding.
    Saving,
    /// The last save succeeded.
    Saved,
    /// The last save failed; the snapshot remains backed up locally.
    Error,
}

impl AutosaveStatus {
    /// Display name for UI status indicators.
    pub fn name(&self) -> &'static str {
        match self {
            AutosaveStatus::Idle => "Idle",
            AutosaveStatus::Pending => "Pending",
            AutosaveStatus::Saving => "Saving",
            AutosaveStatus::Saved => "Saved",
            AutosaveStatus::Error => "Error",
        }
    }
}

/// The one save currently outstanding, if any.
#[derive(Debug)]
struct SaveAttempt<S> {
    /// Snapshot being pushed.
    snapshot: S,
    /// When the request was handed out.
    started_at: Instant,
}

/// Autosave engine for one report-editing session.
///
/// Generic over the host's snapshot type `S` and the backup backend `B`.
/// One controller per editing session; the session key namespaces the
/// backup entry so two sessions never collide.
pub struct AutosaveController<S: Snapshot, B: BackupStore> {
    session_key: String,
    store: B,
    scheduler: DebounceScheduler,
    status: AutosaveStatus,
    last_saved_at: Option<SystemTime>,
    last_error: Option<SaveError>,
    /// Last snapshot persisted locally; the comparator reference for edits.
    latest: Option<S>,
    /// Last snapshot the server acknowledged; the follow-up reference.
    synced: Option<S>,
    in_flight: Option<SaveAttempt<S>>,
    enabled: bool,
}

impl<S: Snapshot, B: BackupStore> AutosaveController<S, B> {
    /// Create a controller for the session identified by `session_key`,
    /// persisting draft backups through `store`.
    pub fn new(session_key: impl Into<String>, store: B) -> Self {
        Self {
            session_key: session_key.into(),
            store,
            scheduler: DebounceScheduler::new(),
            status: AutosaveStatus::Idle,
            last_saved_at: None,
            last_error: None,
            latest: None,
            synced: None,
            in_flight: None,
            enabled: true,
        }
    }

    /// Set the debounce delay between the last edit and the save trigger.
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.scheduler.set_delay(delay);
        self
    }

    /// Set the initial enablement (e.g. false for an already-completed
    /// entity).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        if !enabled {
            self.scheduler.suspend();
        }
        self
    }

    // ------------------------------------------------------------------
    // Event entry points
    // ------------------------------------------------------------------

    /// Notify the engine that the host form's snapshot may have changed.
    ///
    /// If the snapshot is value-different from the last persisted one, it is
    /// backed up locally right away (synchronously, even while the engine is
    /// suspended or a save is in flight) and the debounce timer is re-armed.
    pub fn notify_change(&mut self, snapshot: &S, now: Instant) {
        if !snapshot::changed(self.latest.as_ref(), snapshot) {
            log::trace!("Autosave: snapshot unchanged, ignoring");
            return;
        }

        self.latest = Some(snapshot.clone());
        backup::write_backup(
            &mut self.store,
            &self.session_key,
            &DraftBackup::capture(snapshot),
        );

        if !self.enabled {
            log::trace!("Autosave: disabled, change backed up only");
            return;
        }

        self.scheduler.schedule(now);

        if self.in_flight.is_none() {
            self.status = AutosaveStatus::Pending;
            log::debug!("Autosave: change detected, save pending");
        } else {
            // Picked up by the armed scheduler once the in-flight save settles.
            log::debug!("Autosave: change during in-flight save recorded");
        }
    }

    /// Request an immediate save of the latest snapshot.
    ///
    /// Cancels the debounce wait. If a save is already in flight, the flush
    /// waits for settlement and then fires at most one follow-up save of the
    /// latest snapshot, never a second concurrent call.
    pub fn save_now(&mut self) {
        if !self.enabled {
            log::debug!("Autosave: save_now ignored while disabled");
            return;
        }

        self.scheduler.flush_now();

        if self.in_flight.is_none() && self.has_unsynced_change() {
            self.status = AutosaveStatus::Pending;
        }
    }

    /// Drive the engine from the host's tick.
    ///
    /// Returns a [`SaveRequest`] when the debounce timer has fired (or a
    /// flush was requested), the engine is enabled, no save is outstanding,
    /// and the latest snapshot actually differs from the last acknowledged
    /// one. The host performs the save and reports the outcome via
    /// [`complete_save`](Self::complete_save).
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest<S>> {
        if !self.enabled || self.in_flight.is_some() || !self.scheduler.is_due(now) {
            return None;
        }
        self.scheduler.acknowledge();

        let Some(latest) = self.latest.clone() else {
            // Flush requested before any edit arrived.
            return None;
        };

        if !snapshot::changed(self.synced.as_ref(), &latest) {
            log::trace!("Autosave: trigger fired but nothing new to save");
            if self.status == AutosaveStatus::Pending {
                self.status = if self.synced.is_some() {
                    AutosaveStatus::Saved
                } else {
                    AutosaveStatus::Idle
                };
            }
            return None;
        }

        self.in_flight = Some(SaveAttempt {
            snapshot: latest.clone(),
            started_at: now,
        });
        self.status = AutosaveStatus::Saving;
        log::info!("Autosave: pushing snapshot for '{}'", self.session_key);
        Some(SaveRequest::new(latest))
    }

    /// Report settlement of the outstanding save.
    ///
    /// Clears the in-flight slot in every path. On success the completion
    /// time is recorded and, if an edit landed mid-save, status returns to
    /// `Pending` so the armed scheduler can fire the follow-up. On failure
    /// the backup is untouched and status becomes `Error`; the next edit or
    /// an explicit flush retries.
    pub fn complete_save(&mut self, outcome: Result<(), SaveError>) {
        let Some(attempt) = self.in_flight.take() else {
            log::warn!("Autosave: save settlement reported with no save in flight");
            return;
        };

        match outcome {
            Ok(()) => {
                log::info!(
                    "Autosave: snapshot for '{}' saved in {:?}",
                    self.session_key,
                    attempt.started_at.elapsed()
                );
                self.synced = Some(attempt.snapshot);
                self.last_saved_at = Some(SystemTime::now());
                self.last_error = None;
                self.status = if self.has_unsynced_change() {
                    AutosaveStatus::Pending
                } else {
                    AutosaveStatus::Saved
                };
            }
            Err(e) => {
                log::error!("Autosave: save for '{}' failed: {}", self.session_key, e);
                self.last_error = Some(e);
                self.status = AutosaveStatus::Error;
            }
        }
    }

    /// Poll and, if a save is due, run it against `executor` and settle it.
    ///
    /// Convenience for hosts whose executor blocks; returns whether a save
    /// was performed. Hosts with a non-blocking save use
    /// [`poll`](Self::poll) / [`complete_save`](Self::complete_save)
    /// directly.
    pub fn run_pending_save<E: SaveExecutor<S>>(&mut self, now: Instant, executor: &mut E) -> bool {
        let Some(request) = self.poll(now) else {
            return false;
        };
        let outcome = executor.save(request.snapshot());
        self.complete_save(outcome);
        true
    }

    /// Apply the host's enablement predicate (false once the entity is
    /// completed/archived, or the session is read-only).
    ///
    /// Disabling cancels a pending timer but never aborts an in-flight save,
    /// which settles and updates status normally. Re-enabling re-arms the
    /// timer if unsynced work accumulated while suspended.
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;

        if !enabled {
            self.scheduler.suspend();
            return;
        }

        self.scheduler.resume();
        if self.has_unsynced_change() {
            self.scheduler.schedule(now);
            if self.in_flight.is_none() {
                self.status = AutosaveStatus::Pending;
            }
        }
    }

    /// Mark the session terminally complete (entity reached a terminal,
    /// successfully-synced state).
    ///
    /// Deletes the draft backup and disables the engine. An in-flight save is
    /// left to settle normally.
    pub fn complete_session(&mut self) {
        backup::clear_backup(&mut self.store, &self.session_key);
        self.scheduler.suspend();
        self.enabled = false;
        self.status = AutosaveStatus::Idle;
        log::info!("Autosave: session '{}' completed", self.session_key);
    }

    // ------------------------------------------------------------------
    // Recovery and backup access
    // ------------------------------------------------------------------

    /// Check for an orphaned local draft that diverges from the freshly
    /// loaded server snapshot.
    ///
    /// Called once at session initialization, after the server state has
    /// loaded. See [`recovery`](crate::recovery) for the recover/dismiss
    /// contract.
    pub fn check_recovery(&self, server_snapshot: &S) -> Option<RecoveryOffer<S>> {
        recovery::detect_recovery(&self.store, &self.session_key, server_snapshot)
    }

    /// Read the current draft backup for this session, if one exists.
    pub fn load_draft_backup(&self) -> Option<DraftBackup<S>> {
        backup::read_backup(&self.store, &self.session_key)
    }

    /// Discard the draft backup for this session (recovery dismissal).
    pub fn clear_draft_backup(&mut self) {
        backup::clear_backup(&mut self.store, &self.session_key);
    }

    // ------------------------------------------------------------------
    // Observable surface
    // ------------------------------------------------------------------

    /// Current autosave status.
    pub fn status(&self) -> AutosaveStatus {
        self.status
    }

    /// Completion time of the last successful save.
    pub fn last_saved_at(&self) -> Option<SystemTime> {
        self.last_saved_at
    }

    /// Time since the last successful save.
    pub fn time_since_last_save(&self) -> Option<Duration> {
        self.last_saved_at.and_then(|t| t.elapsed().ok())
    }

    /// The error from the last failed save, until a later save succeeds.
    pub fn error(&self) -> Option<&SaveError> {
        self.last_error.as_ref()
    }

    /// Whether a save is currently in flight.
    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the engine is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The session key namespacing this controller's backup entry.
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// The configured debounce delay.
    pub fn debounce_delay(&self) -> Duration {
        self.scheduler.delay()
    }

    fn has_unsynced_change(&self) -> bool {
        match &self.latest {
            Some(latest) => snapshot::changed(self.synced.as_ref(), latest),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::MemoryBackupStore;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn controller(delay_ms: u64) -> AutosaveController<i32, MemoryBackupStore> {
        AutosaveController::new("session", MemoryBackupStore::new())
            .with_debounce_delay(ms(delay_ms))
    }

    #[test]
    fn test_happy_path_transitions() {
        let t0 = Instant::now();
        let mut engine = controller(100);
        assert_eq!(engine.status(), AutosaveStatus::Idle);

        engine.notify_change(&1, t0);
        assert_eq!(engine.status(), AutosaveStatus::Pending);

        let request = engine.poll(t0 + ms(100)).unwrap();
        assert_eq!(*request.snapshot(), 1);
        assert_eq!(engine.status(), AutosaveStatus::Saving);
        assert!(engine.is_saving());

        engine.complete_save(Ok(()));
        assert_eq!(engine.status(), AutosaveStatus::Saved);
        assert!(engine.last_saved_at().is_some());
        assert!(engine.error().is_none());
    }

    #[test]
    fn test_poll_before_deadline_yields_nothing() {
        let t0 = Instant::now();
        let mut engine = controller(2000);

        engine.notify_change(&1, t0);
        assert!(engine.poll(t0 + ms(1999)).is_none());
        assert_eq!(engine.status(), AutosaveStatus::Pending);
    }

    #[test]
    fn test_identical_snapshot_is_ignored() {
        let t0 = Instant::now();
        let mut engine = controller(100);

        engine.notify_change(&1, t0);
        let request = engine.poll(t0 + ms(100)).unwrap();
        engine.complete_save(Ok(()));
        drop(request);

        // Same value again: no new pending state, no new save.
        engine.notify_change(&1, t0 + ms(200));
        assert_eq!(engine.status(), AutosaveStatus::Saved);
        assert!(engine.poll(t0 + ms(1000)).is_none());
    }

    #[test]
    fn test_flush_with_nothing_unsynced_fires_no_save() {
        let t0 = Instant::now();
        let mut engine = controller(100);

        engine.notify_change(&1, t0);
        engine.poll(t0 + ms(100)).unwrap();
        engine.complete_save(Ok(()));

        engine.save_now();
        assert!(engine.poll(t0 + ms(200)).is_none());
        assert_eq!(engine.status(), AutosaveStatus::Saved);
    }

    #[test]
    fn test_spurious_settlement_is_harmless() {
        let mut engine = controller(100);
        engine.complete_save(Ok(()));
        assert_eq!(engine.status(), AutosaveStatus::Idle);
        assert!(engine.last_saved_at().is_none());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(AutosaveStatus::Saving.name(), "Saving");
        assert_eq!(AutosaveStatus::default().name(), "Idle");
    }
}
