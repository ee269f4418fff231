//! Debounce scheduler for autosave triggers.
//!
//! Coalesces bursts of snapshot changes into a single delayed save: each
//! change re-arms a fixed-delay timer, so a fast typist produces one save per
//! pause instead of one per keystroke (classic debounce, not throttle).
//! Supports an immediate flush ("save now") and suspension for read-only or
//! finalizing sessions.
//!
//! Time is injected by the caller as [`Instant`] values, so the scheduler is
//! deterministic and testable without sleeping. The controller polls
//! [`is_due`](DebounceScheduler::is_due) from the host's tick and calls
//! [`acknowledge`](DebounceScheduler::acknowledge) exactly once per fire.

use std::time::Duration;
use web_time::Instant;

/// Debounce timer state for one editing session.
#[derive(Debug)]
pub struct DebounceScheduler {
    /// Fixed delay between the last change and the save trigger.
    debounce_delay: Duration,

    /// When the armed timer elapses, if armed.
    deadline: Option<Instant>,

    /// An explicit flush was requested; fire at the next opportunity.
    flush_requested: bool,

    /// Whether scheduling is suspended (read-only, finalizing, disabled).
    suspended: bool,
}

impl DebounceScheduler {
    /// Default debounce delay (2 seconds).
    pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(2);

    /// Create a scheduler with the default delay.
    pub fn new() -> Self {
        Self::with_delay(Self::DEFAULT_DEBOUNCE_DELAY)
    }

    /// Create a scheduler with a custom delay.
    pub fn with_delay(debounce_delay: Duration) -> Self {
        Self {
            debounce_delay,
            deadline: None,
            flush_requested: false,
            suspended: false,
        }
    }

    /// The configured debounce delay.
    pub fn delay(&self) -> Duration {
        self.debounce_delay
    }

    /// Change the debounce delay. Takes effect the next time the timer is
    /// armed; an already-armed deadline is not recomputed.
    pub fn set_delay(&mut self, delay: Duration) {
        self.debounce_delay = delay;
    }

    /// Arm (or re-arm) the timer after a change at `now`.
    ///
    /// Repeated calls before expiry reset the timer. Ignored while suspended.
    pub fn schedule(&mut self, now: Instant) {
        if self.suspended {
            log::trace!("Debounce: schedule ignored while suspended");
            return;
        }
        self.deadline = Some(now + self.debounce_delay);
        log::trace!("Debounce: armed for {:?} from now", self.debounce_delay);
    }

    /// Cancel any armed timer and request an immediate fire.
    ///
    /// Ignored while suspended.
    pub fn flush_now(&mut self) {
        if self.suspended {
            log::trace!("Debounce: flush ignored while suspended");
            return;
        }
        self.deadline = None;
        self.flush_requested = true;
        log::trace!("Debounce: flush requested");
    }

    /// Stop the timer and block new scheduling.
    ///
    /// Cancels a pending (not-yet-fired) timer and drops any flush request.
    /// The snapshot itself is unaffected: backup writes happen before
    /// scheduling and are unconditional.
    pub fn suspend(&mut self) {
        self.deadline = None;
        self.flush_requested = false;
        self.suspended = true;
        log::debug!("Debounce: suspended");
    }

    /// Allow scheduling again. Does not resurrect a cancelled timer.
    pub fn resume(&mut self) {
        self.suspended = false;
        log::debug!("Debounce: resumed");
    }

    /// Whether scheduling is currently suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Whether a timer is armed or a flush is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some() || self.flush_requested
    }

    /// Whether the trigger should fire at `now`.
    ///
    /// True once the armed timer has elapsed or a flush was requested. Stays
    /// true until [`acknowledge`](Self::acknowledge): if the controller
    /// cannot act yet (a save is in flight), the fire waits rather than being
    /// lost.
    pub fn is_due(&self, now: Instant) -> bool {
        if self.suspended {
            return false;
        }
        self.flush_requested || self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Consume the current fire. Called exactly once per handled trigger.
    pub fn acknowledge(&mut self) {
        self.deadline = None;
        self.flush_requested = false;
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new()
    }
}
