//! Periodic autosave scheduling.
//!
//! The timer does no I/O itself. The event loop polls it between turns and
//! runs the session's autosave tick when it fires, so a tick never overlaps
//! a user action.

use std::time::{Duration, Instant};

pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AutosaveTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl AutosaveTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
        log::debug!("Autosave timer started ({:?} interval)", self.interval);
    }

    pub fn stop(&mut self) {
        if self.is_running() {
            log::debug!("Autosave timer stopped");
        }
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns `true` when a tick is due and schedules the next one.
    ///
    /// Missed ticks are not replayed: a loop that stalled for several
    /// intervals fires once.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

impl Default for AutosaveTimer {
    fn default() -> Self {
        Self::new(AUTOSAVE_INTERVAL)
    }
}
