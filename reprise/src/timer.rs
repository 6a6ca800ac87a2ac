//! Fixed-cadence trigger for speculative statistics.
//!
//! The tracker never schedules callbacks itself. Hosts call
//! [`ViewingStats::tick`](crate::stats::ViewingStats::tick) from whatever event loop they
//! have, and the timer decides whether a peek is due.

use web_time::{Duration, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct PeekTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl PeekTimer {
    pub fn new(interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            log::warn!("Peek interval {interval:?} is too short, using {MIN_INTERVAL:?}");
        }
        Self {
            interval: interval.max(MIN_INTERVAL),
            next_due: None,
        }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub const fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Start the timer. Starting a running timer is ignored and returns `false`.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            log::warn!("Peek timer start ignored: already running");
            return false;
        }
        self.next_due = Some(now + self.interval);
        log::debug!("Peek timer started, interval {:?}", self.interval);
        true
    }

    /// Stop the timer. Stopping a stopped timer does nothing.
    pub fn stop(&mut self) {
        if self.next_due.take().is_some() {
            log::debug!("Peek timer stopped");
        }
    }

    /// Whether a period elapsed since the last time this returned `true`
    ///
    /// Periods missed entirely collapse into one.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let next = due + self.interval;
        self.next_due = Some(if next <= now { now + self.interval } else { next });
        true
    }
}
