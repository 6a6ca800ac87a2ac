//! # Entry Module - Contiguous Viewing Intervals
//!
//! A [`ViewEntry`] records one span during which the media played without pausing. Entries
//! are created in progress when playback starts and closed exactly once when it stops.
//!
//! ```rust
//! use reprise::entry::{EntryFactory, EntryState};
//!
//! let mut factory = EntryFactory::new();
//! let mut entry = factory.create(10.0);
//! assert_eq!(entry.id(), 1);
//! assert_eq!(entry.state(), EntryState::InProgress);
//!
//! entry.close(14.5).unwrap();
//! assert_eq!(entry.duration(), Some(4.5));
//! assert!(entry.close(20.0).is_err());
//! ```

use derive_more::Deref;
use strum::Display;

use crate::Seconds;
use crate::error::StateFault;

/// Identifier assigned to entries by an [`EntryFactory`], starting at 1
pub type EntryId = u64;

/// Lifecycle of a [`ViewEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryState {
    /// Playback is running, the stop time is not known yet
    InProgress,
    /// Playback stopped and the interval is final
    Completed,
}

/// One contiguous span of playback
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    id: EntryId,
    state: EntryState,
    start_time: Seconds,
    stop_time: Option<Seconds>,
    duration: Option<Seconds>,
    clock_anomaly: bool,
}

impl ViewEntry {
    fn open(id: EntryId, start_time: Seconds) -> Self {
        Self {
            id,
            state: EntryState::InProgress,
            start_time,
            stop_time: None,
            duration: None,
            clock_anomaly: false,
        }
    }

    pub const fn id(&self) -> EntryId {
        self.id
    }

    pub const fn state(&self) -> EntryState {
        self.state
    }

    pub const fn start_time(&self) -> Seconds {
        self.start_time
    }

    /// Media time at which playback stopped, `None` while in progress
    pub const fn stop_time(&self) -> Option<Seconds> {
        self.stop_time
    }

    /// `stop_time - start_time`, clamped to zero. `None` while in progress.
    pub const fn duration(&self) -> Option<Seconds> {
        self.duration
    }

    pub fn is_open(&self) -> bool {
        self.state == EntryState::InProgress
    }

    /// Whether the media clock reported a stop time before the start time
    pub const fn has_clock_anomaly(&self) -> bool {
        self.clock_anomaly
    }

    /// Close the entry at `stop_time`
    ///
    /// Only an in-progress entry can be closed. A stop time earlier than the start time
    /// (seek jitter on the media clock) closes the entry with a zero duration and flags it.
    pub fn close(&mut self, stop_time: Seconds) -> Result<&mut Self, StateFault> {
        if self.state != EntryState::InProgress {
            return Err(StateFault::EntryNotInProgress {
                id: self.id,
                state: self.state,
            });
        }

        let delta = stop_time - self.start_time;
        // NaN fails this comparison too
        self.clock_anomaly = !(delta >= 0.0);
        if self.clock_anomaly {
            log::warn!(
                "Entry #{}: clock went backwards (start {}, stop {}), duration clamped to zero",
                self.id,
                self.start_time,
                stop_time
            );
        }

        self.stop_time = Some(stop_time);
        self.duration = Some(if self.clock_anomaly { 0.0 } else { delta });
        self.state = EntryState::Completed;

        log::debug!(
            "Entry #{} completed: {} -> {}",
            self.id,
            self.start_time,
            stop_time
        );

        Ok(self)
    }

    /// An independent copy carrying the same id and field values
    ///
    /// Closing the copy of an open entry leaves the original open.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// The interval this entry contributes to a tally, `None` while in progress
    ///
    /// Anomalous entries contribute a zero-width interval at their start time.
    pub fn bounds(&self) -> Option<(Seconds, Seconds)> {
        let stop_time = self.stop_time?;
        if self.clock_anomaly {
            return Some((self.start_time, self.start_time));
        }
        Some((self.start_time, stop_time))
    }
}

/// Builds in-progress entries with increasing ids
#[derive(Debug, Clone)]
pub struct EntryFactory {
    next_id: EntryId,
}

impl EntryFactory {
    pub const fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Open a new entry starting at `start_time`
    pub fn create(&mut self, start_time: Seconds) -> ViewEntry {
        let entry = ViewEntry::open(self.next_id, start_time);
        self.next_id += 1;
        log::debug!("Entry #{} opened at {}", entry.id, start_time);
        entry
    }
}

impl Default for EntryFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered record of every entry of a viewing session
///
/// Entries are only ever appended, and only the most recent one is ever mutated.
/// Read access goes through `Deref` to the underlying `Vec`.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct EntryTable(Vec<ViewEntry>);

impl EntryTable {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(&mut self, entry: ViewEntry) {
        self.0.push(entry);
    }

    /// The most recently appended entry, for in-place updates
    pub fn last_mut(&mut self) -> Option<&mut ViewEntry> {
        self.0.last_mut()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
