//! Faults raised by the viewing tracker.
//!
//! Every variant of [`StateFault`] is an internal invariant violation rather than a transient
//! failure, so nothing here is ever retried. The controller remembers the first fault it sees
//! and stops updating afterwards (see [`StatsError::Degraded`]).

use thiserror::Error;

use crate::entry::{EntryId, EntryState};
use crate::stats::{PastAction, PlaybackAction};

/// A violated precondition in the entry lifecycle, the tally or the playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateFault {
    #[error("Entry #{id} cannot be closed: it is {state}, not in progress")]
    EntryNotInProgress { id: EntryId, state: EntryState },

    #[error("Entry #{id} cannot be merged into the tally: it is {state}, not completed")]
    EntryNotCompleted { id: EntryId, state: EntryState },

    #[error("Illegal playback transition: {action} received while in {from}")]
    IllegalTransition {
        from: PastAction,
        action: PlaybackAction,
    },

    #[error("The entry table is empty, there is no view interval to close")]
    NoOpenEntry,
}

/// Errors returned by the [`ViewingStats`](crate::stats::ViewingStats) controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error(transparent)]
    Fault(#[from] StateFault),

    #[error("Viewing statistics stopped updating after an earlier fault: {0}")]
    Degraded(StateFault),
}

impl StatsError {
    /// The underlying fault, whether it just happened or was recorded earlier
    pub const fn fault(&self) -> StateFault {
        match self {
            Self::Fault(fault) | Self::Degraded(fault) => *fault,
        }
    }
}
