//! # Clock Module - Reads From The Host Media Element
//!
//! The tracker never subscribes to position updates. It pulls the current playback position
//! when an entry opens or closes, and the media duration when percentages are reported.
//! Hosts expose both through [`MediaClock`].
//!
//! ```rust
//! use reprise::clock::{ManualClock, MediaClock};
//!
//! let clock = ManualClock::new(120.0);
//! clock.set_position(42.5);
//! assert_eq!(clock.now(), 42.5);
//! assert_eq!(clock.duration(), 120.0);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use crate::Seconds;

/// Read access to the host media clock
pub trait MediaClock {
    /// Current playback position in media seconds
    fn now(&self) -> Seconds;

    /// Total media duration in seconds. May be `0.0` or `NaN` while the media is not loaded.
    fn duration(&self) -> Seconds;
}

impl<T: MediaClock + ?Sized> MediaClock for &T {
    fn now(&self) -> Seconds {
        (**self).now()
    }

    fn duration(&self) -> Seconds {
        (**self).duration()
    }
}

impl<T: MediaClock + ?Sized> MediaClock for Rc<T> {
    fn now(&self) -> Seconds {
        (**self).now()
    }

    fn duration(&self) -> Seconds {
        (**self).duration()
    }
}

/// A clock whose position is set by hand
///
/// Interior mutability lets a host keep an `Rc<ManualClock>` for itself while the tracker
/// owns another handle. Everything runs on one thread, so a `Cell` is all that is needed.
#[derive(Debug, Default)]
pub struct ManualClock {
    position: Cell<Seconds>,
    duration: Cell<Seconds>,
}

impl ManualClock {
    pub const fn new(duration: Seconds) -> Self {
        Self {
            position: Cell::new(0.0),
            duration: Cell::new(duration),
        }
    }

    pub fn set_position(&self, position: Seconds) {
        self.position.set(position);
    }

    /// Move the position forward, as if the media played for `seconds`
    pub fn advance(&self, seconds: Seconds) {
        self.position.set(self.position.get() + seconds);
    }

    pub fn set_duration(&self, duration: Seconds) {
        self.duration.set(duration);
    }
}

impl MediaClock for ManualClock {
    fn now(&self) -> Seconds {
        self.position.get()
    }

    fn duration(&self) -> Seconds {
        self.duration.get()
    }
}
