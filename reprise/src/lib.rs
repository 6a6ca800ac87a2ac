//! # Reprise - Video Viewing Analytics
//!
//! Reprise tracks which time ranges of a piece of media have been viewed, and how many
//! times: once, twice, or three times and more. It is meant to sit behind a media player's
//! controls, fed with "playback started" and "playback stopped" signals.
//!
//! ## Modules
//!
//! - [`entry`]: contiguous viewing intervals and their lifecycle
//! - [`tally`]: merge of overlapping intervals into a depth-annotated timeline
//! - [`stats`]: the playback state machine hosts talk to
//! - [`clock`]: read access to the host media clock
//! - [`timer`]: cadence of speculative statistics while playing
//! - [`report`]: human-readable statistics lines
//! - [`config`]: runtime settings
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use reprise::{ManualClock, PlaybackAction, ViewingStats};
//!
//! let clock = Rc::new(ManualClock::new(60.0));
//! let mut stats = ViewingStats::new(Rc::clone(&clock));
//!
//! for (start, stop) in [(0.0, 20.0), (10.0, 30.0)] {
//!     clock.set_position(start);
//!     stats.notify_playback_action(PlaybackAction::PlayBegins).unwrap();
//!     clock.set_position(stop);
//!     stats.notify_playback_action(PlaybackAction::PlayStops).unwrap();
//! }
//!
//! let summary = stats.summary().unwrap();
//! assert_eq!(summary.viewed_once(), 20.0);
//! assert_eq!(summary.viewed_twice(), 10.0);
//! assert_eq!(summary.percent(summary.one_or_more()), Some(50.0));
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod report;
pub mod stats;
pub mod tally;
pub mod timer;

pub use clock::{ManualClock, MediaClock};
pub use config::Configuration;
pub use entry::{EntryState, ViewEntry};
pub use error::{StateFault, StatsError};
pub use report::{LogSink, ReportSink, ViewingSummary};
pub use stats::{PastAction, PlaybackAction, Transition, ViewingStats};
pub use tally::{Coverage, Tally};

// Types for more general type-safety
/// Media-clock time in seconds
pub type Seconds = f64;
