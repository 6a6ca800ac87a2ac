//! # Stats Module - Playback State Machine
//!
//! [`ViewingStats`] is the entry point for hosts. It receives coarse playback actions, keeps
//! the table of viewing intervals, merges every closed interval into the authoritative
//! [`Tally`] and pushes the resulting statistics to a [`ReportSink`].
//!
//! ## Playback States
//!
#![doc = simple_mermaid::mermaid!("../diagrams/playback_states.mmd")]
//!
//! ## Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use reprise::clock::ManualClock;
//! use reprise::stats::{PlaybackAction, Transition, ViewingStats};
//!
//! let clock = Rc::new(ManualClock::new(100.0));
//! let mut stats = ViewingStats::with_sink(Rc::clone(&clock), Vec::<String>::new());
//!
//! stats.notify_playback_action(PlaybackAction::PlayBegins).unwrap();
//! clock.set_position(25.0);
//!
//! // What the statistics would be if the viewer paused now
//! let estimate = stats.peek_stats().unwrap();
//! assert_eq!(estimate.viewed_once(), 25.0);
//!
//! let transition = stats.notify_playback_action(PlaybackAction::PlayStops).unwrap();
//! assert_eq!(transition, Transition::Closed(1));
//! assert_eq!(stats.summary().unwrap().percent(25.0), Some(25.0));
//! ```
//!
//! ## Faults
//!
//! A violated invariant is returned as [`StatsError::Fault`] and recorded. From then on the
//! statistics stop updating: actions and peeks return [`StatsError::Degraded`] until
//! [`ViewingStats::reset`] is called. The host's playback is never affected.

use strum::Display;
use web_time::Instant;

use crate::Seconds;
use crate::clock::MediaClock;
use crate::config::Configuration;
use crate::entry::{EntryFactory, EntryId, EntryTable};
use crate::error::{StateFault, StatsError};
use crate::report::{self, LogSink, ReportSink, ViewingSummary};
use crate::tally::Tally;
use crate::timer::PeekTimer;

/// Coarse playback signal produced by the host's event wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackAction {
    PlayBegins,
    PlayStops,
}

/// The last action the state machine accepted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PastAction {
    #[default]
    InitState,
    PlayBegins,
    PlayStops,
}

/// What an accepted action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The playhead moved while nothing was playing
    NothingViewed,
    /// A new viewing interval was opened
    Opened(EntryId),
    /// The open interval was closed, merged and reported
    Closed(EntryId),
}

/// Viewing-interval tracker for one media element
///
/// Single-threaded: every method runs to completion on the host's event thread, so a
/// peek can never observe the table in the middle of an update.
#[derive(Debug)]
pub struct ViewingStats<C: MediaClock, S: ReportSink = LogSink> {
    clock: C,
    sink: S,
    config: Configuration,
    past_action: PastAction,
    factory: EntryFactory,
    table: EntryTable,
    tally: Tally,
    peek_timer: PeekTimer,
    summary: Option<ViewingSummary>,
    last_peek: Option<ViewingSummary>,
    fault: Option<StateFault>,
}

impl<C: MediaClock> ViewingStats<C> {
    /// Create a tracker reporting through the `log` facade
    pub fn new(clock: C) -> Self {
        Self::with_sink(clock, LogSink)
    }
}

impl<C: MediaClock, S: ReportSink> ViewingStats<C, S> {
    /// Create a tracker reporting into `sink`
    pub fn with_sink(clock: C, sink: S) -> Self {
        let config = Configuration::default();
        Self {
            clock,
            sink,
            peek_timer: PeekTimer::new(config.peek_interval),
            config,
            past_action: PastAction::default(),
            factory: EntryFactory::new(),
            table: EntryTable::new(),
            tally: Tally::new(),
            summary: None,
            last_peek: None,
            fault: None,
        }
    }

    /// Configure the tracker with custom settings (builder pattern)
    pub fn with_configuration(mut self, config: Configuration) -> Self {
        self.peek_timer = PeekTimer::new(config.peek_interval);
        self.config = config;
        self
    }

    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    pub const fn past_action(&self) -> PastAction {
        self.past_action
    }

    /// Every interval of the session, oldest first
    pub const fn entries(&self) -> &EntryTable {
        &self.table
    }

    /// The authoritative merge of every closed interval
    pub const fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Statistics as of the last closed interval
    pub const fn summary(&self) -> Option<&ViewingSummary> {
        self.summary.as_ref()
    }

    /// The most recent speculative statistics
    pub const fn last_peek(&self) -> Option<&ViewingSummary> {
        self.last_peek.as_ref()
    }

    /// The fault that stopped the statistics from updating, if any
    pub const fn fault(&self) -> Option<StateFault> {
        self.fault
    }

    pub const fn is_peeking(&self) -> bool {
        self.peek_timer.is_running()
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Feed a playback action, timing the peek timer from the current instant
    pub fn notify_playback_action(
        &mut self,
        action: PlaybackAction,
    ) -> Result<Transition, StatsError> {
        self.notify_playback_action_at(action, Instant::now())
    }

    /// Feed a playback action that happened at `now`
    pub fn notify_playback_action_at(
        &mut self,
        action: PlaybackAction,
        now: Instant,
    ) -> Result<Transition, StatsError> {
        self.ensure_healthy()?;
        self.log_interval(action, now)
            .map_err(|fault| self.degrade(fault))
    }

    /// Run a peek if the peek timer is due
    pub fn tick(&mut self, now: Instant) -> Result<Option<ViewingSummary>, StatsError> {
        if !self.peek_timer.poll(now) {
            return Ok(None);
        }
        self.peek_stats().map(Some)
    }

    /// Statistics as they would be if playback paused right now
    ///
    /// Works on snapshots of the entry table and a scratch tally, both dropped afterwards.
    /// Neither the entries nor the authoritative tally are touched.
    pub fn peek_stats(&mut self) -> Result<ViewingSummary, StatsError> {
        self.ensure_healthy()?;
        self.estimate().map_err(|fault| self.degrade(fault))
    }

    /// Forget the session: entries, tally, ids, timer and any recorded fault
    pub fn reset(&mut self) {
        log::debug!("Stats: reset, dropping {} entries", self.table.len());
        self.past_action = PastAction::InitState;
        self.factory = EntryFactory::new();
        self.table.clear();
        self.tally = Tally::new();
        self.peek_timer.stop();
        self.summary = None;
        self.last_peek = None;
        self.fault = None;
    }

    fn log_interval(
        &mut self,
        action: PlaybackAction,
        now: Instant,
    ) -> Result<Transition, StateFault> {
        log::debug!("Stats: transitioning from {} to {}", self.past_action, action);

        match (self.past_action, action) {
            (PastAction::InitState, PlaybackAction::PlayStops) => {
                log::debug!("Stats: no time viewed, playhead moved before any playback");
                self.past_action = PastAction::PlayStops;
                Ok(Transition::NothingViewed)
            }
            (PastAction::PlayStops, PlaybackAction::PlayStops) => {
                log::debug!("Stats: no time viewed, playhead moved while paused");
                Ok(Transition::NothingViewed)
            }
            (PastAction::InitState | PastAction::PlayStops, PlaybackAction::PlayBegins) => {
                let entry = self.factory.create(self.position());
                let id = entry.id();
                self.table.append(entry);
                self.past_action = PastAction::PlayBegins;
                self.peek_timer.start(now);
                Ok(Transition::Opened(id))
            }
            (PastAction::PlayBegins, PlaybackAction::PlayStops) => {
                self.peek_timer.stop();
                let stop = self.position();

                let entry = self.table.last_mut().ok_or(StateFault::NoOpenEntry)?;
                entry.close(stop)?;
                self.tally.add(entry)?;
                let id = entry.id();

                let summary = ViewingSummary::new(
                    self.tally.traverse().clone(),
                    self.clock.duration(),
                    self.tally.anomaly_count(),
                );
                self.past_action = PastAction::PlayStops;

                let precision = self.config.seconds_precision;
                if self.config.include_entry_table {
                    report::write_table(&mut self.sink, &self.table, precision);
                }
                self.sink.emit("Cumulative totals:");
                report::write_summary(&mut self.sink, &summary, precision);
                self.summary = Some(summary);

                Ok(Transition::Closed(id))
            }
            (PastAction::PlayBegins, PlaybackAction::PlayBegins) => {
                Err(StateFault::IllegalTransition {
                    from: self.past_action,
                    action,
                })
            }
        }
    }

    fn estimate(&mut self) -> Result<ViewingSummary, StateFault> {
        log::debug!("Stats: peeking into {} entries", self.table.len());
        let now = self.position();

        let mut table_copy = EntryTable::new();
        let mut scratch = Tally::new();
        for entry in self.table.iter() {
            let mut copy = entry.snapshot();
            if copy.is_open() {
                // As if the viewer paused right now
                copy.close(now)?;
            }
            scratch.add(&copy)?;
            table_copy.append(copy);
        }

        let summary = ViewingSummary::new(
            scratch.traverse().clone(),
            self.clock.duration(),
            scratch.anomaly_count(),
        );

        let precision = self.config.seconds_precision;
        if self.config.include_entry_table {
            self.sink.emit("Current entries:");
            report::write_table(&mut self.sink, &self.table, precision);
            self.sink.emit("Assuming a pause now:");
            report::write_table(&mut self.sink, &table_copy, precision);
        }
        self.sink.emit("Estimated totals:");
        report::write_summary(&mut self.sink, &summary, precision);
        self.last_peek = Some(summary.clone());

        Ok(summary)
    }

    /// Current media position, with unusable readings treated as the start of the media
    fn position(&self) -> Seconds {
        let position = self.clock.now();
        if position.is_finite() {
            position
        } else {
            log::warn!("Stats: media clock reported {position}, using 0");
            0.0
        }
    }

    fn ensure_healthy(&self) -> Result<(), StatsError> {
        match self.fault {
            Some(fault) => Err(StatsError::Degraded(fault)),
            None => Ok(()),
        }
    }

    fn degrade(&mut self, fault: StateFault) -> StatsError {
        log::error!("Stats: {fault}. Viewing statistics will stop updating");
        self.fault = Some(fault);
        self.peek_timer.stop();
        StatsError::Fault(fault)
    }
}
