use std::rc::Rc;

use reprise::{ManualClock, MediaClock, PlaybackAction, ReportSink, StatsError, ViewingStats};
use web_time::{Duration, Instant};

use crate::script::ScriptEvent;

/// A media element driven by script events instead of a viewer
///
/// Turns media events into the coarse actions the tracker understands: `play` starts a
/// viewing interval, `pause` and `ended` stop it, and a seek while playing is a stop at the
/// old position followed by a start at the new one.
#[derive(Debug)]
pub struct SimulatedPlayer {
    clock: Rc<ManualClock>,
    playing: bool,
    started_at: Instant,
    elapsed: Duration,
    tick: Duration,
}

impl SimulatedPlayer {
    pub fn new(clock: Rc<ManualClock>, tick: Duration) -> Self {
        Self {
            clock,
            playing: false,
            started_at: Instant::now(),
            elapsed: Duration::ZERO,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Simulated wall-clock instant
    pub fn now(&self) -> Instant {
        self.started_at + self.elapsed
    }

    pub fn position(&self) -> f64 {
        self.clock.now()
    }

    /// Apply one event
    ///
    /// Statistics faults are logged and otherwise ignored: playback carries on regardless.
    pub fn apply<S: ReportSink>(
        &mut self,
        event: ScriptEvent,
        stats: &mut ViewingStats<Rc<ManualClock>, S>,
    ) {
        log::debug!("Player: {event} at {:.3}s", self.position());

        match event {
            ScriptEvent::Play => {
                if !self.playing {
                    self.playing = true;
                    self.notify(stats, PlaybackAction::PlayBegins);
                }
            }
            ScriptEvent::Pause => self.halt(stats),
            ScriptEvent::Ended => {
                self.clock.set_position(self.clock.duration());
                self.halt(stats);
            }
            ScriptEvent::Seek { to } => {
                let target = to.clamp(0.0, self.clock.duration().max(0.0));
                if self.playing {
                    self.notify(stats, PlaybackAction::PlayStops);
                    self.clock.set_position(target);
                    self.notify(stats, PlaybackAction::PlayBegins);
                } else {
                    self.clock.set_position(target);
                    self.notify(stats, PlaybackAction::PlayStops);
                }
            }
            ScriptEvent::Wait { seconds } => match Duration::try_from_secs_f64(seconds) {
                Ok(total) => self.wait(total, stats),
                Err(error) => log::warn!("Player: cannot wait {seconds}s: {error}"),
            },
        }
    }

    /// Let time pass in ticks, advancing the media while playing and polling the peek timer
    fn wait<S: ReportSink>(
        &mut self,
        total: Duration,
        stats: &mut ViewingStats<Rc<ManualClock>, S>,
    ) {
        let mut remaining = total;
        while !remaining.is_zero() {
            let step = remaining.min(self.tick);
            remaining -= step;
            self.elapsed += step;

            if self.playing {
                let duration = self.clock.duration();
                let position = self.position() + step.as_secs_f64();
                if position >= duration {
                    self.clock.set_position(duration);
                    log::debug!("Player: reached the end of the media");
                    self.halt(stats);
                    continue;
                }
                self.clock.set_position(position);
            }

            if let Err(StatsError::Fault(fault)) = stats.tick(self.now()) {
                log::warn!("Player: statistics fault during peek: {fault}");
            }
        }
    }

    fn halt<S: ReportSink>(&mut self, stats: &mut ViewingStats<Rc<ManualClock>, S>) {
        if self.playing {
            self.playing = false;
            self.notify(stats, PlaybackAction::PlayStops);
        }
    }

    fn notify<S: ReportSink>(
        &self,
        stats: &mut ViewingStats<Rc<ManualClock>, S>,
        action: PlaybackAction,
    ) {
        match stats.notify_playback_action_at(action, self.now()) {
            Ok(transition) => log::debug!("Player: {action} -> {transition:?}"),
            Err(StatsError::Degraded(fault)) => {
                log::debug!("Player: {action} ignored, statistics disabled ({fault})");
            }
            Err(error) => log::warn!("Player: statistics fault on {action}: {error}"),
        }
    }
}
