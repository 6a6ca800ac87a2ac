use std::rc::Rc;

use reprise::{Configuration, ManualClock, ReportSink, ViewingStats};

use crate::config::Settings;
use crate::player::SimulatedPlayer;
use crate::script::{Script, ScriptEvent};

/// Prints report lines as they come
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        println!("{line}");
    }
}

/// The app itself
pub struct App {
    settings: Settings,
    script: Script,
}

impl App {
    /// Creates a new `App`
    pub const fn new(settings: Settings, script: Script) -> Self {
        Self { settings, script }
    }

    /// Replays the script, returning the tracker in its final state
    pub fn run<S: ReportSink>(&self, sink: S) -> ViewingStats<Rc<ManualClock>, S> {
        let clock = Rc::new(ManualClock::new(self.script.media.duration));
        clock.set_position(self.script.media.start_at);

        let mut stats = ViewingStats::with_sink(Rc::clone(&clock), sink)
            .with_configuration(Configuration::from(&self.settings));
        let mut player = SimulatedPlayer::new(clock, self.settings.tick());

        for event in &self.script.events {
            player.apply(*event, &mut stats);
        }

        if player.is_playing() {
            log::info!("Script ended while playing, pausing");
            player.apply(ScriptEvent::Pause, &mut stats);
        }

        stats
    }
}
