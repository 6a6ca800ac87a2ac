use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use crate::app::{App, StdoutSink};
use crate::config::Settings;
use crate::error::HostError;
use crate::script::Script;

mod app;
mod config;
mod error;
mod player;
mod script;

/// Replay a scripted viewing session and report how much of the media was watched
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Session script (TOML)
    script: PathBuf,

    /// Directory holding `settings.toml`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    const fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn run(cli: Cli) -> Result<(), HostError> {
    let settings = Settings::get(cli.config)?;
    let script = Script::load(&cli.script)?;

    log::info!(
        "Replaying {} events over {}s of media",
        script.events.len(),
        script.media.duration
    );

    let stats = App::new(settings, script).run(StdoutSink);
    if let Some(fault) = stats.fault() {
        log::warn!("Statistics were disabled during replay: {fault}");
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
