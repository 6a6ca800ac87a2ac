use std::path::{Path, PathBuf};

use derive_more::From;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

#[derive(Debug, From, Error)]
pub enum ScriptError {
    #[error("Failed to read script '{path}': {error}")]
    #[from(skip)]
    ReadFile { path: PathBuf, error: std::io::Error },

    #[error("Failed to parse script: {0}")]
    Parse(toml::de::Error),

    #[error("Invalid script: {0}")]
    #[from(skip)]
    Invalid(String),
}

/// A recorded viewing session: the media, then what the viewer did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub media: Media,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    /// Media duration in seconds
    pub duration: f64,
    /// Where the playhead rests before the first event
    #[serde(default)]
    pub start_at: f64,
}

/// What the media element would report to its event listeners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Display)]
#[serde(tag = "event", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScriptEvent {
    Play,
    Pause,
    Ended,
    /// The viewer dragged or clicked the playhead
    Seek { to: f64 },
    /// Wall-clock time passes
    Wait { seconds: f64 },
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|error| ScriptError::ReadFile {
            path: path.to_path_buf(),
            error,
        })?;
        content.parse()
    }

    fn validate(self) -> Result<Self, ScriptError> {
        let duration = self.media.duration;
        if !duration.is_finite() || duration < 0.0 {
            return Err(ScriptError::Invalid(format!(
                "media duration must be a non-negative number, got {duration}"
            )));
        }

        for (index, event) in self.events.iter().enumerate() {
            let valid = match event {
                ScriptEvent::Seek { to } => to.is_finite(),
                ScriptEvent::Wait { seconds } => seconds.is_finite() && *seconds >= 0.0,
                _ => true,
            };
            if !valid {
                return Err(ScriptError::Invalid(format!(
                    "event #{} ({event}) has an unusable value",
                    index + 1
                )));
            }
        }

        Ok(self)
    }
}

impl std::str::FromStr for Script {
    type Err = ScriptError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let script: Self = toml::from_str(content)?;
        script.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script: Script = r#"
            [media]
            duration = 120.0

            [[events]]
            event = "play"

            [[events]]
            event = "wait"
            seconds = 4.5

            [[events]]
            event = "seek"
            to = 60.0

            [[events]]
            event = "ended"
        "#
        .parse()
        .unwrap();

        assert_eq!(script.media.duration, 120.0);
        assert_eq!(script.media.start_at, 0.0);
        assert_eq!(
            script.events,
            vec![
                ScriptEvent::Play,
                ScriptEvent::Wait { seconds: 4.5 },
                ScriptEvent::Seek { to: 60.0 },
                ScriptEvent::Ended,
            ]
        );
    }

    #[test]
    fn test_rejects_negative_wait() {
        let error = r#"
            [media]
            duration = 10.0

            [[events]]
            event = "wait"
            seconds = -1.0
        "#
        .parse::<Script>()
        .unwrap_err();
        assert!(matches!(error, ScriptError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_event() {
        let error = r#"
            [media]
            duration = 10.0

            [[events]]
            event = "rewind"
        "#
        .parse::<Script>()
        .unwrap_err();
        assert!(matches!(error, ScriptError::Parse(_)));
    }
}
