use derive_more::From;
use thiserror::Error;

use crate::config::ConfigError;
use crate::script::ScriptError;

/// Anything that stops the host before or while loading a session
#[derive(Debug, From, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Script(ScriptError),
}
