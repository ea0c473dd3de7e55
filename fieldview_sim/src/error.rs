//! Harness error type.

use fieldview_core::{ConfigError, EngineError};
use fieldview_env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Engine rejected a command: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    #[error("Loop stalled at tick {0}: no frame was requested")]
    Stalled(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
