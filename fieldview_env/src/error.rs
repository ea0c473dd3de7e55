//! Error types for the FieldView environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Every publisher of a snapshot hand-off was dropped
    #[error("Snapshot hand-off closed")]
    HandoffClosed,

    /// The frame scheduler was asked to pace at an unusable rate
    #[error("Invalid frame rate: {0} fps")]
    InvalidFrameRate(u32),
}
