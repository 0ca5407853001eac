//! Error types for FrameStage.

use thiserror::Error;

/// Main error type for FrameStage operations.
#[derive(Error, Debug)]
pub enum FrameStageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No video buffers allocated")]
    NoBuffers,

    #[error("No such buffer: slot {0}")]
    NoSuchBuffer(usize),

    #[error("Buffer {0} is in use")]
    BufferBusy(usize),

    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for FrameStage operations.
pub type Result<T> = std::result::Result<T, FrameStageError>;
