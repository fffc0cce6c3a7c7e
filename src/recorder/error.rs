//! Recorder errors

use crate::capture::CaptureError;
use crate::encoder::EncoderError;
use thiserror::Error;

/// Errors surfaced by recorder operations
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Encoder(#[from] EncoderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;
