//! Live chunked encoding
//!
//! The recorder feeds raw capture data into a `ChunkEncoder`, which emits
//! an ordered sequence of opaque container chunks while recording and a
//! single finalize signal once the last chunk has been delivered. The
//! production implementation drives an FFmpeg child process.

pub mod ffmpeg;

pub use ffmpeg::FfmpegEncoder;

use crate::capture::{AudioParams, CaptureStream, VideoParams};
use thiserror::Error;

/// Encoder-related errors
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start encoder: {0}")]
    Spawn(String),

    #[error("Encoder pipe error: {0}")]
    Pipe(String),
}

/// Result type for encoder operations
pub type EncoderResult<T> = Result<T, EncoderError>;

/// Encoder activity states, mirroring the recorder control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Not encoding; finalize has run (or encoding never started)
    Inactive,
    /// Accepting and encoding input
    Recording,
    /// Input is discarded until resumed
    Paused,
}

/// Input parameters for one encoding session
#[derive(Debug, Clone, Copy)]
pub struct EncoderSettings {
    pub audio: Option<AudioParams>,
    pub video: Option<VideoParams>,
}

impl EncoderSettings {
    /// Derive settings from an acquired capture stream
    pub fn for_stream(stream: &CaptureStream) -> Self {
        Self {
            audio: stream.audio_params(),
            video: stream.video_params(),
        }
    }
}

/// Called with each emitted chunk, in capture order
pub type ChunkCallback = Box<dyn FnMut(Vec<u8>) + Send>;

/// Called exactly once, after the final chunk
pub type FinalizeCallback = Box<dyn FnOnce() + Send>;

/// Factory used by the coordinator so tests can substitute a fake encoder
pub type EncoderFactory = Box<
    dyn Fn(
            EncoderSettings,
            ChunkCallback,
            FinalizeCallback,
        ) -> EncoderResult<std::sync::Arc<dyn ChunkEncoder>>
        + Send
        + Sync,
>;

/// A live encoder bound to one capture session
///
/// Write sinks are callable from capture threads; control methods are
/// called by the coordinator. `stop` is idempotent and blocks until the
/// finalize callback has run, so callers observe a fully assembled chunk
/// sequence afterwards.
pub trait ChunkEncoder: Send + Sync {
    fn state(&self) -> EncoderState;

    /// Feed interleaved f32le audio samples; returns false when not recording
    fn write_audio(&self, data: &[u8]) -> bool;

    /// Feed one raw RGBA frame; returns false when not recording
    fn write_video(&self, data: &[u8]) -> bool;

    /// Suspend encoding; input is dropped until `resume`
    fn pause(&self);

    /// Resume a paused encoder
    fn resume(&self);

    /// Finalize the recording; no-op when already inactive
    fn stop(&self) -> EncoderResult<()>;
}
