//! Capture trait definitions
//!
//! Device-agnostic seams between the recorder and the capture hardware.
//! A `MediaSource` hands out a `CaptureStream` for a set of constraints;
//! the stream owns one `CaptureTrack` per device. Tracks begin delivering
//! data once an encoder is attached and must be stopped exactly once.

use crate::encoder::ChunkEncoder;
use crate::visualizer::SpectrumTap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Capture-related errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Whether this is an input device
    pub is_input: bool,

    /// Whether this is the default device
    pub is_default: bool,
}

/// Information about a camera/webcam
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Supported resolutions
    pub supported_resolutions: Vec<Resolution>,
}

/// Video resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Which devices a capture stream should acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub audio: bool,
    pub video: bool,
}

impl StreamConstraints {
    /// Microphone only
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }

    /// Camera plus microphone
    pub fn audio_video() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Negotiated audio capture parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Negotiated video capture parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Kind of media a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A single decoded RGBA frame, used for snapshots
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One live capture device binding
///
/// A track starts delivering data to the encoder (and, for audio, the
/// spectrum tap) once `attach` is called. `stop` releases the underlying
/// device; it is idempotent, but a stream's tracks are expected to be
/// stopped exactly once per acquisition.
pub trait CaptureTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    fn label(&self) -> String;

    /// Wire the track's output into an encoder and an optional spectrum tap
    fn attach(&self, encoder: Arc<dyn ChunkEncoder>, tap: Option<Arc<SpectrumTap>>);

    /// Release the underlying device
    fn stop(&self);

    fn is_stopped(&self) -> bool;

    /// Most recent decoded frame, if this is a video track
    fn latest_frame(&self) -> Option<RgbaFrame> {
        None
    }
}

/// An acquired set of capture tracks plus their negotiated parameters
pub struct CaptureStream {
    tracks: Vec<Arc<dyn CaptureTrack>>,
    audio: Option<AudioParams>,
    video: Option<VideoParams>,
}

impl CaptureStream {
    pub fn new(
        tracks: Vec<Arc<dyn CaptureTrack>>,
        audio: Option<AudioParams>,
        video: Option<VideoParams>,
    ) -> Self {
        Self {
            tracks,
            audio,
            video,
        }
    }

    pub fn audio_params(&self) -> Option<AudioParams> {
        self.audio
    }

    pub fn video_params(&self) -> Option<VideoParams> {
        self.video
    }

    pub fn tracks(&self) -> &[Arc<dyn CaptureTrack>] {
        &self.tracks
    }

    /// Attach every track to the given encoder
    pub fn attach(&self, encoder: &Arc<dyn ChunkEncoder>, tap: Option<&Arc<SpectrumTap>>) {
        for track in &self.tracks {
            track.attach(encoder.clone(), tap.cloned());
        }
    }

    /// Stop every track, releasing device access
    pub fn stop_tracks(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn all_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.is_stopped())
    }

    /// Most recent decoded frame from the stream's video track, if any
    pub fn latest_frame(&self) -> Option<RgbaFrame> {
        self.tracks.iter().find_map(|t| t.latest_frame())
    }
}

/// Source of capture streams
///
/// The production implementation acquires real devices; tests substitute
/// fakes. Acquisition may be rejected by the platform or the user and is
/// surfaced as a `CaptureError`.
pub trait MediaSource: Send + Sync {
    fn open(&self, constraints: StreamConstraints) -> CaptureResult<CaptureStream>;
}
