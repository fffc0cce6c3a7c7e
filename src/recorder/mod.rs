//! Recording system module
//!
//! Implements the capture-to-blob pipeline:
//! - CaptureSession binding a stream, an encoder, and the chunk sequence
//! - RecorderCoordinator driving the guarded state machine
//! - Recorder events (notifications, ticks, visualizer frames)

pub mod coordinator;
pub mod error;
pub mod session;
pub mod state;

pub use coordinator::{
    discard_after_delay, download_filename, download_then_discard, RecorderCoordinator,
    RecorderEvent, DOWNLOAD_DISCARD_DELAY,
};
pub use error::{RecorderError, RecorderResult};
pub use session::CaptureSession;
pub use state::{
    format_hms, DownloadedRecording, Notification, RecordingMode, RecordingState, Severity,
};
