//! Recording state management
//!
//! Defines the recording state machine, capture modes, and the
//! notification contract shared with the frontend.

use crate::capture::StreamConstraints;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    Idle,
    /// Currently recording
    Recording,
    /// Recording is paused
    Paused,
    /// Recording finished; chunks await download or discard
    Stopped,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// What the recorder captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// Microphone only
    Audio,
    /// Camera plus microphone
    Video,
}

impl RecordingMode {
    /// Stream constraints this mode requests
    pub fn constraints(&self) -> StreamConstraints {
        match self {
            RecordingMode::Audio => StreamConstraints::audio_only(),
            RecordingMode::Video => StreamConstraints::audio_video(),
        }
    }

    /// Lowercase name used in filenames and events
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingMode::Audio => "audio",
            RecordingMode::Video => "video",
        }
    }
}

/// Notification severity; controls visual styling only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }
}

/// Result of a completed download
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedRecording {
    /// Where the file was written
    pub path: std::path::PathBuf,

    /// Size of the assembled recording in bytes
    pub size_bytes: u64,

    /// Mode the recording was captured in
    pub mode: RecordingMode,
}

/// Format an elapsed duration as `HH:MM:SS`
pub fn format_hms(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hms_pads_fields() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_hms(Duration::from_secs(61)), "00:01:01");
        assert_eq!(format_hms(Duration::from_secs(3600)), "01:00:00");
        assert_eq!(format_hms(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RecordingMode::Audio).unwrap(),
            "\"audio\""
        );
        assert_eq!(
            serde_json::to_string(&RecordingState::Paused).unwrap(),
            "\"paused\""
        );
    }

    #[test]
    fn mode_constraints_select_devices() {
        assert!(!RecordingMode::Audio.constraints().video);
        assert!(RecordingMode::Audio.constraints().audio);
        assert!(RecordingMode::Video.constraints().video);
        assert!(RecordingMode::Video.constraints().audio);
    }
}
