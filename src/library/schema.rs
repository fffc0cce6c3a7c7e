//! Library schema definitions
//!
//! Types persisted by the recordings library: the index of downloaded
//! recordings plus the per-file sidecar holding bookmarks and the last
//! playback position.

use crate::recorder::RecordingMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// One downloaded recording known to the library
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingEntry {
    /// Stable id
    pub id: Uuid,

    /// File name within the download directory
    pub filename: String,

    /// Absolute path of the media file
    pub path: PathBuf,

    /// Mode the recording was captured in
    pub mode: RecordingMode,

    /// Size of the media file in bytes
    pub size_bytes: u64,

    /// When the recording was saved
    pub created_at: DateTime<Utc>,
}

impl RecordingEntry {
    /// Create an entry for a freshly downloaded recording
    pub fn new(path: PathBuf, mode: RecordingMode, size_bytes: u64) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            filename,
            path,
            mode,
            size_bytes,
            created_at: Utc::now(),
        }
    }
}

/// A named position within a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Display name
    pub name: String,

    /// Position in seconds
    pub time_secs: f64,

    /// When the bookmark was created
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(name: impl Into<String>, time_secs: f64) -> Self {
        Self {
            name: name.into(),
            time_secs,
            created_at: Utc::now(),
        }
    }
}

/// Last playback position of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPosition {
    /// Position in seconds
    pub position_secs: f64,

    /// When the position was last saved
    pub updated_at: DateTime<Utc>,
}

/// Per-recording sidecar persisted next to the library index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSidecar {
    /// Bookmarks within the recording
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,

    /// Last playback position, if one was saved
    #[serde(default)]
    pub playback: Option<PlaybackPosition>,
}
