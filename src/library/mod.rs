//! Recordings library
//!
//! Tracks downloaded recordings and their per-file metadata (bookmarks,
//! last playback position) on disk.

pub mod schema;
pub mod store;

pub use schema::{Bookmark, MediaSidecar, PlaybackPosition, RecordingEntry};
pub use store::{LibraryError, LibraryResult, LibraryStore};
