//! Library persistence
//!
//! The library root holds `library.json` (the recording index) and one
//! `<filename>.meta.json` sidecar per recording for bookmarks and the
//! saved playback position. Missing files read as empty defaults.

use super::schema::{Bookmark, MediaSidecar, PlaybackPosition, RecordingEntry};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Library-related errors
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown recording: {0}")]
    UnknownRecording(String),

    #[error("No bookmark at index {0}")]
    BookmarkOutOfRange(usize),
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Index file name within the library root
const INDEX_FILE: &str = "library.json";

/// On-disk recordings library
pub struct LibraryStore {
    root: PathBuf,
}

impl LibraryStore {
    /// Open (creating if needed) a library rooted at `root`
    pub fn open(root: PathBuf) -> LibraryResult<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn sidecar_path(&self, filename: &str) -> PathBuf {
        self.root.join(format!("{filename}.meta.json"))
    }

    /// All known recordings, newest first
    pub fn entries(&self) -> LibraryResult<Vec<RecordingEntry>> {
        let path = self.index_path();
        if !path.exists() {
            // No recordings saved yet
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let mut entries: Vec<RecordingEntry> = serde_json::from_str(&content)?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    fn write_entries(&self, entries: &[RecordingEntry]) -> LibraryResult<()> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(self.index_path(), content)?;
        Ok(())
    }

    /// Register a downloaded recording
    pub fn add_entry(&self, entry: RecordingEntry) -> LibraryResult<()> {
        let mut entries = self.entries()?;
        tracing::debug!("Adding recording {} to library", entry.filename);
        entries.push(entry);
        self.write_entries(&entries)
    }

    /// Remove a recording, its media file, and its sidecar
    pub fn remove_entry(&self, id: Uuid) -> LibraryResult<RecordingEntry> {
        let mut entries = self.entries()?;
        let position = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LibraryError::UnknownRecording(id.to_string()))?;
        let entry = entries.remove(position);

        if entry.path.exists() {
            fs::remove_file(&entry.path)?;
        }
        let sidecar = self.sidecar_path(&entry.filename);
        if sidecar.exists() {
            fs::remove_file(&sidecar)?;
        }

        self.write_entries(&entries)?;
        tracing::debug!("Removed recording {} from library", entry.filename);
        Ok(entry)
    }

    /// Read a recording's sidecar; missing sidecars are empty
    pub fn sidecar(&self, filename: &str) -> LibraryResult<MediaSidecar> {
        let path = self.sidecar_path(filename);
        if !path.exists() {
            return Ok(MediaSidecar::default());
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_sidecar(&self, filename: &str, sidecar: &MediaSidecar) -> LibraryResult<()> {
        let content = serde_json::to_string_pretty(sidecar)?;
        fs::write(self.sidecar_path(filename), content)?;
        Ok(())
    }

    /// Add a bookmark and return the updated list
    pub fn add_bookmark(&self, filename: &str, bookmark: Bookmark) -> LibraryResult<Vec<Bookmark>> {
        let mut sidecar = self.sidecar(filename)?;
        sidecar.bookmarks.push(bookmark);
        self.write_sidecar(filename, &sidecar)?;
        Ok(sidecar.bookmarks)
    }

    /// Delete a bookmark by index and return the updated list
    pub fn delete_bookmark(&self, filename: &str, index: usize) -> LibraryResult<Vec<Bookmark>> {
        let mut sidecar = self.sidecar(filename)?;
        if index >= sidecar.bookmarks.len() {
            return Err(LibraryError::BookmarkOutOfRange(index));
        }
        sidecar.bookmarks.remove(index);
        self.write_sidecar(filename, &sidecar)?;
        Ok(sidecar.bookmarks)
    }

    /// Bookmarks of a recording
    pub fn bookmarks(&self, filename: &str) -> LibraryResult<Vec<Bookmark>> {
        Ok(self.sidecar(filename)?.bookmarks)
    }

    /// Save the last playback position
    pub fn save_position(&self, filename: &str, position_secs: f64) -> LibraryResult<()> {
        let mut sidecar = self.sidecar(filename)?;
        sidecar.playback = Some(PlaybackPosition {
            position_secs,
            updated_at: Utc::now(),
        });
        self.write_sidecar(filename, &sidecar)
    }

    /// Last saved playback position, if any
    pub fn position(&self, filename: &str) -> LibraryResult<Option<f64>> {
        Ok(self
            .sidecar(filename)?
            .playback
            .map(|p| p.position_secs))
    }

    /// The library root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecordingMode;
    use tempfile::tempdir;

    fn store(dir: &Path) -> LibraryStore {
        LibraryStore::open(dir.join("library")).unwrap()
    }

    fn sample_entry(dir: &Path, name: &str) -> RecordingEntry {
        let path = dir.join(name);
        fs::write(&path, b"webm-bytes").unwrap();
        RecordingEntry::new(path, RecordingMode::Audio, 10)
    }

    #[test]
    fn empty_library_lists_nothing() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn add_and_remove_entry() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let entry = sample_entry(dir.path(), "recording_audio_a.webm");
        let id = entry.id;
        let media_path = entry.path.clone();

        store.add_entry(entry).unwrap();
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "recording_audio_a.webm");

        let removed = store.remove_entry(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(store.entries().unwrap().is_empty());
        assert!(!media_path.exists());
    }

    #[test]
    fn remove_unknown_entry_fails() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        assert!(matches!(
            store.remove_entry(Uuid::new_v4()),
            Err(LibraryError::UnknownRecording(_))
        ));
    }

    #[test]
    fn bookmarks_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let bookmarks = store
            .add_bookmark("a.webm", Bookmark::new("Intro", 1.5))
            .unwrap();
        assert_eq!(bookmarks.len(), 1);

        store
            .add_bookmark("a.webm", Bookmark::new("Chorus", 42.0))
            .unwrap();

        let bookmarks = store.bookmarks("a.webm").unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[1].name, "Chorus");

        let bookmarks = store.delete_bookmark("a.webm", 0).unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].name, "Chorus");

        assert!(matches!(
            store.delete_bookmark("a.webm", 5),
            Err(LibraryError::BookmarkOutOfRange(5))
        ));
    }

    #[test]
    fn bookmarks_are_scoped_per_recording() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store
            .add_bookmark("a.webm", Bookmark::new("Only in a", 3.0))
            .unwrap();

        assert!(store.bookmarks("b.webm").unwrap().is_empty());
    }

    #[test]
    fn playback_position_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(store.position("a.webm").unwrap(), None);

        store.save_position("a.webm", 12.75).unwrap();
        assert_eq!(store.position("a.webm").unwrap(), Some(12.75));

        // Saving again overwrites
        store.save_position("a.webm", 99.0).unwrap();
        assert_eq!(store.position("a.webm").unwrap(), Some(99.0));

        // Bookmarks survive position updates
        store
            .add_bookmark("a.webm", Bookmark::new("Mark", 5.0))
            .unwrap();
        store.save_position("a.webm", 100.0).unwrap();
        assert_eq!(store.bookmarks("a.webm").unwrap().len(), 1);
    }
}
