//! Library-related Tauri commands
//!
//! Commands for listing recordings and managing their bookmarks and
//! saved playback positions.

use crate::library::{Bookmark, LibraryStore, RecordingEntry};
use crate::utils::error::{AppError, ErrorResponse};
use tauri::State;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Application state for the recordings library
pub struct LibraryState {
    pub store: Mutex<LibraryStore>,
}

impl LibraryState {
    pub fn new(root: std::path::PathBuf) -> Result<Self, AppError> {
        let store = LibraryStore::open(root).map_err(AppError::from)?;
        Ok(Self {
            store: Mutex::new(store),
        })
    }
}

fn into_response(error: crate::library::LibraryError) -> ErrorResponse {
    ErrorResponse::from(AppError::from(error))
}

/// List all recordings, newest first
#[tauri::command]
pub async fn list_recordings(
    state: State<'_, LibraryState>,
) -> Result<Vec<RecordingEntry>, ErrorResponse> {
    state.store.lock().await.entries().map_err(into_response)
}

/// Remove a recording and its metadata
#[tauri::command]
pub async fn remove_recording(
    state: State<'_, LibraryState>,
    id: Uuid,
) -> Result<RecordingEntry, ErrorResponse> {
    state
        .store
        .lock()
        .await
        .remove_entry(id)
        .map_err(into_response)
}

/// Bookmarks of a recording
#[tauri::command]
pub async fn get_bookmarks(
    state: State<'_, LibraryState>,
    filename: String,
) -> Result<Vec<Bookmark>, ErrorResponse> {
    state
        .store
        .lock()
        .await
        .bookmarks(&filename)
        .map_err(into_response)
}

/// Add a bookmark, returning the updated list
#[tauri::command]
pub async fn add_bookmark(
    state: State<'_, LibraryState>,
    filename: String,
    name: String,
    time_secs: f64,
) -> Result<Vec<Bookmark>, ErrorResponse> {
    state
        .store
        .lock()
        .await
        .add_bookmark(&filename, Bookmark::new(name, time_secs))
        .map_err(into_response)
}

/// Delete a bookmark by index, returning the updated list
#[tauri::command]
pub async fn delete_bookmark(
    state: State<'_, LibraryState>,
    filename: String,
    index: usize,
) -> Result<Vec<Bookmark>, ErrorResponse> {
    state
        .store
        .lock()
        .await
        .delete_bookmark(&filename, index)
        .map_err(into_response)
}

/// Persist the last playback position of a recording
#[tauri::command]
pub async fn save_playback_position(
    state: State<'_, LibraryState>,
    filename: String,
    position_secs: f64,
) -> Result<(), ErrorResponse> {
    state
        .store
        .lock()
        .await
        .save_position(&filename, position_secs)
        .map_err(into_response)
}

/// Last saved playback position, if any
#[tauri::command]
pub async fn get_playback_position(
    state: State<'_, LibraryState>,
    filename: String,
) -> Result<Option<f64>, ErrorResponse> {
    state
        .store
        .lock()
        .await
        .position(&filename)
        .map_err(into_response)
}
