//! Settings-related Tauri commands

use crate::settings::{AppSettings, SettingsStore};
use crate::utils::error::{AppError, ErrorResponse};
use tauri::State;
use tokio::sync::Mutex;

/// Application state for settings
pub struct SettingsState {
    pub store: Mutex<SettingsStore>,
}

impl SettingsState {
    pub fn new(path: std::path::PathBuf) -> Self {
        Self {
            store: Mutex::new(SettingsStore::new(path)),
        }
    }
}

fn into_response(error: crate::settings::SettingsError) -> ErrorResponse {
    ErrorResponse::from(AppError::from(error))
}

/// Load the current settings
#[tauri::command]
pub async fn get_settings(state: State<'_, SettingsState>) -> Result<AppSettings, ErrorResponse> {
    state.store.lock().await.load().map_err(into_response)
}

/// Persist updated settings
#[tauri::command]
pub async fn update_settings(
    state: State<'_, SettingsState>,
    settings: AppSettings,
) -> Result<(), ErrorResponse> {
    state
        .store
        .lock()
        .await
        .save(&settings)
        .map_err(into_response)
}
