//! Recording-related Tauri commands

use crate::capture::audio::get_audio_input_devices;
use crate::capture::video::get_cameras as enumerate_cameras;
use crate::capture::{AudioDeviceInfo, CameraInfo, RgbaFrame};
use crate::commands::library::LibraryState;
use crate::commands::settings::SettingsState;
use crate::library::RecordingEntry;
use crate::recorder::{
    discard_after_delay, format_hms, DownloadedRecording, RecorderCoordinator, RecordingMode,
    RecordingState, DOWNLOAD_DISCARD_DELAY,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tauri::{AppHandle, Manager, State};
use tokio::sync::Mutex;

/// Application state for recording
pub struct RecorderState {
    pub coordinator: Arc<Mutex<RecorderCoordinator>>,
}

impl RecorderState {
    pub fn new(coordinator: RecorderCoordinator) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
        }
    }
}

/// Get list of available audio input devices (microphones)
#[tauri::command]
pub async fn get_audio_devices() -> Result<Vec<AudioDeviceInfo>, String> {
    Ok(get_audio_input_devices())
}

/// Get list of available cameras/webcams
#[tauri::command]
pub async fn get_cameras() -> Result<Vec<CameraInfo>, String> {
    Ok(enumerate_cameras())
}

/// Start recording in the given mode
#[tauri::command]
pub async fn start_recording(
    state: State<'_, RecorderState>,
    mode: RecordingMode,
) -> Result<(), String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.start(mode).map_err(|e| e.to_string())
}

/// Stop the active recording
#[tauri::command]
pub async fn stop_recording(state: State<'_, RecorderState>) -> Result<(), String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.stop().map_err(|e| e.to_string())
}

/// Toggle between recording and paused
#[tauri::command]
pub async fn toggle_pause(state: State<'_, RecorderState>) -> Result<RecordingState, String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.toggle_pause();
    Ok(coordinator.state())
}

/// Select the capture mode, releasing any held devices
#[tauri::command]
pub async fn set_recording_mode(
    state: State<'_, RecorderState>,
    mode: RecordingMode,
) -> Result<(), String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.set_mode(mode);
    Ok(())
}

/// Get current recording state
#[tauri::command]
pub async fn get_recording_state(state: State<'_, RecorderState>) -> Result<RecordingState, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.state())
}

/// Get the elapsed recording time as `HH:MM:SS`
#[tauri::command]
pub async fn get_elapsed(state: State<'_, RecorderState>) -> Result<String, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(format_hms(coordinator.elapsed()))
}

/// Save the recording to the download directory
///
/// After a successful save the recording is discarded automatically once
/// the usual grace period has passed.
#[tauri::command]
pub async fn download_recording(
    app: AppHandle,
    state: State<'_, RecorderState>,
    settings: State<'_, SettingsState>,
    library: State<'_, LibraryState>,
) -> Result<Option<DownloadedRecording>, String> {
    let dest_dir = download_dir(&app, &settings).await?;

    let downloaded = {
        let mut coordinator = state.coordinator.lock().await;
        coordinator.download(&dest_dir).map_err(|e| e.to_string())?
    };

    if let Some(ref recording) = downloaded {
        let entry = RecordingEntry::new(
            recording.path.clone(),
            recording.mode,
            recording.size_bytes,
        );
        library
            .store
            .lock()
            .await
            .add_entry(entry)
            .map_err(|e| e.to_string())?;

        tauri::async_runtime::spawn(discard_after_delay(
            state.coordinator.clone(),
            DOWNLOAD_DISCARD_DELAY,
        ));
    }

    Ok(downloaded)
}

/// Discard the stopped recording
#[tauri::command]
pub async fn discard_recording(state: State<'_, RecorderState>) -> Result<(), String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.discard();
    Ok(())
}

/// Save the most recent camera frame as a PNG
#[tauri::command]
pub async fn capture_snapshot(
    app: AppHandle,
    state: State<'_, RecorderState>,
    settings: State<'_, SettingsState>,
) -> Result<PathBuf, String> {
    let frame = {
        let coordinator = state.coordinator.lock().await;
        coordinator.snapshot()
    }
    .ok_or_else(|| "No active video capture".to_string())?;

    let dest_dir = download_dir(&app, &settings).await?;
    std::fs::create_dir_all(&dest_dir).map_err(|e| e.to_string())?;

    let path = dest_dir.join(format!("screenshot_{}.png", Utc::now().timestamp_millis()));
    write_png(&path, &frame).map_err(|e| e.to_string())?;

    tracing::info!("Saved snapshot to {:?}", path);
    Ok(path)
}

/// Resolve the effective download directory
async fn download_dir(
    app: &AppHandle,
    settings: &State<'_, SettingsState>,
) -> Result<PathBuf, String> {
    let configured = settings
        .store
        .lock()
        .await
        .load()
        .map_err(|e| e.to_string())?
        .download_dir;

    match configured {
        Some(dir) => Ok(dir),
        None => app.path().download_dir().map_err(|e| e.to_string()),
    }
}

fn write_png(path: &Path, frame: &RgbaFrame) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
    let writer = std::io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
    writer
        .write_image_data(&frame.data)
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_png_roundtrips_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.png");

        let frame = RgbaFrame {
            width: 4,
            height: 2,
            data: vec![0x80; 4 * 2 * 4],
        };
        write_png(&path, &frame).unwrap();

        let decoder = png::Decoder::new(std::fs::File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(info.color_type, png::ColorType::Rgba);
    }
}
