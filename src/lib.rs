//! Open MediaRec - audio and video recording, made simple.
//!
//! This is the main library crate for the Open MediaRec application.
//! It provides the Tauri application setup and all backend functionality.

pub mod capture;
pub mod commands;
pub mod encoder;
pub mod library;
pub mod recorder;
pub mod settings;
pub mod utils;
pub mod visualizer;

use commands::library::LibraryState;
use commands::recording::RecorderState;
use commands::settings::SettingsState;
use recorder::{RecorderCoordinator, RecorderEvent};
use tauri::{AppHandle, Emitter, Manager};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the application
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "open_mediarec=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Open MediaRec v{}", env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(|app| {
            let cache_dir = app.path().app_cache_dir()?;
            let data_dir = app.path().app_data_dir()?;
            let config_dir = app.path().app_config_dir()?;

            let coordinator = RecorderCoordinator::with_devices(cache_dir.join("preview"));
            forward_recorder_events(app.handle().clone(), coordinator.subscribe());

            app.manage(RecorderState::new(coordinator));
            app.manage(LibraryState::new(data_dir.join("library"))?);
            app.manage(SettingsState::new(config_dir.join("settings.json")));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Recording commands
            commands::recording::get_audio_devices,
            commands::recording::get_cameras,
            commands::recording::start_recording,
            commands::recording::stop_recording,
            commands::recording::toggle_pause,
            commands::recording::set_recording_mode,
            commands::recording::get_recording_state,
            commands::recording::get_elapsed,
            commands::recording::download_recording,
            commands::recording::discard_recording,
            commands::recording::capture_snapshot,
            // Library commands
            commands::library::list_recordings,
            commands::library::remove_recording,
            commands::library::get_bookmarks,
            commands::library::add_bookmark,
            commands::library::delete_bookmark,
            commands::library::save_playback_position,
            commands::library::get_playback_position,
            // Settings commands
            commands::settings::get_settings,
            commands::settings::update_settings,
            // System commands
            commands::system::get_system_info,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Relay recorder events onto the webview event bus
fn forward_recorder_events(
    app: AppHandle,
    mut events: tokio::sync::broadcast::Receiver<RecorderEvent>,
) {
    tauri::async_runtime::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => emit_recorder_event(&app, event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Recorder event forwarder lagged; skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn emit_recorder_event(app: &AppHandle, event: RecorderEvent) {
    let result = match event {
        RecorderEvent::Started { mode } => app.emit("recorder://started", mode),
        RecorderEvent::Stopped => app.emit("recorder://stopped", ()),
        RecorderEvent::Paused => app.emit("recorder://paused", ()),
        RecorderEvent::Resumed => app.emit("recorder://resumed", ()),
        RecorderEvent::Notification(notification) => {
            app.emit("recorder://notification", notification)
        }
        RecorderEvent::Tick { elapsed } => app.emit("recorder://tick", elapsed),
        RecorderEvent::Visualizer { bins } => app.emit("recorder://visualizer", bins),
        RecorderEvent::PlaybackReady { path } => app.emit("recorder://playback", Some(path)),
        RecorderEvent::PlaybackCleared => {
            app.emit("recorder://playback", Option::<std::path::PathBuf>::None)
        }
    };

    if let Err(e) = result {
        tracing::warn!("Failed to emit recorder event: {}", e);
    }
}
