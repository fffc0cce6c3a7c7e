//! Error types and handling
//!
//! Common error types used across the application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Library error: {0}")]
    Library(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl From<crate::recorder::RecorderError> for AppError {
    fn from(error: crate::recorder::RecorderError) -> Self {
        AppError::Recording(error.to_string())
    }
}

impl From<crate::library::LibraryError> for AppError {
    fn from(error: crate::library::LibraryError) -> Self {
        AppError::Library(error.to_string())
    }
}

impl From<crate::settings::SettingsError> for AppError {
    fn from(error: crate::settings::SettingsError) -> Self {
        AppError::Settings(error.to_string())
    }
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Recording(_) => "RECORDING_ERROR",
            AppError::Capture(_) => "CAPTURE_ERROR",
            AppError::Encoder(_) => "ENCODER_ERROR",
            AppError::Library(_) => "LIBRARY_ERROR",
            AppError::Settings(_) => "SETTINGS_ERROR",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
