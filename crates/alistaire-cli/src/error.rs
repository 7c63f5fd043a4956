//! Error types for the launcher library.

use std::path::PathBuf;

use alistaire_hal::HalError;
use thiserror::Error;

/// Errors raised while loading settings, data files and secrets.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Failed to parse JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("Secret '{key}' missing or empty in {}", path.display())]
    MissingSecret { key: String, path: PathBuf },

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: String, value: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Hal(#[from] HalError),
}

impl LauncherError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for launcher operations.
pub type LauncherResult<T> = Result<T, LauncherError>;
