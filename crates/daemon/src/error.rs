//! Error types for the daemon

use eeg_sensor::SourceError;
use eeg_types::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

impl From<ConfigError> for DaemonError {
    fn from(err: ConfigError) -> Self {
        DaemonError::Config(err.to_string())
    }
}
