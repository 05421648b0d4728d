//! Common types and traits for sample sources

use async_trait::async_trait;
use eeg_types::Batch;
use thiserror::Error;

/// Errors that can occur while opening or reading a sample source.
///
/// Every variant is recoverable from the caller's point of view: the stream
/// is dropped and the source may be opened again later.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// No device or recording was found
    #[error("Source not found: {0}")]
    NotFound(String),
    /// The link dropped mid-stream
    #[error("Source disconnected: {0}")]
    Disconnected(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
    /// Data could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(err.to_string()),
            _ => SourceError::Io(err.to_string()),
        }
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

/// A connectable producer of sample batches.
#[async_trait]
pub trait SampleSource: Send {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Open a new stream. Called again after every disconnect.
    async fn open(&mut self) -> Result<Box<dyn BatchStream>, SourceError>;
}

/// An open connection to a sample source.
#[async_trait]
pub trait BatchStream: Send {
    /// Wait for the next batch.
    ///
    /// Returns `Ok(None)` at end of stream. Must be cancel-safe: dropping the
    /// future before it completes loses no batch that was already returned.
    async fn next_batch(&mut self) -> Result<Option<Batch>, SourceError>;

    /// Release the connection. The stream is not used afterwards.
    async fn close(&mut self) {}
}
