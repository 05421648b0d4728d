//! Stream diagnostics shared between the broadcaster and the HTTP surface

use eeg_types::BandSnapshot;
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

/// Where the broadcaster currently is in its connect/stream/retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    Connecting,
    Streaming,
    Backoff,
    Stopped,
}

/// Copy of the stream state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamStats {
    /// Batches fanned out since startup
    pub messages_sent: u64,
    /// Channel order of the last payload
    pub channels: Vec<String>,
    /// Newest raw sample tuple of the last payload
    pub last_sample: Option<Vec<f64>>,
    pub source_state: SourceState,
    /// Connection attempts since startup
    pub connect_attempts: u64,
    #[serde(skip)]
    pub bands: BandSnapshot,
}

/// Written by the ingestion path once per batch, read by diagnostic queries.
///
/// Readers only ever get a copy; the lock is held for the duration of that copy.
pub struct Diagnostics {
    stats: RwLock<StreamStats>,
}

impl Diagnostics {
    pub fn new(channels: Vec<String>, bands: BandSnapshot) -> Self {
        Self {
            stats: RwLock::new(StreamStats {
                messages_sent: 0,
                channels,
                last_sample: None,
                source_state: SourceState::Connecting,
                connect_attempts: 0,
                bands,
            }),
        }
    }

    pub fn snapshot(&self) -> StreamStats {
        self.stats.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn bands(&self) -> BandSnapshot {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bands
            .clone()
    }

    pub fn source_state(&self) -> SourceState {
        self.stats.read().unwrap_or_else(PoisonError::into_inner).source_state
    }

    pub(crate) fn set_source_state(&self, state: SourceState) {
        self.stats.write().unwrap_or_else(PoisonError::into_inner).source_state = state;
    }

    /// Count a connection attempt and return the running total.
    pub(crate) fn record_connect_attempt(&self) -> u64 {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.connect_attempts += 1;
        stats.connect_attempts
    }

    pub(crate) fn record_batch(&self, channels: &[String], last_sample: Option<&[f64]>, bands: BandSnapshot) {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.messages_sent += 1;
        if stats.channels != channels {
            stats.channels = channels.to_vec();
        }
        stats.last_sample = last_sample.map(<[f64]>::to_vec);
        stats.bands = bands;
    }
}
