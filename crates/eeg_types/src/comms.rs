use bytes::Bytes;
use serde::Serialize;

use crate::bands::BandSnapshot;

/// Payload fanned out to every subscriber once per batch.
///
/// Wire format:
/// `{ "fs": .., "channels": [..], "samples": [[..]], "bands": {..} | null }`.
/// `bands` is `null` until at least one channel's rolling window has filled.
///
/// Rows in `samples` are relayed as received, truncated to the configured
/// channel count but never padded, so a short sample stays short.
/// `channels` are the batch's own names for the leading channels, with any
/// missing names taken from the configured ones. `bands` is always keyed by
/// the configured names, which may therefore differ from `channels`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamPayload {
    #[serde(rename = "fs")]
    pub sampling_rate: f64,
    #[serde(rename = "channels")]
    pub channel_names: Vec<String>,
    pub samples: Vec<Vec<f64>>,
    pub bands: Option<BandSnapshot>,
}

impl StreamPayload {
    /// Serialize once; the resulting buffer is shared by every subscriber.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}
