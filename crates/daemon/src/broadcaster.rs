//! The ingestion path: source -> engine -> subscribers.
//!
//! ```text
//!            open ok
//! CONNECTING ───────▶ STREAMING ──┐ batch: update engine, fan out, yield
//!     ▲    │              │  ◀────┘
//!     │    │ open failed  │ end of stream / read error
//!     │    ▼              ▼
//!     └─── BACKOFF ◀──────┘   (fixed delay, retried forever)
//! ```

use brain_waves_fft_plugin::BandPowerEngine;
use eeg_sensor::{BatchStream, SampleSource};
use eeg_types::{Batch, StreamPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::BroadcasterConfig;
use crate::diagnostics::{Diagnostics, SourceState};
use crate::subscribers::SubscriberRegistry;

enum Phase {
    Connecting,
    Streaming(Box<dyn BatchStream>),
    Backoff,
}

pub struct Broadcaster {
    source: Box<dyn SampleSource>,
    engine: BandPowerEngine,
    subscribers: Arc<SubscriberRegistry>,
    diagnostics: Arc<Diagnostics>,
    retry_delay: Duration,
    rate_mismatch_reported: bool,
}

impl Broadcaster {
    pub fn new(
        source: Box<dyn SampleSource>,
        engine: BandPowerEngine,
        subscribers: Arc<SubscriberRegistry>,
        diagnostics: Arc<Diagnostics>,
        config: &BroadcasterConfig,
    ) -> Self {
        Self {
            source,
            engine,
            subscribers,
            diagnostics,
            retry_delay: config.retry_delay(),
            rate_mismatch_reported: false,
        }
    }

    /// Drive the connect/stream/retry cycle until `shutdown` is cancelled.
    ///
    /// Source failures never end the loop. On cancellation any open stream is
    /// closed and the batch in flight, if any, is dropped undelivered.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Broadcaster is running with source '{}'.", self.source.name());
        let mut phase = Phase::Connecting;

        loop {
            phase = match phase {
                Phase::Connecting => {
                    self.diagnostics.set_source_state(SourceState::Connecting);
                    let attempt = self.diagnostics.record_connect_attempt();
                    debug!(attempt, "Opening source '{}'", self.source.name());

                    let opened = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => None,
                        result = self.source.open() => Some(result),
                    };
                    match opened {
                        None => break,
                        Some(Ok(stream)) => {
                            info!(attempt, "Source '{}' connected, streaming.", self.source.name());
                            self.diagnostics.set_source_state(SourceState::Streaming);
                            Phase::Streaming(stream)
                        }
                        Some(Err(e)) => {
                            warn!(attempt, "Source unavailable: {}. Retrying in {:?}.", e, self.retry_delay);
                            Phase::Backoff
                        }
                    }
                }
                Phase::Streaming(mut stream) => {
                    let next = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => None,
                        result = stream.next_batch() => Some(result),
                    };
                    match next {
                        None => {
                            stream.close().await;
                            break;
                        }
                        Some(Ok(Some(batch))) => {
                            self.process_batch(&batch);
                            // Let the connection tasks sharing this runtime drain their queues.
                            tokio::task::yield_now().await;
                            Phase::Streaming(stream)
                        }
                        Some(Ok(None)) => {
                            warn!("Source '{}' ended. Reconnecting in {:?}.", self.source.name(), self.retry_delay);
                            stream.close().await;
                            Phase::Backoff
                        }
                        Some(Err(e)) => {
                            warn!("Source lost: {}. Reconnecting in {:?}.", e, self.retry_delay);
                            stream.close().await;
                            Phase::Backoff
                        }
                    }
                }
                Phase::Backoff => {
                    self.diagnostics.set_source_state(SourceState::Backoff);
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => Phase::Connecting,
                    }
                }
            };
        }

        self.diagnostics.set_source_state(SourceState::Stopped);
        info!("Broadcaster has shut down.");
    }

    /// Update the engine with one batch and deliver the resulting payload.
    fn process_batch(&mut self, batch: &Batch) {
        if batch.sampling_rate != self.engine.config().sample_rate && !self.rate_mismatch_reported {
            warn!(
                "Source reports {} Hz but the engine is configured for {} Hz; band frequencies will be off.",
                batch.sampling_rate,
                self.engine.config().sample_rate
            );
            self.rate_mismatch_reported = true;
        }

        let outcome = self.engine.update(batch);
        let count = self.engine.config().channel_count();
        let latest = self.engine.latest();
        let payload = StreamPayload {
            sampling_rate: batch.sampling_rate,
            channel_names: batch.leading_channel_names(count, self.engine.channel_names()),
            samples: batch.leading_samples(count),
            bands: self.engine.has_estimate().then(|| latest.clone()),
        };

        let bytes = match payload.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to serialize stream payload: {}", e);
                return;
            }
        };
        let delivered = self.subscribers.fan_out(&bytes);
        self.diagnostics.record_batch(
            &payload.channel_names,
            payload.samples.last().map(Vec::as_slice),
            latest,
        );
        trace!(
            samples = batch.len(),
            delivered,
            accepted = outcome.accepted,
            rejected = outcome.rejected,
            "Batch broadcast"
        );
    }
}
