use async_trait::async_trait;
use eeg_types::Batch;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::mock_data_generator::EegGenerator;
use crate::types::{BatchStream, SampleSource, SourceError};

/// Configuration for the synthetic EEG source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSourceConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Channel names reported with every batch
    pub channels: Vec<String>,
    /// Samples per batch
    pub batch_size: usize,
    /// Fail each opened stream with `Disconnected` after this many batches
    pub drop_after_batches: Option<u64>,
    /// Fixed RNG seed for reproducible data
    pub seed: Option<u64>,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 256.0,
            channels: ["TP9", "AF7", "AF8", "TP10"].iter().map(|s| s.to_string()).collect(),
            batch_size: 16,
            drop_after_batches: None,
            seed: None,
        }
    }
}

/// A sample source that synthesizes EEG-like data in real time.
pub struct MockSource {
    config: MockSourceConfig,
    opened: u64,
}

impl MockSource {
    pub fn new(config: MockSourceConfig) -> Result<Self, SourceError> {
        if !(config.sample_rate > 0.0 && config.sample_rate.is_finite()) {
            return Err(SourceError::Configuration(format!(
                "sample rate must be positive, got {}",
                config.sample_rate
            )));
        }
        if config.batch_size == 0 {
            return Err(SourceError::Configuration("batch size must be at least 1".to_string()));
        }
        if config.channels.is_empty() {
            return Err(SourceError::Configuration(
                "At least one channel must be configured".to_string(),
            ));
        }
        info!("MockSource created with config: {:?}", config);
        Ok(Self { config, opened: 0 })
    }

    pub fn config(&self) -> &MockSourceConfig {
        &self.config
    }
}

#[async_trait]
impl SampleSource for MockSource {
    fn name(&self) -> &str {
        "mock_eeg"
    }

    async fn open(&mut self) -> Result<Box<dyn BatchStream>, SourceError> {
        self.opened += 1;
        // Vary the seed per connection so a reconnect does not replay identical data
        let seed = self.config.seed.map(|s| s.wrapping_add(self.opened));
        let generator = EegGenerator::new(self.config.sample_rate, self.config.channels.len(), seed);

        let period = Duration::from_secs_f64(self.config.batch_size as f64 / self.config.sample_rate);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("MockSource connection #{} opened, batch period {:?}", self.opened, period);
        Ok(Box::new(MockStream {
            generator,
            ticker,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels.clone(),
            batch_size: self.config.batch_size,
            drop_after: self.config.drop_after_batches,
            emitted: 0,
        }))
    }
}

struct MockStream {
    generator: EegGenerator,
    ticker: Interval,
    sample_rate: f64,
    channels: Vec<String>,
    batch_size: usize,
    drop_after: Option<u64>,
    emitted: u64,
}

#[async_trait]
impl BatchStream for MockStream {
    async fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
        if let Some(limit) = self.drop_after {
            if self.emitted >= limit {
                warn!("MockSource simulating link drop after {} batches", self.emitted);
                return Err(SourceError::Disconnected(format!(
                    "simulated link drop after {} batches",
                    self.emitted
                )));
            }
        }

        self.ticker.tick().await;
        self.emitted += 1;
        Ok(Some(Batch::new(
            self.sample_rate,
            self.channels.clone(),
            self.generator.next_samples(self.batch_size),
        )))
    }

    async fn close(&mut self) {
        debug!("MockSource stream closed after {} batches", self.emitted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MockSourceConfig {
        MockSourceConfig {
            seed: Some(3),
            ..MockSourceConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_have_configured_shape() {
        let mut source = MockSource::new(config()).unwrap();
        let mut stream = source.open().await.unwrap();
        for _ in 0..3 {
            let batch = stream.next_batch().await.unwrap().unwrap();
            assert_eq!(batch.len(), 16);
            assert_eq!(batch.channel_names, vec!["TP9", "AF7", "AF8", "TP10"]);
            assert_eq!(batch.sampling_rate, 256.0);
            assert!(batch.samples.iter().all(|s| s.len() == 4));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_are_paced_at_sample_rate() {
        let mut source = MockSource::new(config()).unwrap();
        let mut stream = source.open().await.unwrap();
        let start = tokio::time::Instant::now();
        // The first tick is immediate; sixteen more take one second at 16 samples per batch.
        for _ in 0..17 {
            stream.next_batch().await.unwrap();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(990), "{elapsed:?}");
        assert!(elapsed <= Duration::from_millis(1010), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_link_drop() {
        let mut source = MockSource::new(MockSourceConfig {
            drop_after_batches: Some(2),
            ..config()
        })
        .unwrap();
        let mut stream = source.open().await.unwrap();
        assert!(stream.next_batch().await.unwrap().is_some());
        assert!(stream.next_batch().await.unwrap().is_some());
        assert!(matches!(stream.next_batch().await, Err(SourceError::Disconnected(_))));

        // Reopening starts a fresh connection.
        let mut stream = source.open().await.unwrap();
        assert!(stream.next_batch().await.unwrap().is_some());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = MockSource::new(MockSourceConfig {
            batch_size: 0,
            ..MockSourceConfig::default()
        });
        assert!(matches!(result, Err(SourceError::Configuration(_))));
    }
}
