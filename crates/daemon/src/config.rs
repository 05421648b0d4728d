use eeg_sensor::{MockSource, MockSourceConfig, ReplayConfig, ReplaySource, SampleSource};
use eeg_types::EngineConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::DaemonError;

/// Retry and fan-out settings for the broadcaster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcasterConfig {
    /// Delay between a lost or failed connection and the next attempt
    pub retry_delay_ms: u64,
    /// Outbound queue depth per subscriber
    pub subscriber_queue: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 2000,
            subscriber_queue: 64,
        }
    }
}

impl BroadcasterConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Which sample source to stream from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Mock,
    Replay,
}

/// Configuration for the sample source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Samples per batch
    pub batch_size: usize,
    /// Mock only: simulate a link drop after this many batches per connection
    pub drop_after_batches: Option<u64>,
    /// Mock only: RNG seed
    pub seed: Option<u64>,
    /// Replay only: CSV recording to play back
    pub path: Option<PathBuf>,
    /// Replay only: restart at the first row instead of ending the stream
    pub looped: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Mock,
            batch_size: 16,
            drop_after_batches: None,
            seed: None,
            path: None,
            looped: false,
        }
    }
}

/// Configuration for the daemon
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address the HTTP and WebSocket server listens on
    pub bind_addr: SocketAddr,
    pub engine: EngineConfig,
    pub broadcaster: BroadcasterConfig,
    pub source: SourceConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            engine: EngineConfig::default(),
            broadcaster: BroadcasterConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl DaemonConfig {
    pub fn from_json(json: &str) -> Result<Self, DaemonError> {
        let config: DaemonConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        self.engine.validate()?;
        if self.broadcaster.subscriber_queue == 0 {
            return Err(DaemonError::Config("subscriber_queue must be at least 1".to_string()));
        }
        if self.source.batch_size == 0 {
            return Err(DaemonError::Config("batch_size must be at least 1".to_string()));
        }
        if self.source.kind == SourceKind::Replay && self.source.path.is_none() {
            return Err(DaemonError::Config("replay source requires a path".to_string()));
        }
        Ok(())
    }
}

/// Load daemon configuration from `path`, or use the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<DaemonConfig, DaemonError> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(DaemonConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = DaemonConfig::from_json(&contents)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Construct the configured sample source. Rate and channel names come from the engine config.
pub fn build_source(config: &DaemonConfig) -> Result<Box<dyn SampleSource>, DaemonError> {
    let source: Box<dyn SampleSource> = match config.source.kind {
        SourceKind::Mock => Box::new(MockSource::new(MockSourceConfig {
            sample_rate: config.engine.sample_rate,
            channels: config.engine.channels.clone(),
            batch_size: config.source.batch_size,
            drop_after_batches: config.source.drop_after_batches,
            seed: config.source.seed,
        })?),
        SourceKind::Replay => {
            let path = config
                .source
                .path
                .clone()
                .ok_or_else(|| DaemonError::Config("replay source requires a path".to_string()))?;
            Box::new(ReplaySource::new(ReplayConfig {
                path,
                sample_rate: config.engine.sample_rate,
                batch_size: config.source.batch_size,
                looped: config.source.looped,
            })?)
        }
    };
    info!("Using sample source '{}'", source.name());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_types::FilterDesign;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.broadcaster.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.source.batch_size, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DaemonConfig::from_json(
            r#"{ "engine": { "window_samples": 256, "filter": "fir" }, "broadcaster": { "retry_delay_ms": 500 } }"#,
        )
        .unwrap();
        assert_eq!(config.engine.window_samples, 256);
        assert_eq!(config.engine.filter, FilterDesign::Fir);
        assert_eq!(config.engine.sample_rate, 256.0);
        assert_eq!(config.broadcaster.retry_delay_ms, 500);
        assert_eq!(config.broadcaster.subscriber_queue, 64);
    }

    #[test]
    fn test_invalid_engine_config_rejected() {
        let result = DaemonConfig::from_json(r#"{ "engine": { "channels": [] } }"#);
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }

    #[test]
    fn test_replay_requires_path() {
        let result = DaemonConfig::from_json(r#"{ "source": { "kind": "replay" } }"#);
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bind_addr": "127.0.0.1:9100", "source": {{ "seed": 7 }} }}"#).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9100".parse::<SocketAddr>().unwrap());
        assert_eq!(config.source.seed, Some(7));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/eeg_daemon.json")));
        assert!(matches!(result, Err(DaemonError::Io(_))));
    }

    #[test]
    fn test_build_mock_source() {
        let source = build_source(&DaemonConfig::default()).unwrap();
        assert_eq!(source.name(), "mock_eeg");
    }
}
