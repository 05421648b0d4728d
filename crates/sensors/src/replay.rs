//! Replay of recorded sessions from CSV.
//!
//! The first row names the channels; every following row is one sample with
//! one voltage (µV) per column. Rows are delivered in batches paced at the
//! configured sample rate.

use async_trait::async_trait;
use eeg_types::Batch;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::types::{BatchStream, SampleSource, SourceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub path: PathBuf,
    pub sample_rate: f64,
    pub batch_size: usize,
    /// Start again from the first row instead of ending the stream
    pub looped: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("recording.csv"),
            sample_rate: 256.0,
            batch_size: 16,
            looped: false,
        }
    }
}

struct Recording {
    channels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

fn read_recording(path: &Path) -> Result<Recording, SourceError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SourceError::NotFound(format!("{}: {}", path.display(), e)),
        _ => SourceError::from(e),
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let channels: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if channels.is_empty() {
        return Err(SourceError::Parse(format!("{}: missing header row", path.display())));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| field.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SourceError::Parse(format!("{} row {}: {}", path.display(), line + 2, e)))?;
        rows.push(row);
    }
    Ok(Recording { channels, rows })
}

/// A sample source that plays back a CSV recording.
pub struct ReplaySource {
    config: ReplayConfig,
}

impl ReplaySource {
    pub fn new(config: ReplayConfig) -> Result<Self, SourceError> {
        if !(config.sample_rate > 0.0 && config.sample_rate.is_finite()) {
            return Err(SourceError::Configuration(format!(
                "sample rate must be positive, got {}",
                config.sample_rate
            )));
        }
        if config.batch_size == 0 {
            return Err(SourceError::Configuration("batch size must be at least 1".to_string()));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn open(&mut self) -> Result<Box<dyn BatchStream>, SourceError> {
        let path = self.config.path.clone();
        let recording = tokio::task::spawn_blocking(move || read_recording(&path))
            .await
            .map_err(|e| SourceError::Io(format!("reader task failed: {e}")))??;
        info!(
            "Replaying {} rows of {:?} from {}",
            recording.rows.len(),
            recording.channels,
            self.config.path.display()
        );

        let period = Duration::from_secs_f64(self.config.batch_size as f64 / self.config.sample_rate);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Box::new(ReplayStream {
            recording,
            ticker,
            sample_rate: self.config.sample_rate,
            batch_size: self.config.batch_size,
            looped: self.config.looped,
            position: 0,
        }))
    }
}

struct ReplayStream {
    recording: Recording,
    ticker: Interval,
    sample_rate: f64,
    batch_size: usize,
    looped: bool,
    position: usize,
}

#[async_trait]
impl BatchStream for ReplayStream {
    async fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
        let total = self.recording.rows.len();
        if self.position >= total {
            if !self.looped || total == 0 {
                debug!("Replay reached end of recording");
                return Ok(None);
            }
            self.position = 0;
        }

        self.ticker.tick().await;
        let end = (self.position + self.batch_size).min(total);
        let samples = self.recording.rows[self.position..end].to_vec();
        self.position = end;
        Ok(Some(Batch::new(
            self.sample_rate,
            self.recording.channels.clone(),
            samples,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn recording(rows: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TP9,AF7,AF8,TP10").unwrap();
        for i in 0..rows {
            let v = i as f64;
            writeln!(file, "{},{},{},{}", v, v + 0.5, -v, 1.0).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn source(path: &Path, looped: bool) -> ReplaySource {
        ReplaySource::new(ReplayConfig {
            path: path.to_path_buf(),
            sample_rate: 256.0,
            batch_size: 16,
            looped,
        })
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_replays_rows_in_batches_then_ends() {
        let file = recording(40);
        let mut stream = source(file.path(), false).open().await.unwrap();

        let first = stream.next_batch().await.unwrap().unwrap();
        assert_eq!(first.channel_names, vec!["TP9", "AF7", "AF8", "TP10"]);
        assert_eq!(first.len(), 16);
        assert_eq!(first.samples[1], vec![1.0, 1.5, -1.0, 1.0]);

        assert_eq!(stream.next_batch().await.unwrap().unwrap().len(), 16);
        let last = stream.next_batch().await.unwrap().unwrap();
        assert_eq!(last.len(), 8);
        assert_eq!(last.samples[0][0], 32.0);
        assert!(stream.next_batch().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_looped_replay_wraps_around() {
        let file = recording(16);
        let mut stream = source(file.path(), true).open().await.unwrap();
        for _ in 0..3 {
            let batch = stream.next_batch().await.unwrap().unwrap();
            assert_eq!(batch.samples[0][0], 0.0);
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = source(&dir.path().join("missing.csv"), false);
        assert!(matches!(source.open().await, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bad_value_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TP9,AF7").unwrap();
        writeln!(file, "1.0,abc").unwrap();
        file.flush().unwrap();
        let mut source = source(file.path(), false);
        assert!(matches!(source.open().await, Err(SourceError::Parse(_))));
    }
}
