//! Configuration types for the band-power engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which high-pass strategy the preprocessor should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDesign {
    /// Zero-phase IIR when it can be designed for the rate and cutoff, FIR otherwise.
    #[default]
    Auto,
    /// Second-order Butterworth high-pass applied forward and backward.
    Iir,
    /// Windowed-sinc FIR high-pass.
    Fir,
}

/// Errors raised when validating configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),
    #[error("window must hold at least 2 samples, got {0}")]
    InvalidWindow(usize),
    #[error("at least one channel must be configured")]
    NoChannels,
    #[error("high-pass cutoff {cutoff} Hz must lie in (0, {nyquist}) Hz")]
    InvalidCutoff { cutoff: f64, nyquist: f64 },
    #[error("artifact threshold '{name}' must be positive, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Configuration for the band-power engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nominal sampling rate in Hz
    pub sample_rate: f64,
    /// Rolling window length in samples
    pub window_samples: usize,
    /// Channel names, in the ordinal order of incoming samples
    pub channels: Vec<String>,
    /// High-pass filter cutoff frequency in Hz
    pub highpass_cutoff_hz: f64,
    /// Reject a window whose peak-to-peak amplitude exceeds this (µV)
    pub artifact_ptp_uv: f64,
    /// Reject a window whose maximum robust |z| exceeds this
    pub artifact_z_max: f64,
    /// High-pass strategy
    pub filter: FilterDesign,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 256.0,
            window_samples: 512,
            channels: ["TP9", "AF7", "AF8", "TP10"].iter().map(|s| s.to_string()).collect(),
            highpass_cutoff_hz: 1.0,
            artifact_ptp_uv: 1500.0,
            artifact_z_max: 6.0,
            filter: FilterDesign::Auto,
        }
    }
}

impl EngineConfig {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.window_samples < 2 {
            return Err(ConfigError::InvalidWindow(self.window_samples));
        }
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        let nyquist = self.sample_rate / 2.0;
        if !(self.highpass_cutoff_hz > 0.0 && self.highpass_cutoff_hz < nyquist) {
            return Err(ConfigError::InvalidCutoff {
                cutoff: self.highpass_cutoff_hz,
                nyquist,
            });
        }
        for (name, value) in [
            ("artifact_ptp_uv", self.artifact_ptp_uv),
            ("artifact_z_max", self.artifact_z_max),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channel_count(), 4);
    }

    #[test]
    fn test_cutoff_above_nyquist_rejected() {
        let config = EngineConfig {
            highpass_cutoff_hz: 200.0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCutoff { .. })));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "window_samples": 256, "filter": "fir" }"#).unwrap();
        assert_eq!(config.window_samples, 256);
        assert_eq!(config.sample_rate, 256.0);
        assert_eq!(config.filter, FilterDesign::Fir);
    }

    #[test]
    fn test_empty_channels_rejected() {
        let config = EngineConfig {
            channels: vec![],
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoChannels));
    }
}
