use eeg_types::{Band, BandPowers, BandSnapshot, Batch, ConfigError, EngineConfig};
use tracing::{debug, trace};

use crate::artifact::{ArtifactGate, Verdict};
use crate::buffer::ChannelBuffer;
use crate::filter::{select_highpass, Preprocessor};
use crate::spectral::SpectralEstimator;

/// Rolling buffer and last accepted band powers for one channel.
#[derive(Debug, Clone)]
pub struct ChannelState {
    name: String,
    buffer: ChannelBuffer,
    bands: BandPowers,
}

impl ChannelState {
    fn new(name: String, window_samples: usize) -> Self {
        Self {
            name,
            buffer: ChannelBuffer::new(window_samples),
            bands: BandPowers::zero(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &ChannelBuffer {
        &self.buffer
    }

    /// Band powers of the most recent clean window; zero until one is accepted.
    pub fn bands(&self) -> &BandPowers {
        &self.bands
    }
}

/// What happened to the full windows evaluated by one `update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Windows that passed the artifact gate and replaced the stored powers.
    pub accepted: usize,
    /// Windows rejected by the artifact gate; stored powers were kept.
    pub rejected: usize,
}

/// Per-channel band-power estimation over a sliding window.
///
/// ```text
/// Batch -> ChannelBuffer -> Preprocessor -> ArtifactGate -> SpectralEstimator -> BandPowers
/// ```
pub struct BandPowerEngine {
    config: EngineConfig,
    channels: Vec<ChannelState>,
    preprocessor: Preprocessor,
    gate: ArtifactGate,
    estimator: SpectralEstimator,
}

impl BandPowerEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let highpass = select_highpass(config.filter, config.sample_rate, config.highpass_cutoff_hz);
        debug!(
            "Band-power engine: {} channels, {} Hz, {} sample window, high-pass '{}'",
            config.channel_count(),
            config.sample_rate,
            config.window_samples,
            highpass.name()
        );

        let channels = config
            .channels
            .iter()
            .map(|name| ChannelState::new(name.clone(), config.window_samples))
            .collect();

        Ok(Self {
            channels,
            preprocessor: Preprocessor::new(highpass),
            gate: ArtifactGate::new(config.artifact_ptp_uv, config.artifact_z_max),
            estimator: SpectralEstimator::new(config.sample_rate, config.window_samples),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn filter_name(&self) -> &'static str {
        self.preprocessor.filter_name()
    }

    /// Route a batch into the channel buffers, then re-estimate every channel
    /// whose window is full.
    ///
    /// Only the first `channel_count` values of each sample are used. A short
    /// sample feeds the leading channels it covers and nothing else.
    pub fn update(&mut self, batch: &Batch) -> UpdateOutcome {
        for sample in &batch.samples {
            for (state, &value) in self.channels.iter_mut().zip(sample.iter()) {
                state.buffer.push(value);
            }
        }

        let mut outcome = UpdateOutcome::default();
        for state in self.channels.iter_mut().filter(|s| s.buffer.is_full()) {
            let filtered = self.preprocessor.process(&state.buffer.snapshot());
            match self.gate.check(&filtered) {
                Verdict::Clean => {
                    state.bands = self.estimator.band_powers(&filtered);
                    outcome.accepted += 1;
                }
                Verdict::Rejected(artifact) => {
                    debug!("Channel {}: window rejected ({}), keeping previous band powers", state.name, artifact);
                    outcome.rejected += 1;
                }
            }
        }
        trace!(
            "Engine update: {} samples, {} windows accepted, {} rejected",
            batch.len(),
            outcome.accepted,
            outcome.rejected
        );
        outcome
    }

    /// Current band powers for every configured channel.
    pub fn latest(&self) -> BandSnapshot {
        BandSnapshot::new(
            self.channels
                .iter()
                .map(|s| (s.name.clone(), s.bands))
                .collect(),
        )
    }

    /// True once any channel's window has filled.
    pub fn has_estimate(&self) -> bool {
        self.channels.iter().any(|s| s.buffer.is_full())
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelState> {
        self.channels.iter().find(|s| s.name == name)
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub fn channel_names(&self) -> &[String] {
        &self.config.channels
    }

    /// Power in `band` for `channel`, if the channel is configured.
    pub fn band_power(&self, channel: &str, band: Band) -> Option<f64> {
        self.channel(channel).map(|s| s.bands.get(band))
    }
}
