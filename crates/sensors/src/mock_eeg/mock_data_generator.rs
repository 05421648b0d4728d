use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Component frequencies (Hz) for delta, theta, alpha, beta and gamma.
const BAND_FREQS_HZ: [f64; 5] = [2.0, 6.0, 10.0, 20.0, 38.0];
/// Amplitude of a unit band weight, in µV.
const UNIT_AMPLITUDE_UV: f64 = 8.0;
/// Slow baseline wander (µV) that the high-pass stage is expected to remove.
const DRIFT_AMPLITUDE_UV: f64 = 25.0;
const DRIFT_FREQ_HZ: f64 = 0.15;
const NOISE_UV: f64 = 1.5;

/// Per-channel band weights: [delta, theta, alpha, beta, gamma].
/// Temporal sites carry more slow activity, frontal sites more alpha/beta.
const BASE_CHANNEL_WEIGHTS: [[f64; 5]; 4] = [
    [3.0, 1.5, 0.8, 0.4, 0.1], // TP9
    [2.0, 1.2, 1.5, 0.6, 0.1], // AF7
    [1.5, 1.0, 2.5, 0.7, 0.1], // AF8
    [1.2, 0.8, 3.0, 0.5, 0.1], // TP10
];

/// A generator for EEG-like microvolt samples with all five bands present.
#[derive(Debug, Clone)]
pub struct EegGenerator {
    sample_rate: f64,
    num_channels: usize,
    sample_index: u64,
    channel_weights: Vec<[f64; 5]>,
    band_phases: Vec<[f64; 5]>,
    dc_offsets: Vec<f64>,
    rng: StdRng,
}

impl EegGenerator {
    pub fn new(sample_rate: f64, num_channels: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(
            "Initializing EEG generator: {} Hz, {} channels",
            sample_rate, num_channels
        );

        // Reuse the base weights if there are more than four channels
        let channel_weights = (0..num_channels)
            .map(|i| BASE_CHANNEL_WEIGHTS[i % BASE_CHANNEL_WEIGHTS.len()])
            .collect();
        let band_phases = (0..num_channels)
            .map(|_| {
                let mut phases = [0.0; 5];
                for phase in phases.iter_mut() {
                    *phase = rng.gen_range(0.0..2.0 * PI);
                }
                phases
            })
            .collect();
        let dc_offsets = (0..num_channels).map(|_| rng.gen_range(-50.0..50.0)).collect();

        Self {
            sample_rate,
            num_channels,
            sample_index: 0,
            channel_weights,
            band_phases,
            dc_offsets,
            rng,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Produce the next multi-channel sample (µV), one value per channel.
    pub fn next_sample(&mut self) -> Vec<f64> {
        let t = self.sample_index as f64 / self.sample_rate;
        self.sample_index += 1;

        // Alpha waxes and wanes on a ten-second cycle
        let alpha_envelope = 0.6 + 0.4 * (2.0 * PI * 0.1 * t).sin();
        let drift = DRIFT_AMPLITUDE_UV * (2.0 * PI * DRIFT_FREQ_HZ * t).sin();

        (0..self.num_channels)
            .map(|ch| {
                let weights = &self.channel_weights[ch];
                let phases = &self.band_phases[ch];
                let rhythm: f64 = BAND_FREQS_HZ
                    .iter()
                    .enumerate()
                    .map(|(b, &freq)| {
                        let envelope = if b == 2 { alpha_envelope } else { 1.0 };
                        weights[b] * envelope * UNIT_AMPLITUDE_UV * (2.0 * PI * freq * t + phases[b]).sin()
                    })
                    .sum();
                let noise = self.rng.gen_range(-NOISE_UV..NOISE_UV);
                self.dc_offsets[ch] + drift + rhythm + noise
            })
            .collect()
    }

    pub fn next_samples(&mut self, count: usize) -> Vec<Vec<f64>> {
        (0..count).map(|_| self.next_sample()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let mut generator = EegGenerator::new(256.0, 4, Some(7));
        let samples = generator.next_samples(16);
        assert_eq!(samples.len(), 16);
        assert!(samples.iter().all(|s| s.len() == 4));
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = EegGenerator::new(256.0, 4, Some(42));
        let mut b = EegGenerator::new(256.0, 4, Some(42));
        assert_eq!(a.next_samples(32), b.next_samples(32));
    }

    #[test]
    fn test_amplitude_is_eeg_scale() {
        let mut generator = EegGenerator::new(256.0, 6, Some(1));
        for sample in generator.next_samples(512) {
            for value in sample {
                assert!(value.abs() < 500.0, "unexpected amplitude {value}");
            }
        }
    }
}
