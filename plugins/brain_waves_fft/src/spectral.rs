//! Windowed periodogram and band integration.
//!
//! The power spectral density of a Hamming-tapered window is
//!
//! ```text
//! PSD[k] = |X[k]|^2 / (sum(w^2) * fs)
//! ```
//!
//! and each band's power is the sum of PSD bins whose frequency lies in the
//! band, multiplied by the bin width `fs / N`. The normalisation is a fixed
//! constant of this system: the one-sided spectrum is not doubled.

use apodize::hamming_iter;
use eeg_types::{Band, BandPowers};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

const EPS: f64 = 1e-12;

/// Band-power estimator for windows of a fixed length.
pub struct SpectralEstimator {
    sample_rate: f64,
    window_len: usize,
    fft: Arc<dyn Fft<f64>>,
    taper: Vec<f64>,
    taper_power: f64,
}

impl SpectralEstimator {
    pub fn new(sample_rate: f64, window_len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(window_len);
        let taper: Vec<f64> = if window_len >= 2 {
            hamming_iter(window_len).collect()
        } else {
            vec![1.0; window_len]
        };
        let taper_power = taper.iter().map(|w| w * w).sum();
        Self {
            sample_rate,
            window_len,
            fft,
            taper,
            taper_power,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Frequency spacing between adjacent one-sided bins, or zero when the
    /// window cannot resolve more than one bin.
    pub fn bin_width(&self) -> f64 {
        let bins = self.window_len / 2 + 1;
        if bins > 1 && self.sample_rate > 0.0 {
            self.sample_rate / self.window_len as f64
        } else {
            0.0
        }
    }

    /// One-sided PSD (µV²/Hz), `N / 2 + 1` bins.
    pub fn psd(&self, window: &[f64]) -> Vec<f64> {
        if window.len() != self.window_len || self.window_len == 0 {
            return Vec::new();
        }
        let mut buffer: Vec<Complex<f64>> = window
            .iter()
            .zip(&self.taper)
            .map(|(&x, &w)| Complex::new(x * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let scale = self.taper_power * self.sample_rate + EPS;
        buffer
            .iter()
            .take(self.window_len / 2 + 1)
            .map(|c| c.norm_sqr() / scale)
            .collect()
    }

    /// Integrate the PSD of `window` over every band.
    ///
    /// Returns all-zero powers for degenerate windows (zero bin width or a
    /// length other than the configured one).
    pub fn band_powers(&self, window: &[f64]) -> BandPowers {
        let df = self.bin_width();
        let mut powers = BandPowers::zero();
        if df == 0.0 || !df.is_finite() || window.len() != self.window_len {
            return powers;
        }

        let psd = self.psd(window);
        for band in Band::ALL {
            let sum: f64 = psd
                .iter()
                .enumerate()
                .filter(|(k, _)| band.contains(*k as f64 * df))
                .map(|(_, p)| p)
                .sum();
            powers.set(band, sum * df);
        }
        powers
    }
}
