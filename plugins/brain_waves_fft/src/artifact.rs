//! Artifact rejection for filtered windows

use std::fmt;

const EPS: f64 = 1e-12;
/// Scales the median absolute deviation to a standard deviation for normal data.
const MAD_TO_SIGMA: f64 = 1.4826;

/// Why a window was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Artifact {
    /// A NaN or infinite value somewhere in the window.
    NonFinite,
    /// Peak-to-peak amplitude (µV) above the threshold.
    PeakToPeak(f64),
    /// Maximum absolute robust z-score above the threshold.
    RobustZ(f64),
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::NonFinite => f.write_str("non-finite sample"),
            Artifact::PeakToPeak(ptp) => write!(f, "peak-to-peak {ptp:.1} uV"),
            Artifact::RobustZ(z) => write!(f, "robust |z| {z:.2}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Clean,
    Rejected(Artifact),
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }
}

/// Median of `values`; the mean of the two middle values for even lengths.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

pub fn peak_to_peak(window: &[f64]) -> f64 {
    let (min, max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if window.is_empty() {
        0.0
    } else {
        max - min
    }
}

/// Largest `|x - median| / (1.4826 * MAD)` over the window.
pub fn max_robust_z(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let mut scratch = window.to_vec();
    let med = median(&mut scratch);
    for (slot, &x) in scratch.iter_mut().zip(window) {
        *slot = (x - med).abs();
    }
    let mad = median(&mut scratch) + EPS;
    let sigma = MAD_TO_SIGMA * mad;
    window
        .iter()
        .map(|&x| ((x - med) / (sigma + EPS)).abs())
        .fold(0.0, f64::max)
}

/// Rejects windows that still look corrupted after filtering.
#[derive(Debug, Clone)]
pub struct ArtifactGate {
    max_ptp_uv: f64,
    max_robust_z: f64,
}

impl ArtifactGate {
    pub fn new(max_ptp_uv: f64, max_robust_z: f64) -> Self {
        Self {
            max_ptp_uv,
            max_robust_z,
        }
    }

    pub fn check(&self, window: &[f64]) -> Verdict {
        if window.iter().any(|x| !x.is_finite()) {
            return Verdict::Rejected(Artifact::NonFinite);
        }
        let ptp = peak_to_peak(window);
        if ptp > self.max_ptp_uv {
            return Verdict::Rejected(Artifact::PeakToPeak(ptp));
        }
        let z = max_robust_z(window);
        if z > self.max_robust_z {
            return Verdict::Rejected(Artifact::RobustZ(z));
        }
        Verdict::Clean
    }
}

impl Default for ArtifactGate {
    fn default() -> Self {
        Self::new(1500.0, 6.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(n: usize, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * 10.0 * i as f64 / 256.0).sin())
            .collect()
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_clean_sine_passes() {
        let gate = ArtifactGate::default();
        assert!(gate.check(&sine(512, 20.0)).is_clean());
    }

    #[test]
    fn test_all_zero_window_is_clean() {
        let gate = ArtifactGate::default();
        assert_eq!(gate.check(&[0.0; 512]), Verdict::Clean);
    }

    #[test]
    fn test_large_swing_rejected_by_peak_to_peak() {
        let gate = ArtifactGate::default();
        let window = sine(512, 800.0);
        assert!(matches!(gate.check(&window), Verdict::Rejected(Artifact::PeakToPeak(_))));
    }

    #[test]
    fn test_isolated_spike_rejected_by_robust_z() {
        let gate = ArtifactGate::default();
        let mut window = sine(512, 20.0);
        // Small enough to stay under the amplitude threshold.
        window[200] = 400.0;
        assert!(matches!(gate.check(&window), Verdict::Rejected(Artifact::RobustZ(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let gate = ArtifactGate::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut window = sine(512, 20.0);
            window[37] = bad;
            assert_eq!(gate.check(&window), Verdict::Rejected(Artifact::NonFinite));
        }
    }

    #[test]
    fn test_peak_to_peak() {
        assert_eq!(peak_to_peak(&[-2.0, 5.0, 1.0]), 7.0);
        assert_eq!(peak_to_peak(&[]), 0.0);
    }
}
