//! Window preprocessing: detrend followed by a high-pass stage.
//!
//! Two interchangeable high-pass strategies are provided behind the
//! [`HighPassFilter`] trait:
//!
//! * [`ZeroPhaseIir`] - second-order Butterworth section run forward and then
//!   backward over the window, so the output has no phase shift.
//! * [`WindowedSincFir`] - identity impulse minus a Hamming-tapered sinc
//!   low-pass kernel, applied as a centred convolution.
//!
//! Both keep the window length and leave no DC offset behind.

use apodize::hamming_iter;
use biquad::{Coefficients, ToHertz, Type, Q_BUTTERWORTH_F64};
use eeg_types::FilterDesign;
use std::f64::consts::PI;
use tracing::{debug, warn};

const EPS: f64 = 1e-12;
/// Shortest edge extension used by the forward-backward pass: three times the filter order.
const IIR_MIN_PAD: usize = 6;
/// Cutoff periods of edge extension, enough for the start-up transient to die out before the window.
const IIR_SETTLE_PERIODS: f64 = 3.0;
const MIN_FIR_TAPS: usize = 33;

/// Capability shared by every high-pass strategy.
pub trait HighPassFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Filter one chronological window. The output has the same length.
    fn apply(&self, window: &[f64]) -> Vec<f64>;
}

/// Sample `x` at index `i`, reflecting through the end points when `i`
/// falls outside the window (odd extension).
fn odd_extended(x: &[f64], i: isize) -> f64 {
    let last = x.len() as isize - 1;
    if i < 0 {
        let mirror = (-i).min(last) as usize;
        2.0 * x[0] - x[mirror]
    } else if i > last {
        let mirror = (last - (i - last)).max(0) as usize;
        2.0 * x[last as usize] - x[mirror]
    } else {
        x[i as usize]
    }
}

// Direct Form II Transposed biquad section with explicit state
#[derive(Clone)]
struct Section {
    coeffs: Coefficients<f64>,
    s1: f64,
    s2: f64,
}

impl Section {
    fn new(coeffs: Coefficients<f64>) -> Self {
        Self { coeffs, s1: 0.0, s2: 0.0 }
    }

    /// Load the state the section would hold after a long run of constant `x0`.
    fn settle(&mut self, x0: f64) {
        let c = &self.coeffs;
        let denom = 1.0 + c.a1 + c.a2;
        let y0 = if denom.abs() > EPS {
            (c.b0 + c.b1 + c.b2) / denom * x0
        } else {
            0.0
        };
        self.s2 = c.b2 * x0 - c.a2 * y0;
        self.s1 = c.b1 * x0 - c.a1 * y0 + self.s2;
    }

    fn run(&mut self, x: f64) -> f64 {
        let c = &self.coeffs;
        let y = c.b0 * x + self.s1;
        self.s1 = c.b1 * x - c.a1 * y + self.s2;
        self.s2 = c.b2 * x - c.a2 * y;
        y
    }
}

/// Second-order Butterworth high-pass applied forward and backward.
#[derive(Clone)]
pub struct ZeroPhaseIir {
    coeffs: Coefficients<f64>,
    pad_len: usize,
}

impl ZeroPhaseIir {
    /// Design the section, or `None` if the cutoff cannot be realised at this rate.
    pub fn design(sample_rate: f64, cutoff_hz: f64) -> Option<Self> {
        if !(sample_rate.is_finite() && cutoff_hz.is_finite() && cutoff_hz > 0.0) {
            return None;
        }
        match Coefficients::<f64>::from_params(
            Type::HighPass,
            sample_rate.hz(),
            cutoff_hz.hz(),
            Q_BUTTERWORTH_F64,
        ) {
            Ok(coeffs) => {
                let settle = (IIR_SETTLE_PERIODS * sample_rate / cutoff_hz).ceil() as usize;
                Some(Self {
                    coeffs,
                    pad_len: settle.max(IIR_MIN_PAD),
                })
            }
            Err(e) => {
                debug!("IIR high-pass design failed for fs={sample_rate} fc={cutoff_hz}: {e:?}");
                None
            }
        }
    }

    /// Samples of odd extension added at each edge, before clamping to the window length.
    pub fn pad_len(&self) -> usize {
        self.pad_len
    }

    fn pass(&self, data: &mut [f64]) {
        let mut section = Section::new(self.coeffs);
        if let Some(&first) = data.first() {
            section.settle(first);
        }
        for x in data.iter_mut() {
            *x = section.run(*x);
        }
    }
}

impl HighPassFilter for ZeroPhaseIir {
    fn name(&self) -> &'static str {
        "iir-zero-phase"
    }

    fn apply(&self, window: &[f64]) -> Vec<f64> {
        let n = window.len();
        if n < 2 {
            return window.to_vec();
        }
        let pad = self.pad_len.min(n - 1);
        let mut extended: Vec<f64> = (-(pad as isize)..(n + pad) as isize)
            .map(|i| odd_extended(window, i))
            .collect();

        self.pass(&mut extended);
        extended.reverse();
        self.pass(&mut extended);
        extended.reverse();

        extended[pad..pad + n].to_vec()
    }
}

/// Windowed-sinc FIR high-pass.
#[derive(Clone, Debug)]
pub struct WindowedSincFir {
    kernel: Vec<f64>,
}

fn sinc(x: f64) -> f64 {
    if x.abs() < EPS {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

impl WindowedSincFir {
    pub fn design(sample_rate: f64, cutoff_hz: f64) -> Self {
        // Roughly a quarter second of taps, odd so the kernel has a centre tap.
        let quarter = (0.25 * sample_rate).max(0.0) as usize;
        let taps = (quarter | 1).max(MIN_FIR_TAPS);
        let fc = if sample_rate > 0.0 {
            cutoff_hz / (sample_rate / 2.0)
        } else {
            0.0
        };
        let centre = (taps - 1) as f64 / 2.0;

        let mut low_pass: Vec<f64> = hamming_iter(taps)
            .enumerate()
            .map(|(i, w)| sinc(fc * (i as f64 - centre)) * w)
            .collect();
        let sum: f64 = low_pass.iter().sum::<f64>() + EPS;
        for tap in &mut low_pass {
            *tap /= sum;
        }

        let mut kernel: Vec<f64> = low_pass.iter().map(|&v| -v).collect();
        kernel[(taps - 1) / 2] += 1.0;
        Self { kernel }
    }

    pub fn taps(&self) -> usize {
        self.kernel.len()
    }
}

impl HighPassFilter for WindowedSincFir {
    fn name(&self) -> &'static str {
        "fir-windowed-sinc"
    }

    fn apply(&self, window: &[f64]) -> Vec<f64> {
        let n = window.len();
        if n < 2 {
            return window.to_vec();
        }
        let half = (self.kernel.len() / 2) as isize;
        (0..n as isize)
            .map(|j| {
                self.kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &h)| h * odd_extended(window, j + half - k as isize))
                    .sum()
            })
            .collect()
    }
}

/// Pick the high-pass strategy once, at engine construction.
pub fn select_highpass(design: FilterDesign, sample_rate: f64, cutoff_hz: f64) -> Box<dyn HighPassFilter> {
    match design {
        FilterDesign::Fir => Box::new(WindowedSincFir::design(sample_rate, cutoff_hz)),
        FilterDesign::Auto => match ZeroPhaseIir::design(sample_rate, cutoff_hz) {
            Some(iir) => Box::new(iir),
            None => Box::new(WindowedSincFir::design(sample_rate, cutoff_hz)),
        },
        FilterDesign::Iir => match ZeroPhaseIir::design(sample_rate, cutoff_hz) {
            Some(iir) => Box::new(iir),
            None => {
                warn!("IIR high-pass unavailable for fs={sample_rate} Hz, cutoff={cutoff_hz} Hz; using FIR");
                Box::new(WindowedSincFir::design(sample_rate, cutoff_hz))
            }
        },
    }
}

/// Detrend and high-pass one window.
pub struct Preprocessor {
    highpass: Box<dyn HighPassFilter>,
}

impl Preprocessor {
    pub fn new(highpass: Box<dyn HighPassFilter>) -> Self {
        Self { highpass }
    }

    pub fn filter_name(&self) -> &'static str {
        self.highpass.name()
    }

    pub fn process(&self, window: &[f64]) -> Vec<f64> {
        if window.is_empty() {
            return Vec::new();
        }
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        let detrended: Vec<f64> = window.iter().map(|&x| x - mean).collect();
        self.highpass.apply(&detrended)
    }
}
