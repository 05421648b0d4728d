//! Band-power estimation for multi-channel EEG.
//!
//! Each channel keeps a rolling window of raw samples. Whenever a window is
//! full it is detrended, high-pass filtered, checked for artifacts and, if
//! clean, turned into delta/theta/alpha/beta/gamma powers with a Hamming
//! periodogram. Rejected windows leave the previous powers in place.

pub mod artifact;
pub mod buffer;
pub mod engine;
pub mod filter;
pub mod spectral;

pub use artifact::{Artifact, ArtifactGate, Verdict};
pub use buffer::ChannelBuffer;
pub use engine::{BandPowerEngine, ChannelState, UpdateOutcome};
pub use filter::{select_highpass, HighPassFilter, Preprocessor, WindowedSincFir, ZeroPhaseIir};
pub use spectral::SpectralEstimator;
