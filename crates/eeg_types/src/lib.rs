//! Shared types for the EEG band-power streaming system
//!
//! This crate contains the data structures passed between the sample sources,
//! the band-power engine and the streaming daemon: sample batches, frequency
//! bands, band-power snapshots, the outbound payload and engine configuration.

pub mod bands;
pub mod comms;
pub mod config;
pub mod data;

// Re-export commonly used types
pub use bands::*;
pub use comms::*;
pub use config::*;
pub use data::*;
