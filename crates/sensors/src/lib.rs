pub mod mock_eeg;
pub mod replay;
pub mod types;

// Re-export the main types that users need
pub use mock_eeg::{EegGenerator, MockSource, MockSourceConfig};
pub use replay::{ReplayConfig, ReplaySource};
pub use types::{BatchStream, SampleSource, SourceError};
