// Re-export modules for library use
pub mod broadcaster;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod server;
pub mod subscribers;

pub use broadcaster::Broadcaster;
pub use config::{build_source, load_config, BroadcasterConfig, DaemonConfig, SourceConfig, SourceKind};
pub use diagnostics::{Diagnostics, SourceState, StreamStats};
pub use error::DaemonError;
pub use subscribers::SubscriberRegistry;
