//! # Host Bridge Traits
//!
//! Capabilities the playback core consumes but does not implement.
//!
//! ## Traits
//!
//! - [`MediaEngine`](media::MediaEngine) - Opens sources, seeks, samples
//!   frames and reports buffered ranges on behalf of the controller
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Engines report failures with [`BridgeError`](error::BridgeError). The core
//! never lets these cross its command API: open and decode failures become
//! `Failed` events, audio-session failures become advisory events, and query
//! failures degrade to "unavailable" results.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single engine can serve the
//! controller's command path and its background tasks at the same time.

pub mod error;
pub mod logging;
pub mod media;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    signal_channel, AssetId, EngineSignal, EngineSignalReceiver, EngineSignalSender, MediaAsset,
    MediaEngine, MediaInfo, MediaLocator, PresentationConfig, TimeRange, VideoFrame, VideoGravity,
    VideoSize,
};
