//! # Player Configuration
//!
//! Settings shared by every playback controller instance.
//!
//! ## Overview
//!
//! `PlayerConfig` holds the bounded-wait policy for thumbnail extraction, the
//! event bus capacity and the initial presentation settings (gravity, loop,
//! mute). It can be assembled with [`PlayerConfigBuilder`] or loaded from JSON;
//! both paths run the same validation.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::PlayerConfig;
//! use bridge_traits::VideoGravity;
//! use std::time::Duration;
//!
//! let config = PlayerConfig::builder()
//!     .thumbnail_timeout(Duration::from_millis(500))
//!     .gravity(VideoGravity::ResizeAspect)
//!     .looping(false)
//!     .build()
//!     .expect("valid config");
//!
//! assert!(!config.presentation.looping);
//! ```
//!
//! ```rust
//! use core_runtime::config::PlayerConfig;
//!
//! let config = PlayerConfig::from_json_str(r#"{ "thumbnail_timeout_ms": 750 }"#).unwrap();
//! assert_eq!(config.thumbnail_timeout().as_millis(), 750);
//! assert!(config.presentation.looping);
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{PresentationConfig, VideoGravity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for the thumbnail wait. Anything longer defeats the purpose of
/// a bounded wait on a UI-facing call.
pub const MAX_THUMBNAIL_TIMEOUT_MS: u64 = 60_000;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Maximum time to wait for the engine to produce a thumbnail frame.
    ///
    /// Default: 2000 ms.
    #[serde(default = "default_thumbnail_timeout_ms")]
    pub thumbnail_timeout_ms: u64,

    /// Per-subscriber buffer of the player event bus.
    ///
    /// Default: 64 events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Initial presentation settings. The controller lets callers change them
    /// at any time afterwards.
    #[serde(default)]
    pub presentation: PresentationConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            thumbnail_timeout_ms: default_thumbnail_timeout_ms(),
            event_buffer_size: default_event_buffer_size(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid player config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Thumbnail wait as a `Duration`.
    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_millis(self.thumbnail_timeout_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_timeout_ms == 0 {
            return Err(Error::Config(
                "thumbnail_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.thumbnail_timeout_ms > MAX_THUMBNAIL_TIMEOUT_MS {
            return Err(Error::Config(format!(
                "thumbnail_timeout_ms cannot exceed {} (got {})",
                MAX_THUMBNAIL_TIMEOUT_MS, self.thumbnail_timeout_ms
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_thumbnail_timeout_ms() -> u64 {
    2_000
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`PlayerConfig`].
#[derive(Debug, Default)]
pub struct PlayerConfigBuilder {
    config: PlayerConfig,
}

impl PlayerConfigBuilder {
    /// Bound the wait for thumbnail frames.
    pub fn thumbnail_timeout(mut self, timeout: Duration) -> Self {
        self.config.thumbnail_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    /// Replace all presentation settings.
    pub fn presentation(mut self, presentation: PresentationConfig) -> Self {
        self.config.presentation = presentation;
        self
    }

    pub fn gravity(mut self, gravity: VideoGravity) -> Self {
        self.config.presentation.gravity = gravity;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.config.presentation.looping = looping;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.config.presentation.muted = muted;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<PlayerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
