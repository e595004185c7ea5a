//! Media engine bridge trait and supporting video types.
//!
//! The playback controller never decodes, renders or routes audio itself. It
//! drives a host-provided [`MediaEngine`] that opens sources, performs seeks,
//! samples frames and reports buffered extents. Hosts ship one engine per
//! platform (AVFoundation, ExoPlayer, GStreamer, ...) while the controller's
//! state machine stays identical everywhere.

use crate::error::Result;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque locator (URI) of a media source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaLocator(String);

impl MediaLocator {
    /// Wrap an arbitrary URI string.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Build a `file://` locator for a local path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self(format!("file://{}", path.as_ref().display()))
    }

    /// Borrow the raw URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI scheme, lowercased, when the locator has one.
    pub fn scheme(&self) -> Option<String> {
        let (scheme, _) = self.0.split_once("://")?;
        if scheme.is_empty() {
            return None;
        }
        Some(scheme.to_ascii_lowercase())
    }

    /// Whether the source must be fetched over the network.
    pub fn is_remote(&self) -> bool {
        matches!(self.scheme().as_deref(), Some("http" | "https"))
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaLocator {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for MediaLocator {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

/// Identifier of an asset opened by a [`MediaEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Generate a new asset identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

/// Natural presentation size of the video track, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. `None` for degenerate sizes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(f64::from(self.width) / f64::from(self.height))
    }
}

/// Metadata known once an asset is ready to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    /// Total duration of the asset.
    pub duration: Duration,
    /// Natural size of the video track.
    pub presentation_size: VideoSize,
}

impl MediaInfo {
    pub fn new(duration: Duration, presentation_size: VideoSize) -> Self {
        Self {
            duration,
            presentation_size,
        }
    }
}

/// Asset handle returned by [`MediaEngine::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaAsset {
    pub id: AssetId,
    pub info: MediaInfo,
}

impl MediaAsset {
    pub fn new(info: MediaInfo) -> Self {
        Self {
            id: AssetId::new(),
            info,
        }
    }
}

/// Contiguous interval of media that is available without further loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Convenience constructor using millisecond offsets.
    pub fn from_millis(start_ms: u64, duration_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(start_ms),
            Duration::from_millis(duration_ms),
        )
    }

    /// Exclusive end of the range.
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration)
    }

    pub fn is_empty(&self) -> bool {
        self.duration.is_zero()
    }

    pub fn contains(&self, position: Duration) -> bool {
        position >= self.start && position < self.end()
    }

    /// Sort ranges by start, drop empty ones and merge overlapping or
    /// touching ranges so the result is ordered and disjoint.
    pub fn normalize(mut ranges: Vec<TimeRange>) -> Vec<TimeRange> {
        ranges.retain(|range| !range.is_empty());
        ranges.sort_by_key(|range| range.start);

        let mut merged: Vec<TimeRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end() => {
                    let end = last.end().max(range.end());
                    last.duration = end - last.start;
                }
                _ => merged.push(range),
            }
        }
        merged
    }
}

/// How decoded frames are scaled into the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Preserve aspect ratio and fill the surface, cropping if needed.
    #[default]
    ResizeAspectFill,
    /// Preserve aspect ratio and fit inside the surface (letterbox).
    ResizeAspect,
    /// Stretch to the surface bounds.
    Resize,
}

/// Presentation settings the engine applies to the current asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationConfig {
    #[serde(default)]
    pub gravity: VideoGravity,
    /// Restart from the beginning when the end of media is reached.
    #[serde(default = "default_looping")]
    pub looping: bool,
    #[serde(default)]
    pub muted: bool,
}

fn default_looping() -> bool {
    true
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            gravity: VideoGravity::default(),
            looping: default_looping(),
            muted: false,
        }
    }
}

/// A single decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Timestamp the frame was requested for.
    pub requested: Duration,
    /// Presentation timestamp of the frame actually decoded.
    pub timestamp: Duration,
    pub image: RgbaImage,
}

impl VideoFrame {
    pub fn new(requested: Duration, timestamp: Duration, image: RgbaImage) -> Self {
        Self {
            requested,
            timestamp,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Unsolicited notifications an engine emits for an opened asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSignal {
    /// Playback reached the end of the media.
    EndOfMedia,
    /// The asset can no longer be decoded or played.
    Failed { message: String },
}

/// Channel through which an engine reports [`EngineSignal`]s for one asset.
pub type EngineSignalSender = mpsc::UnboundedSender<EngineSignal>;

/// Receiving half paired with [`EngineSignalSender`].
pub type EngineSignalReceiver = mpsc::UnboundedReceiver<EngineSignal>;

/// Create a signal channel for one opened asset.
pub fn signal_channel() -> (EngineSignalSender, EngineSignalReceiver) {
    mpsc::unbounded_channel()
}

/// Platform media engine driven by the playback controller.
///
/// Synchronous methods are invoked while the controller holds its state lock:
/// they must return promptly and must not call back into the controller.
/// Asynchronous methods run on background tasks; their results are delivered
/// back to the controller, which discards results for superseded sessions.
#[async_trait::async_trait]
pub trait MediaEngine: Send + Sync {
    /// Configure the host audio session for playback. Failures are advisory;
    /// playback proceeds without guaranteed audio routing.
    async fn configure_audio_session(&self, muted: bool) -> Result<()>;

    /// Open and index a source. `signals` receives end-of-media and failure
    /// notifications for the returned asset until it is closed.
    async fn open(&self, locator: &MediaLocator, signals: EngineSignalSender) -> Result<MediaAsset>;

    /// Start or resume rendering of the asset.
    fn play(&self, asset: AssetId);

    /// Pause rendering without releasing the asset.
    fn pause(&self, asset: AssetId);

    /// Release every resource associated with the asset.
    fn close(&self, asset: AssetId);

    /// Apply gravity and mute settings to the asset.
    fn apply_presentation(&self, asset: AssetId, presentation: &PresentationConfig);

    /// Seek to an absolute position. Resolves to `false` when the engine
    /// interrupted the seek before it finished.
    async fn seek(&self, asset: AssetId, position: Duration) -> Result<bool>;

    /// Decode the frame nearest to `at`. `Ok(None)` when no frame exists there.
    async fn decode_frame(&self, asset: AssetId, at: Duration) -> Result<Option<VideoFrame>>;

    /// Snapshot of the currently loaded ranges.
    async fn buffered_ranges(&self, asset: AssetId) -> Result<Vec<TimeRange>>;

    /// Current playback position of the asset.
    fn playback_position(&self, asset: AssetId) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_scheme_detection() {
        assert_eq!(
            MediaLocator::new("HTTPS://cdn.example.com/a.mp4").scheme(),
            Some("https".to_string())
        );
        assert!(MediaLocator::new("https://cdn.example.com/a.mp4").is_remote());
        assert!(!MediaLocator::from_path("/tmp/clip.mov").is_remote());
        assert_eq!(MediaLocator::from_path("/tmp/clip.mov").as_str(), "file:///tmp/clip.mov");
        assert_eq!(MediaLocator::new("clip.mov").scheme(), None);
        assert_eq!(MediaLocator::new("://clip.mov").scheme(), None);
    }

    #[test]
    fn aspect_ratio_of_full_hd() {
        let ratio = VideoSize::new(1920, 1080).aspect_ratio().unwrap();
        assert!((ratio - 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(VideoSize::new(1920, 0).aspect_ratio(), None);
        assert_eq!(VideoSize::default().aspect_ratio(), None);
    }

    #[test]
    fn time_range_bounds() {
        let range = TimeRange::from_millis(1_000, 500);
        assert_eq!(range.end(), Duration::from_millis(1_500));
        assert!(range.contains(Duration::from_millis(1_000)));
        assert!(range.contains(Duration::from_millis(1_499)));
        assert!(!range.contains(Duration::from_millis(1_500)));
        assert!(TimeRange::from_millis(10, 0).is_empty());
    }

    #[test]
    fn normalize_merges_and_orders_ranges() {
        let ranges = vec![
            TimeRange::from_millis(8_000, 1_000),
            TimeRange::from_millis(0, 2_000),
            TimeRange::from_millis(1_500, 1_000),
            TimeRange::from_millis(5_000, 0),
            TimeRange::from_millis(2_500, 500),
        ];

        assert_eq!(
            TimeRange::normalize(ranges),
            vec![
                TimeRange::from_millis(0, 3_000),
                TimeRange::from_millis(8_000, 1_000),
            ]
        );
        assert!(TimeRange::normalize(Vec::new()).is_empty());
    }

    #[test]
    fn presentation_defaults() {
        let config = PresentationConfig::default();
        assert_eq!(config.gravity, VideoGravity::ResizeAspectFill);
        assert!(config.looping);
        assert!(!config.muted);

        let parsed: PresentationConfig = serde_json::from_str(r#"{"gravity":"resize_aspect"}"#).unwrap();
        assert_eq!(parsed.gravity, VideoGravity::ResizeAspect);
        assert!(parsed.looping);
    }

    #[tokio::test]
    async fn signal_channel_delivers_in_order() {
        let (tx, mut rx) = signal_channel();
        tx.send(EngineSignal::EndOfMedia).unwrap();
        tx.send(EngineSignal::Failed {
            message: "decoder lost".into(),
        })
        .unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(EngineSignal::EndOfMedia));
        assert!(matches!(rx.recv().await, Some(EngineSignal::Failed { .. })));
        assert_eq!(rx.recv().await, None);
    }
}
