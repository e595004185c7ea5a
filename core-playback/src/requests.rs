//! Result types of the controller's queries and asynchronous operations.

use crate::state::PlaybackState;
use bridge_traits::VideoFrame;
use std::fmt;
use std::time::Duration;

/// Why a thumbnail could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No prepared asset (state before `Ready`, or `Failed`).
    NotReady,
    /// The engine has no frame at the requested time.
    NoFrame,
    /// The engine did not produce a frame within the configured timeout.
    TimedOut,
    /// The session changed while the frame was being decoded.
    Cancelled,
    /// The engine reported an error.
    Engine(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NotReady => f.write_str("media not ready"),
            UnavailableReason::NoFrame => f.write_str("no frame at requested time"),
            UnavailableReason::TimedOut => f.write_str("timed out waiting for frame"),
            UnavailableReason::Cancelled => f.write_str("session changed"),
            UnavailableReason::Engine(message) => write!(f, "engine error: {}", message),
        }
    }
}

/// Outcome of a thumbnail request.
#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    Frame(VideoFrame),
    Unavailable(UnavailableReason),
}

impl Thumbnail {
    pub fn is_available(&self) -> bool {
        matches!(self, Thumbnail::Frame(_))
    }

    pub fn frame(&self) -> Option<&VideoFrame> {
        match self {
            Thumbnail::Frame(frame) => Some(frame),
            Thumbnail::Unavailable(_) => None,
        }
    }

    pub fn into_frame(self) -> Option<VideoFrame> {
        match self {
            Thumbnail::Frame(frame) => Some(frame),
            Thumbnail::Unavailable(_) => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&UnavailableReason> {
        match self {
            Thumbnail::Frame(_) => None,
            Thumbnail::Unavailable(reason) => Some(reason),
        }
    }
}

/// Point-in-time snapshot of the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub position: Duration,
    /// `None` until the source is ready.
    pub duration: Option<Duration>,
    /// Width / height of the video. `None` until the source is ready.
    pub aspect_ratio: Option<f64>,
}

impl PlaybackStatus {
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Fraction of the media already played, in `0.0..=1.0`.
    pub fn progress(&self) -> Option<f64> {
        let duration = self.duration?;
        if duration.is_zero() {
            return None;
        }
        Some((self.position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0))
    }
}
