//! # Player Event Bus
//!
//! Tagged event stream for playback observers, built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The playback controller reports five kinds of observations: audio-session
//! configuration failures, readiness, completion, pauses and fatal failures.
//! Observers can either register a delegate on the controller or subscribe to
//! this bus; both see the same events in the same order.
//!
//! - **`PlayerEvent`**: the event taxonomy
//! - **`EventBus`**: broadcast channel the controller publishes to
//! - **`EventStream`**: receiver wrapper with optional filtering
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, EventStream, PlayerEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut stream = EventStream::new(bus.subscribe())
//!     .filter(|event| matches!(event, PlayerEvent::Finished));
//!
//! bus.emit(PlayerEvent::Paused { position_ms: 1_000 }).ok();
//! bus.emit(PlayerEvent::Finished).ok();
//!
//! assert_eq!(stream.recv().await.unwrap(), PlayerEvent::Finished);
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it may keep
//!   receiving newer ones.
//! - **`RecvError::Closed`**: the controller (and every bus clone) was dropped.
//!
//! Publishing with no subscribers returns an error that the controller
//! ignores: an absent observer is never a failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Player Events
// ============================================================================

/// Observations published by the playback controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// The host audio session could not be configured. Playback continues.
    AudioSessionError {
        /// Human-readable error message.
        message: String,
    },
    /// The source opened successfully and metadata is available.
    ReadyToPlay {
        /// Total duration (milliseconds).
        duration_ms: u64,
        /// Natural video width in pixels.
        width: u32,
        /// Natural video height in pixels.
        height: u32,
    },
    /// Playback reached the end of media with looping disabled.
    Finished,
    /// Playback was paused by the caller.
    Paused {
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// The source could not be opened or decoded. Terminal for the session.
    Failed {
        /// Human-readable error message.
        message: String,
    },
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::AudioSessionError { .. } => "Audio session configuration failed",
            PlayerEvent::ReadyToPlay { .. } => "Ready to play",
            PlayerEvent::Finished => "Playback finished",
            PlayerEvent::Paused { .. } => "Playback paused",
            PlayerEvent::Failed { .. } => "Playback failed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Failed { .. } => EventSeverity::Error,
            PlayerEvent::AudioSessionError { .. } => EventSeverity::Warning,
            PlayerEvent::ReadyToPlay { .. } | PlayerEvent::Finished => EventSeverity::Info,
            PlayerEvent::Paused { .. } => EventSeverity::Debug,
        }
    }

    /// Whether no further events of the same session can follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerEvent::Failed { .. })
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel for [`PlayerEvent`]s.
///
/// Cloning the bus shares the underlying channel; each `subscribe()` creates
/// an independent receiver that sees every event published afterwards.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// `capacity` is the number of events buffered per subscriber before it
    /// starts receiving `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`/`try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Keep only events at or above `min` severity.
    pub fn min_severity(self, min: EventSeverity) -> Self {
        self.filter(move |event| event.severity() >= min)
    }

    fn accepts(&self, event: &PlayerEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> PlayerEvent {
        PlayerEvent::ReadyToPlay {
            duration_ms: 120_000,
            width: 1920,
            height: 1080,
        }
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(PlayerEvent::Finished).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        assert_eq!(bus.emit(ready()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), ready());
        assert_eq!(sub2.recv().await.unwrap(), ready());
    }

    #[tokio::test]
    async fn test_event_stream_preserves_order() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());

        bus.emit(ready()).ok();
        bus.emit(PlayerEvent::Paused { position_ms: 4_000 }).ok();
        bus.emit(PlayerEvent::Finished).ok();

        assert_eq!(stream.recv().await.unwrap(), ready());
        assert_eq!(
            stream.recv().await.unwrap(),
            PlayerEvent::Paused { position_ms: 4_000 }
        );
        assert_eq!(stream.recv().await.unwrap(), PlayerEvent::Finished);
    }

    #[tokio::test]
    async fn test_event_stream_with_severity_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).min_severity(EventSeverity::Warning);

        bus.emit(PlayerEvent::Paused { position_ms: 0 }).ok();
        bus.emit(ready()).ok();
        bus.emit(PlayerEvent::AudioSessionError {
            message: "route unavailable".to_string(),
        })
        .ok();

        assert!(matches!(
            stream.recv().await.unwrap(),
            PlayerEvent::AudioSessionError { .. }
        ));
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(PlayerEvent::Paused { position_ms: i }).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity_and_terminality() {
        let failed = PlayerEvent::Failed {
            message: "unsupported codec".to_string(),
        };
        assert_eq!(failed.severity(), EventSeverity::Error);
        assert!(failed.is_terminal());
        assert_eq!(ready().severity(), EventSeverity::Info);
        assert!(!PlayerEvent::Finished.is_terminal());
        assert_eq!(PlayerEvent::Finished.description(), "Playback finished");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&ready()).unwrap();
        assert!(json.contains("\"event\":\"ready_to_play\""));
        assert!(json.contains("120000"));

        let back: PlayerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ready());

        let finished: PlayerEvent = serde_json::from_str(r#"{"event":"finished"}"#).unwrap();
        assert_eq!(finished, PlayerEvent::Finished);
    }

    #[tokio::test]
    async fn test_try_recv() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        bus.emit(PlayerEvent::Finished).ok();
        assert_eq!(stream.try_recv().unwrap().unwrap(), PlayerEvent::Finished);
        assert!(stream.try_recv().is_none());
    }
}
