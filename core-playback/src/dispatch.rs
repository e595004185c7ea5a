//! Notification delivery.
//!
//! The controller enqueues notifications while it still holds its state lock,
//! so the queue order is the order in which transitions happened. Delivery
//! runs after the lock is released and is never re-entrant: whichever thread
//! finds the queue idle drains it, and anything enqueued while a handler runs
//! (including by that handler) is delivered after the handler returns.

use bridge_traits::TimeRange;
use core_runtime::events::{EventBus, EventStream, PlayerEvent};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};

/// Optional observer of controller events.
///
/// Every method has an empty default; implement only what you need. The
/// controller keeps a non-owning reference, so a dropped delegate simply
/// stops receiving calls.
pub trait PlayerDelegate: Send + Sync {
    /// The audio session could not be configured. Playback may still work.
    fn on_audio_session_error(&self, message: &str) {
        let _ = message;
    }

    /// The source failed to open or decode.
    fn on_failed(&self) {}

    /// The source is ready; duration and dimensions are available.
    fn on_ready_to_play(&self) {}

    /// Playback reached the end with looping disabled.
    fn on_finished(&self) {}

    /// Playback was paused.
    fn on_paused(&self) {}
}

pub(crate) type SeekCallback = Box<dyn FnOnce(bool) + Send>;
pub(crate) type RangesCallback = Box<dyn FnOnce(Vec<TimeRange>) + Send>;

pub(crate) enum Notification {
    Event(PlayerEvent),
    SeekCompleted {
        callback: SeekCallback,
        finished: bool,
    },
    RangesLoaded {
        callback: RangesCallback,
        ranges: Vec<TimeRange>,
    },
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Notification>,
    draining: bool,
}

pub(crate) struct Dispatcher {
    queue: Mutex<DispatchQueue>,
    delegate: RwLock<Option<Weak<dyn PlayerDelegate>>>,
    bus: EventBus,
}

impl Dispatcher {
    pub(crate) fn new(event_buffer_size: usize) -> Self {
        Self {
            queue: Mutex::new(DispatchQueue::default()),
            delegate: RwLock::new(None),
            bus: EventBus::new(event_buffer_size),
        }
    }

    pub(crate) fn set_delegate(&self, delegate: Weak<dyn PlayerDelegate>) {
        *self.delegate.write() = Some(delegate);
    }

    pub(crate) fn clear_delegate(&self) {
        *self.delegate.write() = None;
    }

    pub(crate) fn subscribe(&self) -> EventStream {
        EventStream::new(self.bus.subscribe())
    }

    pub(crate) fn enqueue(&self, notification: Notification) {
        self.queue.lock().pending.push_back(notification);
    }

    pub(crate) fn event(&self, event: PlayerEvent) {
        self.enqueue(Notification::Event(event));
    }

    /// Deliver queued notifications unless another caller is already doing so.
    pub(crate) fn flush(&self) {
        {
            let mut queue = self.queue.lock();
            if queue.draining {
                return;
            }
            queue.draining = true;
        }

        let _guard = DrainGuard { queue: &self.queue };
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(notification) => notification,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };
            self.deliver(next);
        }
    }

    fn deliver(&self, notification: Notification) {
        match notification {
            Notification::Event(event) => {
                if let Some(delegate) = self.current_delegate() {
                    match &event {
                        PlayerEvent::AudioSessionError { message } => {
                            delegate.on_audio_session_error(message)
                        }
                        PlayerEvent::ReadyToPlay { .. } => delegate.on_ready_to_play(),
                        PlayerEvent::Finished => delegate.on_finished(),
                        PlayerEvent::Paused { .. } => delegate.on_paused(),
                        PlayerEvent::Failed { .. } => delegate.on_failed(),
                    }
                }
                // No subscribers is not an error.
                let _ = self.bus.emit(event);
            }
            Notification::SeekCompleted { callback, finished } => callback(finished),
            Notification::RangesLoaded { callback, ranges } => callback(ranges),
        }
    }

    fn current_delegate(&self) -> Option<Arc<dyn PlayerDelegate>> {
        self.delegate.read().as_ref().and_then(Weak::upgrade)
    }
}

/// Releases the drain claim if a handler panics mid-delivery.
struct DrainGuard<'a> {
    queue: &'a Mutex<DispatchQueue>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.queue.lock().draining = false;
        }
    }
}
