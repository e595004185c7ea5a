//! # Playback Controller
//!
//! Observable state machine in front of a platform [`MediaEngine`].
//!
//! ## Overview
//!
//! `PlaybackController` owns everything that belongs to one playback session:
//! - the source locator and the asset the engine opened for it
//! - the last known position and the authoritative pending seek
//! - the session generation and cancellation token
//!
//! Commands (`set_source`, `play`, `pause`, `stop`, `seek`, ...) never block
//! and never return errors. Each one takes the state lock, resolves itself
//! through [`PlaybackState::apply`], issues the engine's synchronous calls and
//! queues its notifications. The notifications are delivered once the lock is
//! released, so a delegate may issue new commands from inside a callback.
//!
//! Engine work that takes time (opening, seeking, decoding thumbnails,
//! sampling buffered ranges) runs on tokio tasks. Every task remembers the
//! generation it was issued under; replacing the source, stopping or failing
//! bumps the generation and cancels the session token, so results from an
//! older session are discarded instead of applied.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::{PlaybackController, PlayerDelegate};
//! use core_runtime::config::PlayerConfig;
//! use std::sync::Arc;
//!
//! # async fn example(engine: Arc<dyn bridge_traits::MediaEngine>) -> core_playback::Result<()> {
//! let controller = PlaybackController::new(engine, PlayerConfig::default())?;
//! controller.set_source("https://cdn.example.com/trailer.mp4");
//!
//! let mut events = controller.subscribe();
//! while let Ok(event) = events.recv().await {
//!     if matches!(event, core_runtime::events::PlayerEvent::ReadyToPlay { .. }) {
//!         controller.play();
//!         break;
//!     }
//! }
//!
//! controller.seek(std::time::Duration::from_secs(30), |finished| {
//!     println!("seek finished: {finished}");
//! });
//! # Ok(())
//! # }
//! ```

use crate::dispatch::{Dispatcher, Notification, PlayerDelegate, RangesCallback, SeekCallback};
use crate::error::{PlaybackError, Result};
use crate::requests::{PlaybackStatus, Thumbnail, UnavailableReason};
use crate::state::{PlaybackCommand, PlaybackState};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    signal_channel, BridgeError, EngineSignal, EngineSignalReceiver, MediaAsset, MediaEngine,
    MediaLocator, PresentationConfig, TimeRange, VideoGravity,
};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventStream, PlayerEvent};
use core_runtime::logging::redact_locator;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Handle to a playback controller.
///
/// Cloning is cheap; all clones drive the same controller. Dropping the last
/// clone cancels outstanding engine work and closes the current asset.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<dyn MediaEngine>,
    runtime: Handle,
    config: PlayerConfig,
    /// Lock order: `core` before `presentation`.
    presentation: RwLock<PresentationConfig>,
    core: Mutex<Core>,
    dispatcher: Dispatcher,
    root: CancellationToken,
}

/// Session-scoped state guarded by the controller lock.
struct Core {
    state: PlaybackState,
    generation: u64,
    source: Option<MediaLocator>,
    asset: Option<MediaAsset>,
    /// Last known playback position.
    position: Duration,
    pending_seek: Option<PendingSeek>,
    next_seek_token: u64,
    session: CancellationToken,
}

/// The one seek whose completion is still authoritative.
struct PendingSeek {
    token: u64,
    target: Duration,
    callback: Option<SeekCallback>,
    /// Resume the engine once the seek lands (replay and loop restarts).
    resume: bool,
}

impl PlaybackController {
    /// Create a controller driving `engine`, spawning engine work on the
    /// current tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::NoRuntime`] when called outside a tokio runtime
    /// - [`PlaybackError::Config`] when `config` fails validation
    pub fn new(engine: Arc<dyn MediaEngine>, config: PlayerConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?;
        Self::with_runtime(engine, config, runtime)
    }

    /// Create a controller that spawns engine work on `runtime`.
    pub fn with_runtime(
        engine: Arc<dyn MediaEngine>,
        config: PlayerConfig,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let root = CancellationToken::new();
        let core = Core {
            state: PlaybackState::Idle,
            generation: 0,
            source: None,
            asset: None,
            position: Duration::ZERO,
            pending_seek: None,
            next_seek_token: 0,
            session: root.child_token(),
        };

        let inner = Inner {
            engine,
            runtime,
            presentation: RwLock::new(config.presentation),
            dispatcher: Dispatcher::new(config.event_buffer_size),
            config,
            core: Mutex::new(core),
            root,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Start a new session for `locator`.
    ///
    /// Valid from any state. The current session is torn down first: its
    /// pending seek completes with `false` and its asset is closed. The
    /// controller then moves to `Preparing`, configures the audio session and
    /// asks the engine to open the source.
    pub fn set_source(&self, locator: impl Into<MediaLocator>) {
        let locator = locator.into();

        let (generation, session, muted) = {
            let mut core = self.inner.core.lock();
            let next = match core.state.apply(PlaybackCommand::SetSource) {
                Ok(next) => next,
                Err(err) => {
                    debug!(%err, "set_source ignored");
                    return;
                }
            };

            self.inner.end_session(&mut core);
            core.state = next;
            core.source = Some(locator.clone());
            core.position = Duration::ZERO;

            info!(
                source = %redact_locator(locator.as_str()),
                generation = core.generation,
                "Preparing source"
            );

            let muted = self.inner.presentation.read().muted;
            (core.generation, core.session.clone(), muted)
        };
        self.inner.dispatcher.flush();

        let weak = Arc::downgrade(&self.inner);
        let engine = Arc::clone(&self.inner.engine);
        let span = info_span!("session", generation);
        self.inner.runtime.spawn(
            run_session(weak, engine, locator, generation, session, muted).instrument(span),
        );
    }

    /// Start or resume playback.
    ///
    /// Valid from `Ready`, `Paused` and `Finished`. From `Finished` playback
    /// restarts at zero once the engine has completed the rewind.
    pub fn play(&self) {
        {
            let mut core = self.inner.core.lock();
            let next = match core.state.apply(PlaybackCommand::Play) {
                Ok(next) => next,
                Err(err) => {
                    debug!(%err, "play ignored");
                    return;
                }
            };

            let previous = core.state;
            core.state = next;
            if let Some(asset) = core.asset {
                if previous == PlaybackState::Finished {
                    debug!("Replaying from start");
                    core.position = Duration::ZERO;
                    self.inner.start_seek(&mut core, Duration::ZERO, None, true);
                } else {
                    self.inner.engine.play(asset.id);
                }
            }
        }
        self.inner.dispatcher.flush();
    }

    /// Pause playback. Valid from `Playing` only; fires `on_paused`.
    pub fn pause(&self) {
        {
            let mut core = self.inner.core.lock();
            let next = match core.state.apply(PlaybackCommand::Pause) {
                Ok(next) => next,
                Err(err) => {
                    debug!(%err, "pause ignored");
                    return;
                }
            };

            if let Some(asset) = core.asset {
                core.position = self
                    .inner
                    .engine
                    .playback_position(asset.id)
                    .min(asset.info.duration);
                self.inner.engine.pause(asset.id);
            }
            core.state = next;

            self.inner.dispatcher.event(PlayerEvent::Paused {
                position_ms: millis(core.position),
            });
        }
        self.inner.dispatcher.flush();
    }

    /// Release the session and return to `Idle`. Valid from any state but
    /// `Idle`; no event is fired.
    pub fn stop(&self) {
        {
            let mut core = self.inner.core.lock();
            let next = match core.state.apply(PlaybackCommand::Stop) {
                Ok(next) => next,
                Err(err) => {
                    debug!(%err, "stop ignored");
                    return;
                }
            };

            self.inner.end_session(&mut core);
            core.state = next;
            core.source = None;
            core.position = Duration::ZERO;
            info!(generation = core.generation, "Playback stopped");
        }
        self.inner.dispatcher.flush();
    }

    /// Seek to `to`, clamped to the media duration.
    ///
    /// `on_complete` runs exactly once with `true` when the seek landed. It
    /// receives `false` when the engine interrupted the seek, when a newer
    /// seek supersedes it, or when the session ends first. Before the source
    /// is ready the request is dropped and `on_complete` never runs.
    pub fn seek<F>(&self, to: Duration, on_complete: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        {
            let mut core = self.inner.core.lock();
            if !core.state.has_media() {
                debug!(state = %core.state, "seek ignored");
                return;
            }
            self.inner
                .start_seek(&mut core, to, Some(Box::new(on_complete)), false);
        }
        self.inner.dispatcher.flush();
    }

    // ========================================================================
    // Asynchronous queries
    // ========================================================================

    /// Decode the frame nearest to `at`.
    ///
    /// Resolves to [`Thumbnail::Unavailable`] before the source is ready, when
    /// the engine has no frame there, when the configured timeout elapses, or
    /// when the session changes while decoding. Never changes the state.
    pub async fn thumbnail(&self, at: Duration) -> Thumbnail {
        let (asset, generation, session) = {
            let core = self.inner.core.lock();
            match core.asset {
                Some(asset) if core.state.has_media() => {
                    (asset, core.generation, core.session.clone())
                }
                _ => return Thumbnail::Unavailable(UnavailableReason::NotReady),
            }
        };

        let at = at.min(asset.info.duration);
        let timeout = self.inner.config.thumbnail_timeout();
        let engine = Arc::clone(&self.inner.engine);

        let decoded = tokio::select! {
            _ = session.cancelled() => {
                debug!(generation, "Thumbnail request cancelled with its session");
                return Thumbnail::Unavailable(UnavailableReason::Cancelled);
            }
            decoded = tokio::time::timeout(timeout, engine.decode_frame(asset.id, at)) => decoded,
        };

        let thumbnail = match decoded {
            Ok(Ok(Some(frame))) => Thumbnail::Frame(frame),
            Ok(Ok(None)) => Thumbnail::Unavailable(UnavailableReason::NoFrame),
            Ok(Err(err)) => {
                warn!(error = %err, at_ms = millis(at), "Thumbnail decode failed");
                Thumbnail::Unavailable(UnavailableReason::Engine(err.to_string()))
            }
            Err(_) => {
                warn!(
                    at_ms = millis(at),
                    timeout_ms = self.inner.config.thumbnail_timeout_ms,
                    "Thumbnail decode timed out"
                );
                Thumbnail::Unavailable(UnavailableReason::TimedOut)
            }
        };

        if self.inner.core.lock().generation != generation {
            debug!(generation, "Discarding thumbnail from previous session");
            return Thumbnail::Unavailable(UnavailableReason::Cancelled);
        }
        thumbnail
    }

    /// Report the currently loaded ranges through `on_complete`.
    ///
    /// `on_complete` runs exactly once. It receives an empty list before the
    /// source is ready, when the engine fails, or when the session changes
    /// while the engine is sampling; otherwise the ordered, disjoint ranges.
    pub fn loaded_time_ranges_with<F>(&self, on_complete: F)
    where
        F: FnOnce(Vec<TimeRange>) + Send + 'static,
    {
        let callback: RangesCallback = Box::new(on_complete);
        let (asset, generation, session) = {
            let core = self.inner.core.lock();
            let prepared = core.asset.filter(|_| core.state.has_media());
            match prepared {
                Some(asset) => (asset, core.generation, core.session.clone()),
                None => {
                    self.inner.dispatcher.enqueue(Notification::RangesLoaded {
                        callback,
                        ranges: Vec::new(),
                    });
                    drop(core);
                    self.inner.dispatcher.flush();
                    return;
                }
            }
        };

        let weak = Arc::downgrade(&self.inner);
        let engine = Arc::clone(&self.inner.engine);
        self.inner.runtime.spawn(async move {
            let result = tokio::select! {
                _ = session.cancelled() => None,
                result = engine.buffered_ranges(asset.id) => Some(result),
            };
            if let Some(inner) = weak.upgrade() {
                inner.ranges_loaded(generation, result, callback);
            }
        });
    }

    /// Async form of [`loaded_time_ranges_with`](Self::loaded_time_ranges_with).
    pub async fn loaded_time_ranges(&self) -> Vec<TimeRange> {
        let (tx, rx) = oneshot::channel();
        self.loaded_time_ranges_with(move |ranges| {
            let _ = tx.send(ranges);
        });
        rx.await.unwrap_or_default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.inner.core.lock().state
    }

    /// `true` iff the state is `Playing`.
    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    /// Locator of the current session, if any.
    pub fn source(&self) -> Option<MediaLocator> {
        self.inner.core.lock().source.clone()
    }

    /// Asset opened for the current session. `None` until ready.
    pub fn asset(&self) -> Option<MediaAsset> {
        let core = self.inner.core.lock();
        core.asset.filter(|_| core.state.has_media())
    }

    /// Width / height of the video. `None` until ready.
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.asset()
            .and_then(|asset| asset.info.presentation_size.aspect_ratio())
    }

    /// Total media duration. `None` until ready.
    pub fn total_duration(&self) -> Option<Duration> {
        self.asset().map(|asset| asset.info.duration)
    }

    /// Current playback position.
    ///
    /// Zero before a session has advanced; the target while a seek is in
    /// flight; the last known position while paused, finished or failed.
    pub fn current_time(&self) -> Duration {
        let mut core = self.inner.core.lock();
        self.inner.refresh_position(&mut core);
        core.position
    }

    /// Consistent snapshot of state, position and metadata.
    pub fn status(&self) -> PlaybackStatus {
        let mut core = self.inner.core.lock();
        self.inner.refresh_position(&mut core);
        let asset = core.asset.filter(|_| core.state.has_media());
        PlaybackStatus {
            state: core.state,
            position: core.position,
            duration: asset.map(|asset| asset.info.duration),
            aspect_ratio: asset.and_then(|asset| asset.info.presentation_size.aspect_ratio()),
        }
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    pub fn gravity(&self) -> VideoGravity {
        self.inner.presentation.read().gravity
    }

    /// Change the fill mode. Applied to the current asset immediately.
    pub fn set_gravity(&self, gravity: VideoGravity) {
        self.inner.update_presentation(|presentation| presentation.gravity = gravity);
    }

    pub fn is_looping(&self) -> bool {
        self.inner.presentation.read().looping
    }

    /// Change the loop policy. Only affects future end-of-media handling.
    pub fn set_looping(&self, looping: bool) {
        self.inner.presentation.write().looping = looping;
    }

    pub fn is_muted(&self) -> bool {
        self.inner.presentation.read().muted
    }

    /// Mute or unmute. Applied to the current asset immediately and used for
    /// the audio session of the next source.
    pub fn set_muted(&self, muted: bool) {
        self.inner.update_presentation(|presentation| presentation.muted = muted);
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register the delegate. The controller keeps only a weak reference.
    pub fn set_delegate<D: PlayerDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak: Weak<D> = Arc::downgrade(delegate);
        self.inner.dispatcher.set_delegate(weak);
    }

    pub fn clear_delegate(&self) {
        self.inner.dispatcher.clear_delegate();
    }

    /// Subscribe to the player event stream.
    pub fn subscribe(&self) -> EventStream {
        self.inner.dispatcher.subscribe()
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("PlaybackController")
            .field("state", &core.state)
            .field("generation", &core.generation)
            .field("position", &core.position)
            .finish()
    }
}

/// Body of one session: configure audio, open the source, then forward engine
/// signals until the session ends.
async fn run_session(
    weak: Weak<Inner>,
    engine: Arc<dyn MediaEngine>,
    locator: MediaLocator,
    generation: u64,
    session: CancellationToken,
    muted: bool,
) {
    if session.is_cancelled() {
        debug!("Session ended before audio configuration");
        return;
    }
    if let Err(err) = engine.configure_audio_session(muted).await {
        warn!(error = %err, "Audio session configuration failed");
        match weak.upgrade() {
            Some(inner) => inner.audio_session_failed(generation, &err),
            None => return,
        }
    }

    let (signals, receiver) = signal_channel();
    let opened = tokio::select! {
        _ = session.cancelled() => {
            debug!("Session ended while opening source");
            return;
        }
        opened = engine.open(&locator, signals) => opened,
    };

    let Some(inner) = weak.upgrade() else {
        if let Ok(asset) = opened {
            engine.close(asset.id);
        }
        return;
    };
    if !inner.opened(generation, opened) {
        return;
    }
    drop(inner);

    forward_signals(weak, receiver, generation, session).await;
}

async fn forward_signals(
    weak: Weak<Inner>,
    mut receiver: EngineSignalReceiver,
    generation: u64,
    session: CancellationToken,
) {
    loop {
        let signal = tokio::select! {
            _ = session.cancelled() => break,
            signal = receiver.recv() => match signal {
                Some(signal) => signal,
                None => break,
            },
        };
        let Some(inner) = weak.upgrade() else {
            break;
        };
        inner.engine_signal(generation, signal);
    }
    debug!("Signal forwarding finished");
}

impl Inner {
    /// Invalidate everything tied to the current session.
    fn end_session(&self, core: &mut Core) {
        if let Some(seek) = core.pending_seek.take() {
            if let Some(callback) = seek.callback {
                self.dispatcher.enqueue(Notification::SeekCompleted {
                    callback,
                    finished: false,
                });
            }
        }

        core.session.cancel();
        core.session = self.root.child_token();
        core.generation += 1;

        if let Some(asset) = core.asset.take() {
            self.engine.close(asset.id);
        }
    }

    fn fail(&self, core: &mut Core, message: String) {
        match core.state.apply(PlaybackCommand::EngineFailed) {
            Ok(next) => {
                warn!(generation = core.generation, %message, "Playback failed");
                self.end_session(core);
                core.state = next;
                self.dispatcher.event(PlayerEvent::Failed { message });
            }
            Err(err) => debug!(%err, "failure report ignored"),
        }
    }

    fn audio_session_failed(&self, generation: u64, err: &BridgeError) {
        {
            let core = self.core.lock();
            if core.generation != generation {
                return;
            }
            self.dispatcher.event(PlayerEvent::AudioSessionError {
                message: err.to_string(),
            });
        }
        self.dispatcher.flush();
    }

    /// Apply the open result. Returns `true` when the session continues.
    fn opened(&self, generation: u64, result: BridgeResult<MediaAsset>) -> bool {
        let ready = {
            let mut core = self.core.lock();
            if core.generation != generation {
                debug!(generation, "Discarding open result from previous session");
                if let Ok(asset) = result {
                    self.engine.close(asset.id);
                }
                return false;
            }

            match result {
                Ok(asset) => match core.state.apply(PlaybackCommand::EngineReady) {
                    Ok(next) => {
                        core.state = next;
                        core.asset = Some(asset);
                        self.engine
                            .apply_presentation(asset.id, &self.presentation.read());

                        let size = asset.info.presentation_size;
                        info!(
                            duration_ms = millis(asset.info.duration),
                            width = size.width,
                            height = size.height,
                            "Source ready"
                        );
                        self.dispatcher.event(PlayerEvent::ReadyToPlay {
                            duration_ms: millis(asset.info.duration),
                            width: size.width,
                            height: size.height,
                        });
                        true
                    }
                    Err(err) => {
                        debug!(%err, "open result ignored");
                        self.engine.close(asset.id);
                        false
                    }
                },
                Err(err) => {
                    self.fail(&mut core, err.to_string());
                    false
                }
            }
        };
        self.dispatcher.flush();
        ready
    }

    fn engine_signal(self: &Arc<Self>, generation: u64, signal: EngineSignal) {
        {
            let mut core = self.core.lock();
            if core.generation != generation {
                debug!(generation, ?signal, "Discarding signal from previous session");
                return;
            }

            match signal {
                EngineSignal::EndOfMedia => {
                    let looping = self.presentation.read().looping;
                    match core.state.apply(PlaybackCommand::EndOfMedia { looping }) {
                        Ok(next) if looping => {
                            debug!("Looping to start");
                            core.state = next;
                            self.start_seek(&mut core, Duration::ZERO, None, true);
                        }
                        Ok(next) => {
                            core.state = next;
                            if let Some(asset) = core.asset {
                                core.position = asset.info.duration;
                            }
                            info!(generation, "Playback finished");
                            self.dispatcher.event(PlayerEvent::Finished);
                        }
                        Err(err) => debug!(%err, "end of media ignored"),
                    }
                }
                EngineSignal::Failed { message } => self.fail(&mut core, message),
            }
        }
        self.dispatcher.flush();
    }

    /// Issue an engine seek that supersedes any pending one.
    fn start_seek(
        self: &Arc<Self>,
        core: &mut Core,
        target: Duration,
        callback: Option<SeekCallback>,
        resume: bool,
    ) {
        let Some(asset) = core.asset else {
            if let Some(callback) = callback {
                self.dispatcher.enqueue(Notification::SeekCompleted {
                    callback,
                    finished: false,
                });
            }
            return;
        };

        let target = target.min(asset.info.duration);
        let mut resume = resume;
        if let Some(previous) = core.pending_seek.take() {
            debug!(
                superseded_ms = millis(previous.target),
                target_ms = millis(target),
                "Superseding pending seek"
            );
            resume |= previous.resume;
            if let Some(callback) = previous.callback {
                self.dispatcher.enqueue(Notification::SeekCompleted {
                    callback,
                    finished: false,
                });
            }
        }

        core.next_seek_token += 1;
        let token = core.next_seek_token;
        core.pending_seek = Some(PendingSeek {
            token,
            target,
            callback,
            resume,
        });

        let generation = core.generation;
        let session = core.session.clone();
        let weak = Arc::downgrade(self);
        let engine = Arc::clone(&self.engine);
        self.runtime.spawn(async move {
            let result = tokio::select! {
                _ = session.cancelled() => return,
                result = engine.seek(asset.id, target) => result,
            };
            if let Some(inner) = weak.upgrade() {
                inner.seek_completed(generation, token, result);
            }
        });
    }

    fn seek_completed(&self, generation: u64, token: u64, result: BridgeResult<bool>) {
        {
            let mut core = self.core.lock();
            let current = core.generation == generation
                && core.pending_seek.as_ref().map(|seek| seek.token) == Some(token);
            if !current {
                debug!(generation, token, "Discarding superseded seek result");
                return;
            }
            let Some(seek) = core.pending_seek.take() else {
                return;
            };

            let finished = match result {
                Ok(finished) => finished,
                Err(err) => {
                    warn!(error = %err, target_ms = millis(seek.target), "Seek failed");
                    false
                }
            };
            if finished {
                core.position = seek.target;
            }

            if seek.resume && core.state.is_playing() {
                if let Some(asset) = core.asset {
                    self.engine.play(asset.id);
                }
            }

            if let Some(callback) = seek.callback {
                self.dispatcher
                    .enqueue(Notification::SeekCompleted { callback, finished });
            }
        }
        self.dispatcher.flush();
    }

    fn ranges_loaded(
        &self,
        generation: u64,
        result: Option<BridgeResult<Vec<TimeRange>>>,
        callback: RangesCallback,
    ) {
        {
            let core = self.core.lock();
            let ranges = match result {
                Some(Ok(ranges)) if core.generation == generation => TimeRange::normalize(ranges),
                Some(Err(err)) => {
                    warn!(error = %err, "Buffered range query failed");
                    Vec::new()
                }
                _ => {
                    debug!(generation, "Session changed during buffered range query");
                    Vec::new()
                }
            };
            self.dispatcher
                .enqueue(Notification::RangesLoaded { callback, ranges });
        }
        self.dispatcher.flush();
    }

    /// Sample the engine position while it is authoritative. A pending seek
    /// reports its target until the engine lands it.
    fn refresh_position(&self, core: &mut Core) {
        if let Some(seek) = &core.pending_seek {
            core.position = seek.target;
            return;
        }
        if !matches!(core.state, PlaybackState::Ready | PlaybackState::Playing) {
            return;
        }
        if let Some(asset) = core.asset {
            core.position = self
                .engine
                .playback_position(asset.id)
                .min(asset.info.duration);
        }
    }

    fn update_presentation(&self, update: impl FnOnce(&mut PresentationConfig)) {
        let core = self.core.lock();
        let mut presentation = self.presentation.write();
        update(&mut presentation);
        if let Some(asset) = core.asset.filter(|_| core.state.has_media()) {
            self.engine.apply_presentation(asset.id, &presentation);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.root.cancel();
        if let Some(asset) = self.core.get_mut().asset.take() {
            self.engine.close(asset.id);
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
