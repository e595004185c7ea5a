//! # Playback Control Module
//!
//! Presents video playback as a small, observable state machine on top of a
//! host-provided [`MediaEngine`](bridge_traits::MediaEngine).
//!
//! ## Overview
//!
//! This module handles:
//! - The playback state machine and its transition table
//! - Session lifecycle (prepare, replace, stop, fail) with generation tokens
//! - Asynchronous contracts for seeks, thumbnails and loaded ranges
//! - Ordered, non-reentrant delivery to an optional [`PlayerDelegate`] and to
//!   the player event bus
//!
//! Decoding, rendering and audio routing stay in the engine.

pub mod controller;
pub mod dispatch;
pub mod error;
pub mod requests;
pub mod state;

pub use controller::PlaybackController;
pub use dispatch::PlayerDelegate;
pub use error::{PlaybackError, Result};
pub use requests::{PlaybackStatus, Thumbnail, UnavailableReason};
pub use state::{PlaybackCommand, PlaybackState};
