//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the video playback core:
//! - Logging and tracing infrastructure
//! - Player configuration
//! - Player event bus
//!
//! ## Overview
//!
//! Nothing in this crate knows about the playback state machine. It supplies
//! the ambient pieces the controller in `core-playback` is built on: how it is
//! configured, how it logs and how it broadcasts observations.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{PlayerConfig, PlayerConfigBuilder};
pub use error::{Error, Result};
pub use events::{EventBus, EventSeverity, EventStream, PlayerEvent};
