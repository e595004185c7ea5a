//! # Playback Error Types
//!
//! Errors surfaced by the playback controller.
//!
//! Commands never return these: a rejected command is a silent no-op that is
//! only traced, and engine failures are reported through events. The error
//! type exists for construction and for the transition table, whose verdicts
//! the controller logs.

use crate::state::{PlaybackCommand, PlaybackState};
use thiserror::Error;

/// Errors that can occur in the playback controller.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // State Machine
    // ========================================================================
    /// The command is not valid in the current state.
    #[error("Command {command:?} is not valid in state {state:?}")]
    InvalidTransition {
        state: PlaybackState,
        command: PlaybackCommand,
    },

    // ========================================================================
    // Construction
    // ========================================================================
    /// The controller was created outside a tokio runtime.
    #[error("No async runtime available to drive the media engine")]
    NoRuntime,

    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Returns `true` if this error only signals a rejected command.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PlaybackError::InvalidTransition { .. })
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
