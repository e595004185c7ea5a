//! Playback state machine.
//!
//! [`PlaybackState::apply`] is the single transition table. Every path in the
//! controller, whether a caller command or an engine report, goes through it,
//! so the table below is the whole behavioural contract:
//!
//! | command        | from                                   | to                      |
//! |----------------|----------------------------------------|-------------------------|
//! | `SetSource`    | any                                    | `Preparing`             |
//! | `EngineReady`  | `Preparing`                            | `Ready`                 |
//! | `EngineFailed` | `Preparing`, `Ready`, `Playing`, `Paused` | `Failed`             |
//! | `Play`         | `Ready`, `Paused`, `Finished`          | `Playing`               |
//! | `Pause`        | `Playing`                              | `Paused`                |
//! | `EndOfMedia`   | `Playing`                              | `Playing` if looping, else `Finished` |
//! | `Stop`         | any but `Idle`                         | `Idle`                  |

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No source assigned.
    Idle,
    /// The engine is opening the source.
    Preparing,
    /// Metadata is known and playback can start.
    Ready,
    Playing,
    Paused,
    /// Reached the end of media with looping disabled.
    Finished,
    /// The source could not be opened or decoded.
    Failed,
}

impl PlaybackState {
    /// Every state, in lifecycle order.
    pub const ALL: [PlaybackState; 7] = [
        PlaybackState::Idle,
        PlaybackState::Preparing,
        PlaybackState::Ready,
        PlaybackState::Playing,
        PlaybackState::Paused,
        PlaybackState::Finished,
        PlaybackState::Failed,
    ];

    /// Duration, dimensions and the asset handle are defined.
    pub fn has_media(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Finished
        )
    }

    /// A session is in progress and can still fail.
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            PlaybackState::Preparing
                | PlaybackState::Ready
                | PlaybackState::Playing
                | PlaybackState::Paused
        )
    }

    pub fn is_playing(&self) -> bool {
        *self == PlaybackState::Playing
    }

    /// Resolve `command` against this state.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidTransition`] when the command is not valid here.
    pub fn apply(self, command: PlaybackCommand) -> Result<PlaybackState> {
        use PlaybackCommand as C;
        use PlaybackState as S;

        let next = match (self, command) {
            (_, C::SetSource) => S::Preparing,
            (S::Preparing, C::EngineReady) => S::Ready,
            (state, C::EngineFailed) if state.can_fail() => S::Failed,
            (S::Ready | S::Paused | S::Finished, C::Play) => S::Playing,
            (S::Playing, C::Pause) => S::Paused,
            (S::Playing, C::EndOfMedia { looping: true }) => S::Playing,
            (S::Playing, C::EndOfMedia { looping: false }) => S::Finished,
            (state, C::Stop) if state != S::Idle => S::Idle,
            (state, command) => {
                return Err(PlaybackError::InvalidTransition { state, command });
            }
        };
        Ok(next)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Preparing => "preparing",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Finished => "finished",
            PlaybackState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackCommand {
    /// Caller assigned a new source.
    SetSource,
    /// Engine finished opening the source.
    EngineReady,
    /// Engine could not open or keep decoding the source.
    EngineFailed,
    Play,
    Pause,
    /// Engine reached the end of media.
    EndOfMedia { looping: bool },
    Stop,
}

impl PlaybackCommand {
    /// Every command, including both loop variants of `EndOfMedia`.
    pub const ALL: [PlaybackCommand; 8] = [
        PlaybackCommand::SetSource,
        PlaybackCommand::EngineReady,
        PlaybackCommand::EngineFailed,
        PlaybackCommand::Play,
        PlaybackCommand::Pause,
        PlaybackCommand::EndOfMedia { looping: true },
        PlaybackCommand::EndOfMedia { looping: false },
        PlaybackCommand::Stop,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackCommand as C;
    use PlaybackState as S;

    /// Expected outcome for every state x command pair; `None` = rejected.
    fn expected(state: S, command: C) -> Option<S> {
        match command {
            C::SetSource => Some(S::Preparing),
            C::EngineReady => (state == S::Preparing).then_some(S::Ready),
            C::EngineFailed => matches!(state, S::Preparing | S::Ready | S::Playing | S::Paused)
                .then_some(S::Failed),
            C::Play => matches!(state, S::Ready | S::Paused | S::Finished).then_some(S::Playing),
            C::Pause => (state == S::Playing).then_some(S::Paused),
            C::EndOfMedia { looping } => (state == S::Playing).then_some(if looping {
                S::Playing
            } else {
                S::Finished
            }),
            C::Stop => (state != S::Idle).then_some(S::Idle),
        }
    }

    #[test]
    fn transition_table_is_exhaustive() {
        for state in S::ALL {
            for command in C::ALL {
                let result = state.apply(command);
                match expected(state, command) {
                    Some(next) => assert_eq!(
                        result.unwrap(),
                        next,
                        "{:?} + {:?}",
                        state,
                        command
                    ),
                    None => {
                        let err = result.expect_err("command should be rejected");
                        assert!(err.is_rejection());
                        assert!(matches!(
                            err,
                            PlaybackError::InvalidTransition { state: s, command: c }
                                if s == state && c == command
                        ));
                    }
                }
            }
        }
    }

    #[test]
    fn play_is_rejected_where_it_has_no_meaning() {
        for state in [S::Idle, S::Preparing, S::Playing, S::Failed] {
            assert!(state.apply(C::Play).is_err(), "{:?}", state);
        }
    }

    #[test]
    fn stop_returns_to_idle_from_every_active_state() {
        for state in S::ALL.into_iter().filter(|s| *s != S::Idle) {
            assert_eq!(state.apply(C::Stop).unwrap(), S::Idle);
        }
        assert!(S::Idle.apply(C::Stop).is_err());
    }

    #[test]
    fn failed_only_recovers_through_new_source_or_stop() {
        for command in C::ALL {
            let result = S::Failed.apply(command);
            match command {
                C::SetSource => assert_eq!(result.unwrap(), S::Preparing),
                C::Stop => assert_eq!(result.unwrap(), S::Idle),
                _ => assert!(result.is_err(), "{:?}", command),
            }
        }
    }

    #[test]
    fn media_availability() {
        assert!(!S::Idle.has_media());
        assert!(!S::Preparing.has_media());
        assert!(S::Ready.has_media());
        assert!(S::Finished.has_media());
        assert!(!S::Failed.has_media());
        assert!(S::Playing.is_playing());
        assert!(!S::Paused.is_playing());
        assert_eq!(S::Finished.to_string(), "finished");
    }
}
