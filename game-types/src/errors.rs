use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::room::{Letter, PlayerNumber};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum GameError {
    #[error("room is not ready to start")]
    RoomNotReady,
    #[error("expected {expected} phase, room is in {actual}")]
    WrongPhase { expected: String, actual: String },
    #[error("player not in room: {name}")]
    PlayerNotFound { name: String },
    #[error("invalid word: {word}")]
    InvalidWord { word: String },
    #[error("hint letter {letter} is stale: {reason}")]
    StaleHint { letter: Letter, reason: String },
    #[error("hint has no letters")]
    EmptyHint,
    #[error("player {player} cannot {action} now")]
    InvalidResolveAction { player: PlayerNumber, action: String },
    #[error("inconsistent state: {message}")]
    InconsistentState { message: String },
    #[error("final guesses claim unavailable letters")]
    InvalidLetters,
    #[error("guess needs at least {required} letters, has {actual}")]
    GuessTooShort { required: usize, actual: usize },
    #[error("unsupported schema version {version}")]
    UnsupportedSchema { version: u32 },
    #[error("malformed room document: {message}")]
    MalformedDocument { message: String },
}
