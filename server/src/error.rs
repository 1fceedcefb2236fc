//! Error taxonomy for the game server
//!
//! Most variants are recoverable: the session answers the affected client
//! with an `info` notification built from `client_message` and keeps going.
//! `Protocol` ends the connection. `WordRejected` and `PeerUnreachable` are
//! never reported to anyone, and `AuthRejected` is answered with
//! `registration:no` instead of an `info` message.

use crate::hub::ConnectionId;
use crate::persistence::PersistenceError;
use crate::words::DatasetError;
use shared::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("malformed message: {0}")]
    Protocol(#[from] FrameError),

    #[error("registration refused for {0:?}")]
    AuthRejected(String),

    #[error("{0} is already connected")]
    AlreadyConnected(String),

    #[error("there is no room named {0}")]
    RoomNotFound(String),

    #[error("a room named {0} already exists")]
    RoomNameTaken(String),

    #[error("word rejected")]
    WordRejected,

    #[error("connection {0} is unreachable")]
    PeerUnreachable(ConnectionId),

    #[error("failed to persist state: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("word dataset unavailable: {0}")]
    Dataset(#[from] DatasetError),

    #[error("register first")]
    NotRegistered,

    #[error("you are not in room {0}")]
    NotInRoom(String),

    #[error("a round is already in progress")]
    RoundInProgress,

    #[error("{0}")]
    InvalidInput(String),
}

impl GameError {
    /// Whether the connection can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GameError::Protocol(_) | GameError::Dataset(_))
    }

    /// Plain-text `info` message for the affected client, if any.
    pub fn client_message(&self) -> Option<String> {
        match self {
            GameError::WordRejected
            | GameError::AuthRejected(_)
            | GameError::PeerUnreachable(_)
            | GameError::Protocol(_)
            | GameError::Dataset(_) => None,
            GameError::Persistence(_) => {
                Some("the server could not save your request, try again".to_string())
            }
            other => Some(other.to_string()),
        }
    }
}
