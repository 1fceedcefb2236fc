//! Protocol types shared by the anagram server and client
//!
//! Commands and notifications are serde enums framed on the wire by
//! `framing`. Score and leaderboard mappings travel as ordered pairs.

use serde::{Deserialize, Serialize};

pub mod framing;

pub use framing::{encode_frame, read_frame, write_frame, FrameError, MAX_FRAME_SIZE};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 65432;

/// Commands a client sends to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Registration {
        name: String,
        password: String,
    },
    CreateRoom {
        room: String,
    },
    JoinRoom {
        room: String,
    },
    LeaveRoom {
        room: String,
    },
    StartGame {
        room: String,
    },
    SubmitWord {
        room: String,
        word: String,
        player: String,
    },
    Exit,
}

impl ClientCommand {
    /// Wire name of the command.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::Registration { .. } => "registration",
            ClientCommand::CreateRoom { .. } => "create_room",
            ClientCommand::JoinRoom { .. } => "join_room",
            ClientCommand::LeaveRoom { .. } => "leave_room",
            ClientCommand::StartGame { .. } => "start_game",
            ClientCommand::SubmitWord { .. } => "submit_word",
            ClientCommand::Exit => "exit",
        }
    }
}

/// Notifications the server pushes to clients.
///
/// Mappings travel as ordered pairs so that the sender's ordering survives
/// the wire: round scores keep first-scored order, the leaderboard table is
/// ranked by wins.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Info { message: String },
    Created { room: String },
    Joined { room: String },
    Rooms { rooms: Vec<String> },
    Start { word: String },
    Score { scores: Vec<(String, u32)> },
    End { message: String },
    Table { table: Vec<(String, u32)> },
    Registration { accepted: bool },
}

impl ServerMessage {
    pub fn info(message: impl Into<String>) -> Self {
        ServerMessage::Info {
            message: message.into(),
        }
    }

    /// Wire name of the notification.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Info { .. } => "info",
            ServerMessage::Created { .. } => "created",
            ServerMessage::Joined { .. } => "joined",
            ServerMessage::Rooms { .. } => "rooms",
            ServerMessage::Start { .. } => "start",
            ServerMessage::Score { .. } => "score",
            ServerMessage::End { .. } => "end",
            ServerMessage::Table { .. } => "table",
            ServerMessage::Registration { .. } => "registration",
        }
    }
}
