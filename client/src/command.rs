//! Turns terminal input into protocol commands
//!
//! Lines starting with `/` are commands; anything else is a word for the
//! current room. The prompt remembers who we are and which room we are in,
//! learning both from what the server sends back.

use shared::{ClientCommand, ServerMessage};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  /register <name> <password>
  /create <room>
  /join <room>
  /leave
  /start
  /exit
anything else is submitted as a word in the current room";

/// Why a line could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command /{0} (try /help)")]
    UnknownCommand(String),

    #[error("join or create a room first")]
    NotInRoom,

    #[error("register first")]
    NotRegistered,
}

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(ClientCommand),
    Help,
    Nothing,
}

#[derive(Debug, Default)]
pub struct Prompt {
    name: Option<String>,
    pending_name: Option<String>,
    room: Option<String>,
}

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn parse(&mut self, line: &str) -> Result<Input, InputError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Input::Nothing);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return self.submit(line);
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("register", [name, password]) => {
                self.pending_name = Some(name.to_string());
                ClientCommand::Registration {
                    name: name.to_string(),
                    password: password.to_string(),
                }
            }
            ("register", _) => return Err(InputError::Usage("/register <name> <password>")),
            ("create", [room]) => ClientCommand::CreateRoom {
                room: room.to_string(),
            },
            ("create", _) => return Err(InputError::Usage("/create <room>")),
            ("join", [room]) => ClientCommand::JoinRoom {
                room: room.to_string(),
            },
            ("join", _) => return Err(InputError::Usage("/join <room>")),
            ("leave", []) => ClientCommand::LeaveRoom {
                room: self.room.clone().ok_or(InputError::NotInRoom)?,
            },
            ("start", []) => ClientCommand::StartGame {
                room: self.room.clone().ok_or(InputError::NotInRoom)?,
            },
            ("exit" | "quit", []) => ClientCommand::Exit,
            ("help", _) => return Ok(Input::Help),
            ("leave", _) => return Err(InputError::Usage("/leave")),
            ("start", _) => return Err(InputError::Usage("/start")),
            ("exit" | "quit", _) => return Err(InputError::Usage("/exit")),
            (other, _) => return Err(InputError::UnknownCommand(other.to_string())),
        };

        Ok(Input::Send(command))
    }

    fn submit(&self, word: &str) -> Result<Input, InputError> {
        let player = self.name.clone().ok_or(InputError::NotRegistered)?;
        let room = self.room.clone().ok_or(InputError::NotInRoom)?;

        Ok(Input::Send(ClientCommand::SubmitWord {
            room,
            word: word.to_string(),
            player,
        }))
    }

    /// Updates the remembered name and room from a server message.
    pub fn observe(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::Registration { accepted: true } => {
                if let Some(name) = self.pending_name.take() {
                    self.name = Some(name);
                }
            }
            ServerMessage::Registration { accepted: false } => {
                self.pending_name = None;
            }
            ServerMessage::Created { room } | ServerMessage::Joined { room } => {
                self.room = Some(room.clone());
            }
            ServerMessage::Info { message } => {
                let left = self
                    .room
                    .as_ref()
                    .is_some_and(|room| *message == format!("you left {}", room));
                if left {
                    self.room = None;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(prompt: &mut Prompt) {
        prompt.parse("/register alice secret").unwrap();
        prompt.observe(&ServerMessage::Registration { accepted: true });
        prompt.observe(&ServerMessage::Joined {
            room: "lobby".to_string(),
        });
    }

    #[test]
    fn test_register_sets_name_on_acceptance() {
        let mut prompt = Prompt::new();

        let input = prompt.parse("/register alice secret").unwrap();
        assert_eq!(
            input,
            Input::Send(ClientCommand::Registration {
                name: "alice".to_string(),
                password: "secret".to_string(),
            })
        );
        assert_eq!(prompt.name(), None);

        prompt.observe(&ServerMessage::Registration { accepted: true });
        assert_eq!(prompt.name(), Some("alice"));
    }

    #[test]
    fn test_rejected_registration_keeps_no_name() {
        let mut prompt = Prompt::new();
        prompt.parse("/register alice wrong").unwrap();
        prompt.observe(&ServerMessage::Registration { accepted: false });
        prompt.observe(&ServerMessage::Registration { accepted: true });

        assert_eq!(prompt.name(), None);
    }

    #[test]
    fn test_words_go_to_current_room() {
        let mut prompt = Prompt::new();
        joined(&mut prompt);

        let input = prompt.parse("  rev ").unwrap();
        assert_eq!(
            input,
            Input::Send(ClientCommand::SubmitWord {
                room: "lobby".to_string(),
                word: "rev".to_string(),
                player: "alice".to_string(),
            })
        );
    }

    #[test]
    fn test_room_commands_need_a_room() {
        let mut prompt = Prompt::new();
        assert_eq!(prompt.parse("/start"), Err(InputError::NotInRoom));
        assert_eq!(prompt.parse("/leave"), Err(InputError::NotInRoom));
        assert_eq!(prompt.parse("word"), Err(InputError::NotRegistered));
    }

    #[test]
    fn test_leave_forgets_room_once_confirmed() {
        let mut prompt = Prompt::new();
        joined(&mut prompt);

        let input = prompt.parse("/leave").unwrap();
        assert_eq!(
            input,
            Input::Send(ClientCommand::LeaveRoom {
                room: "lobby".to_string()
            })
        );
        assert_eq!(prompt.room(), Some("lobby"));

        prompt.observe(&ServerMessage::info("bob left lobby"));
        prompt.observe(&ServerMessage::info("you left elsewhere"));
        assert_eq!(prompt.room(), Some("lobby"));

        prompt.observe(&ServerMessage::info("you left lobby"));
        assert_eq!(prompt.room(), None);
        assert_eq!(prompt.parse("/leave"), Err(InputError::NotInRoom));
    }

    #[test]
    fn test_bad_input() {
        let mut prompt = Prompt::new();
        assert_eq!(prompt.parse(""), Ok(Input::Nothing));
        assert_eq!(prompt.parse("/help"), Ok(Input::Help));
        assert_eq!(
            prompt.parse("/create"),
            Err(InputError::Usage("/create <room>"))
        );
        assert_eq!(
            prompt.parse("/dance"),
            Err(InputError::UnknownCommand("dance".to_string()))
        );
        assert_eq!(prompt.parse("/exit"), Ok(Input::Send(ClientCommand::Exit)));
    }
}
