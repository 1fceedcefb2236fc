//! One connected client's command loop
//!
//! A session reads framed `ClientCommand`s from its half of the socket and
//! turns each one into calls on the shared `Game`. Replies never go through
//! the socket directly; they are queued on the connection's outbox like any
//! other broadcast.

use crate::auth::Registration;
use crate::error::GameError;
use crate::game::Game;
use crate::hub::ConnectionId;
use crate::room::Room;
use log::{debug, info, warn};
use shared::{read_frame, ClientCommand, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncRead;

pub struct Session {
    conn: ConnectionId,
    addr: SocketAddr,
    game: Arc<Game>,
    /// Authenticated player name
    player: Option<String>,
    /// Room the player is currently in
    room: Option<Arc<Room>>,
}

impl Session {
    pub fn new(conn: ConnectionId, addr: SocketAddr, game: Arc<Game>) -> Self {
        Self {
            conn,
            addr,
            game,
            player: None,
            room: None,
        }
    }

    pub fn conn(&self) -> ConnectionId {
        self.conn
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    /// Processes commands until the client exits, hangs up, sends something
    /// unreadable, or is evicted by a failed broadcast.
    ///
    /// Only unrecoverable errors are returned; every other failure is
    /// answered with an `info` message and the loop continues.
    pub async fn run<R>(&mut self, reader: &mut R) -> Result<(), GameError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let command = match read_frame::<_, ClientCommand>(reader).await {
                Ok(Some(command)) => command,
                Ok(None) => {
                    info!("Connection {} ({}) hung up", self.conn, self.addr);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Dropping connection {} ({}): {}", self.conn, self.addr, e);
                    return Err(GameError::Protocol(e));
                }
            };

            if !self.game.hub().contains(self.conn).await {
                debug!("Connection {} was evicted, ending session", self.conn);
                return Ok(());
            }

            debug!("Connection {} sent {}", self.conn, command.kind());
            if command == ClientCommand::Exit {
                info!("Connection {} ({}) exited", self.conn, self.addr);
                return Ok(());
            }

            self.handle(command).await?;
        }
    }

    /// Runs one command and reports a recoverable failure to the client.
    /// Anything else is handed back so the connection can be closed.
    pub async fn handle(&mut self, command: ClientCommand) -> Result<(), GameError> {
        let Err(e) = self.dispatch(command).await else {
            return Ok(());
        };

        if !e.is_recoverable() {
            return Err(e);
        }

        match e.client_message() {
            Some(message) => {
                debug!("Connection {}: {}", self.conn, message);
                self.game
                    .send_to(self.conn, ServerMessage::info(message))
                    .await;
            }
            None => debug!("Connection {}: {}", self.conn, e),
        }
        Ok(())
    }

    async fn dispatch(&mut self, command: ClientCommand) -> Result<(), GameError> {
        let player = match (&command, self.player.clone()) {
            (ClientCommand::Registration { name, password }, None) => {
                return self.register(name, password).await;
            }
            (ClientCommand::Registration { .. }, Some(current)) => {
                return Err(GameError::InvalidInput(format!(
                    "already registered as {}",
                    current
                )));
            }
            (ClientCommand::Exit, _) => return Ok(()),
            (_, None) => return Err(GameError::NotRegistered),
            (_, Some(player)) => player,
        };

        match command {
            ClientCommand::CreateRoom { room } => {
                let created = self.game.create_room(self.conn, &room).await?;
                self.enter(&player, created).await;
            }
            ClientCommand::JoinRoom { room } => {
                if self.current_room_name() == Some(room.as_str()) {
                    return Err(GameError::InvalidInput(format!(
                        "you are already in {}",
                        room
                    )));
                }

                let target = self.game.find_room(&room).await?;
                self.game
                    .send_to(self.conn, ServerMessage::Joined { room })
                    .await;
                self.enter(&player, target).await;
            }
            ClientCommand::LeaveRoom { room } => {
                let current = self.current_room(&room)?;
                self.room = None;
                self.game.leave_room(self.conn, &current).await;
                self.game
                    .send_to(self.conn, ServerMessage::info(format!("you left {}", room)))
                    .await;
            }
            ClientCommand::StartGame { room } => {
                let current = self.current_room(&room)?;
                self.game.start_game(self.conn, &current).await?;
            }
            ClientCommand::SubmitWord {
                room,
                word,
                player: claimed,
            } => {
                if claimed != player {
                    debug!(
                        "Connection {} submitted as {:?}, using {:?}",
                        self.conn, claimed, player
                    );
                }
                let current = self.current_room(&room)?;
                self.game.submit_word(self.conn, &current, &word).await?;
            }
            ClientCommand::Registration { .. } | ClientCommand::Exit => {}
        }

        Ok(())
    }

    async fn register(&mut self, name: &str, password: &str) -> Result<(), GameError> {
        match self.game.register(self.conn, name, password).await? {
            Registration::Accepted => {
                info!("Connection {} registered as {}", self.conn, name);
                self.player = Some(name.to_string());
                Ok(())
            }
            Registration::Rejected => Err(GameError::AuthRejected(name.to_string())),
        }
    }

    /// Moves the player into `room`, leaving the previous room first.
    async fn enter(&mut self, player: &str, room: Arc<Room>) {
        if let Some(previous) = self.room.take() {
            self.game.leave_room(self.conn, &previous).await;
        }
        self.game.join_room(self.conn, player, &room).await;
        self.room = Some(room);
    }

    fn current_room_name(&self) -> Option<&str> {
        self.room.as_ref().map(|room| room.name())
    }

    fn current_room(&self, name: &str) -> Result<Arc<Room>, GameError> {
        self.room
            .as_ref()
            .filter(|room| room.name() == name)
            .cloned()
            .ok_or_else(|| GameError::NotInRoom(name.to_string()))
    }
}
