//! Shared game state and the operations sessions and timers call into
//!
//! `Game` is built once at startup and handed to every session as an
//! `Arc<Game>`. It owns the global collections (live connections, rooms,
//! credentials, leaderboard, word dataset), each behind its own lock. Room
//! transitions run under the room's lock; the resulting messages are
//! delivered afterwards, so no lock is ever held while a message is queued
//! for a peer.

use crate::auth::{CredentialStore, Registration};
use crate::config::ServerConfig;
use crate::error::GameError;
use crate::hub::{ConnectionId, Outbox, SessionHub};
use crate::leaderboard::Leaderboard;
use crate::registry::RoomRegistry;
use crate::room::{Delivery, Effects, Room, Timer};
use crate::words::WordDataset;
use log::{debug, error, info};
use shared::ServerMessage;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::sleep;

pub struct Game {
    config: ServerConfig,
    hub: SessionHub,
    registry: RoomRegistry,
    credentials: CredentialStore,
    leaderboard: Leaderboard,
    words: WordDataset,
}

impl Game {
    pub fn new(
        config: ServerConfig,
        credentials: CredentialStore,
        leaderboard: Leaderboard,
        words: WordDataset,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            hub: SessionHub::new(),
            registry: RoomRegistry::new(),
            credentials,
            leaderboard,
            words,
        })
    }

    /// Loads persisted tables and the word list named by `config`.
    pub async fn open(config: ServerConfig) -> Result<Arc<Self>, GameError> {
        let credentials = CredentialStore::open(config.credentials_path()).await?;
        let leaderboard = Leaderboard::open(config.leaderboard_path()).await?;
        let words = match &config.words_file {
            Some(path) => WordDataset::from_file(path).await?,
            None => WordDataset::builtin(),
        };
        info!("Loaded {} reference words", words.len());

        Ok(Self::new(config, credentials, leaderboard, words))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub async fn connect(&self, addr: SocketAddr, outbox: Outbox) -> ConnectionId {
        self.hub.add_peer(addr, outbox).await
    }

    /// Removes a connection from the hub and from every room it was in.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let notices = self.detach(conn).await;
        for notice in notices {
            self.broadcast(&notice.targets, notice.message).await;
        }
    }

    pub async fn send_to(&self, conn: ConnectionId, message: ServerMessage) {
        self.broadcast(&[conn], message).await;
    }

    /// Sends `message` to `targets` in order and evicts any target that
    /// turns out to be unreachable. Leave notices caused by an eviction are
    /// delivered the same way.
    pub async fn broadcast(&self, targets: &[ConnectionId], message: ServerMessage) {
        let mut pending = VecDeque::from([Delivery {
            targets: targets.to_vec(),
            message,
        }]);

        while let Some(delivery) = pending.pop_front() {
            let unreachable = self.hub.deliver(&delivery.targets, &delivery.message).await;
            for conn in unreachable {
                pending.extend(self.detach(conn).await);
            }
        }
    }

    /// Sends `message` to every live connection.
    pub async fn broadcast_all(&self, message: ServerMessage) {
        let targets = self.hub.connection_ids().await;
        self.broadcast(&targets, message).await;
    }

    async fn detach(&self, conn: ConnectionId) -> Vec<Delivery> {
        if self.hub.remove_peer(conn).await.is_some() {
            debug!("Evicting connection {} from all rooms", conn);
        }

        let mut notices = Vec::new();
        for room in self.registry.rooms().await {
            let notice = room.lock().await.leave(conn);
            notices.extend(notice);
        }
        notices
    }

    /// Registers or logs in `name` on behalf of `conn`.
    ///
    /// Replies `registration:ok` followed by the leaderboard and room
    /// catalogue, or `registration:no`. A correct login for a name that is
    /// already playing on another live connection is refused with
    /// `AlreadyConnected`.
    pub async fn register(
        &self,
        conn: ConnectionId,
        name: &str,
        password: &str,
    ) -> Result<Registration, GameError> {
        let outcome = if name.is_empty() || password.is_empty() {
            Registration::Rejected
        } else {
            self.credentials.register(name, password).await?
        };

        match outcome {
            Registration::Accepted => {
                if !self.hub.claim_name(conn, name).await {
                    return Err(GameError::AlreadyConnected(name.to_string()));
                }
                self.send_to(conn, ServerMessage::Registration { accepted: true })
                    .await;

                let table = self.leaderboard.snapshot().await;
                self.send_to(conn, ServerMessage::Table { table }).await;

                let rooms = self.registry.list_names().await;
                self.send_to(conn, ServerMessage::Rooms { rooms }).await;
            }
            Registration::Rejected => {
                self.send_to(conn, ServerMessage::Registration { accepted: false })
                    .await;
            }
        }

        Ok(outcome)
    }

    /// Creates a room, confirms it to `conn` and announces the new catalogue
    /// to everyone.
    pub async fn create_room(&self, conn: ConnectionId, name: &str) -> Result<Arc<Room>, GameError> {
        if name.is_empty() {
            return Err(GameError::InvalidInput(
                "room name must not be empty".to_string(),
            ));
        }

        let room = self.registry.create_room(name).await?;
        self.send_to(
            conn,
            ServerMessage::Created {
                room: name.to_string(),
            },
        )
        .await;

        let rooms = self.registry.list_names().await;
        self.broadcast_all(ServerMessage::Rooms { rooms }).await;

        Ok(room)
    }

    pub async fn find_room(&self, name: &str) -> Result<Arc<Room>, GameError> {
        self.registry
            .find_room(name)
            .await
            .ok_or_else(|| GameError::RoomNotFound(name.to_string()))
    }

    /// Adds `conn` to `room` and tells every member.
    pub async fn join_room(&self, conn: ConnectionId, player: &str, room: &Room) {
        let notice = room.lock().await.join(conn, player);
        if let Some(notice) = notice {
            self.broadcast(&notice.targets, notice.message).await;
        }
    }

    /// Removes `conn` from `room` and tells the remaining members.
    pub async fn leave_room(&self, conn: ConnectionId, room: &Room) {
        let notice = room.lock().await.leave(conn);
        if let Some(notice) = notice {
            self.broadcast(&notice.targets, notice.message).await;
        }
    }

    pub async fn start_game(self: &Arc<Self>, conn: ConnectionId, room: &Arc<Room>) -> Result<(), GameError> {
        let effects = room.lock().await.request_start(conn)?;
        self.apply(room, effects).await;
        Ok(())
    }

    pub async fn submit_word(&self, conn: ConnectionId, room: &Room, word: &str) -> Result<(), GameError> {
        let delivery = room.lock().await.submit_word(conn, word)?;
        self.broadcast(&delivery.targets, delivery.message).await;
        Ok(())
    }

    /// Countdown expiry: picks a reference word and tries to start the round.
    pub async fn begin_round(self: &Arc<Self>, room: &Arc<Room>, epoch: u64) {
        let word = self.words.choose();
        let effects = room.lock().await.begin_round(epoch, word);
        self.apply(room, effects).await;
    }

    /// Round expiry: announces the result, credits the winner on the
    /// leaderboard and returns the room to idle.
    pub async fn end_round(&self, room: &Room, epoch: u64) {
        let outcome = room.lock().await.finish_round(epoch);
        let Some(outcome) = outcome else {
            return;
        };

        self.broadcast(&outcome.notice.targets, outcome.notice.message)
            .await;

        if let Some((winner, _)) = &outcome.winner {
            match self.leaderboard.increment_and_persist(winner).await {
                Ok(table) => self.broadcast_all(ServerMessage::Table { table }).await,
                Err(e) => error!(
                    "Room {}: could not record win for {}: {}",
                    room.name(),
                    winner,
                    e
                ),
            }
        }

        room.lock().await.reset();
    }

    async fn apply(self: &Arc<Self>, room: &Arc<Room>, effects: Effects) {
        for delivery in effects.deliveries {
            self.broadcast(&delivery.targets, delivery.message).await;
        }

        if let Some(timer) = effects.timer {
            self.schedule(Arc::clone(room), timer);
        }
    }

    /// Runs `timer` on its own task after the configured delay. Timers are
    /// never cancelled; a stale one is a no-op inside the room.
    fn schedule(self: &Arc<Self>, room: Arc<Room>, timer: Timer) {
        let game = Arc::clone(self);
        let delay = match timer {
            Timer::BeginRound { .. } => self.config.countdown,
            Timer::EndRound { .. } => self.config.round_duration,
        };
        debug!("Room {}: {:?} in {:?}", room.name(), timer, delay);

        tokio::spawn(async move {
            sleep(delay).await;
            match timer {
                Timer::BeginRound { epoch } => game.begin_round(&room, epoch).await,
                Timer::EndRound { epoch } => game.end_round(&room, epoch).await,
            }
        });
    }
}
