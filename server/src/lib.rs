//! # Anagram Game Server Library
//!
//! This library provides the authoritative server for the multiplayer anagram
//! game. Players register, gather in named rooms, opt in to timed rounds and
//! race to find words that can be spelled from a shared reference word.
//!
//! ## Core Responsibilities
//!
//! ### Room Rounds
//! Every room runs its own round state machine (`Idle`, `Countdown`,
//! `RoundActive`, `Ended`). Two one-shot timers drive it: the countdown that
//! gives players time to opt in, and the round deadline that forces a result.
//!
//! ### Session Management
//! Handles the complete lifecycle of client connections including:
//! - Connection establishment and id assignment
//! - Registration and login against the credential store
//! - Room creation, joining and leaving
//! - Disconnection handling and cleanup
//!
//! ### Broadcasting
//! Notifications go out through per-connection outboxes. A peer that can no
//! longer be reached is evicted from the hub and from every room.
//!
//! ## Architecture Design
//!
//! ### One Task Per Connection
//! Each connection has a reader task running its `Session` and a writer task
//! draining its outbox. Timers are tasks of their own. Rooms are serialized by
//! their own lock; the registry, credential store, leaderboard and hub each
//! have an independent lock. No lock is held while a message is queued.
//!
//! ### TCP Framing
//! Messages are `bincode` payloads behind a 4-byte big-endian length prefix
//! (see `shared::framing`).
//!
//! ## Module Organization
//!
//! - `network`: accept loop and per-connection reader/writer tasks
//! - `session`: command dispatch for one client
//! - `game`: shared state, broadcast with eviction, timer scheduling
//! - `hub`: live connections and their outboxes
//! - `registry` / `room`: room catalogue and the round state machine
//! - `auth` / `leaderboard` / `persistence`: durable JSON tables
//! - `words`: reference word dataset and the derivability check
//! - `config` / `error`: settings and the error taxonomy
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::game::Game;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let address = config.address();
//!
//!     // Loads credentials, leaderboard and the word dataset
//!     let game = Game::open(config).await?;
//!
//!     let server = Server::bind(&address, game).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod game;
pub mod hub;
pub mod leaderboard;
pub mod network;
pub mod persistence;
pub mod registry;
pub mod room;
pub mod session;
pub mod words;
