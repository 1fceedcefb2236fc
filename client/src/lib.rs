//! # Anagram Game Client Library
//!
//! This library provides the client side of the anagram game: a framed TCP
//! connection to the server plus the pieces of a line-oriented terminal
//! front end.
//!
//! ## Module Organization
//!
//! ### Connection Module (`connection`)
//! Manages all client-server communication:
//! - TCP connection establishment
//! - Command encoding and notification decoding
//! - Splitting into independent read and write halves
//!
//! ### Command Module (`command`)
//! Parses terminal lines (`/register`, `/create`, `/join`, `/leave`,
//! `/start`, `/exit`, or a bare word) into protocol commands, and tracks the
//! player's name and current room from server replies.
//!
//! ### Display Module (`display`)
//! Renders every server notification as a single readable line.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::command::{Input, Prompt};
//! use client::connection::Connection;
//! use client::display::render;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = Connection::connect("127.0.0.1:65432").await?;
//!     let mut prompt = Prompt::new();
//!
//!     if let Input::Send(command) = prompt.parse("/register alice secret")? {
//!         connection.send(&command).await?;
//!     }
//!
//!     while let Some(message) = connection.recv().await? {
//!         prompt.observe(&message);
//!         println!("{}", render(&message));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod connection;
pub mod display;

/// Logger for the client binary. Filters come from `env` (normally
/// `RUST_LOG`) and fall back to `info`.
pub fn logger(env: env_logger::Env<'_>) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or("info"))
}
