//! Live connection tracking and message fan-out
//!
//! This module keeps the server-side list of connected peers, including:
//! - Connection lifecycle (connect, name binding, removal)
//! - Per-peer outboxes drained by each connection's writer task
//! - Ordered delivery to a list of targets that survives dead peers
//!
//! Sending never touches a socket directly. Each peer owns a bounded
//! outbox whose receiving end is held by that peer's writer task; when the
//! writer gives up on a broken socket it drops the receiver and every later
//! send to that outbox fails. A peer that stops reading fills its outbox and
//! fails the same way. Such failures are reported back to the caller, which
//! evicts the peer from every collection that references it.

use crate::error::GameError;
use log::{debug, info, warn};
use shared::ServerMessage;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Server-assigned identifier of one connection
pub type ConnectionId = u32;

/// Messages a peer may have waiting before it counts as unreachable
pub const OUTBOX_CAPACITY: usize = 256;

/// Sending side of a peer's outbound message queue
pub type Outbox = mpsc::Sender<ServerMessage>;

/// Receiving side of a peer's outbound message queue, owned by its writer
pub type Inbox = mpsc::Receiver<ServerMessage>;

/// Creates the outbox/inbox pair for a new connection.
pub fn peer_channel() -> (Outbox, Inbox) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// A connected peer
#[derive(Debug)]
pub struct Peer {
    /// Unique connection identifier assigned by the hub
    pub id: ConnectionId,
    /// Remote address, for logging
    pub addr: SocketAddr,
    /// Player name once registration succeeded
    pub name: Option<String>,
    /// When the connection was accepted
    pub connected_at: Instant,
    outbox: Outbox,
}

impl Peer {
    pub fn new(id: ConnectionId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            name: None,
            connected_at: Instant::now(),
            outbox,
        }
    }
}

/// The global list of live connections.
///
/// Guarded by its own lock, independent of any room lock. The lock is only
/// held to copy outboxes out; no send ever happens while holding it.
pub struct SessionHub {
    peers: RwLock<HashMap<ConnectionId, Peer>>,
    next_id: AtomicU32,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Registers a new connection and returns its identifier
    pub async fn add_peer(&self, addr: SocketAddr, outbox: Outbox) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.peers
            .write()
            .await
            .insert(id, Peer::new(id, addr, outbox));
        info!("Connection {} opened from {}", id, addr);
        id
    }

    /// Removes a connection. Returns the peer if it was still present.
    ///
    /// Dropping the peer drops the hub's outbox, which lets the writer task
    /// finish once it has flushed what is already queued.
    pub async fn remove_peer(&self, id: ConnectionId) -> Option<Peer> {
        let removed = self.peers.write().await.remove(&id);
        if let Some(peer) = &removed {
            info!(
                "Connection {} from {} closed after {:?}",
                id,
                peer.addr,
                peer.connected_at.elapsed()
            );
        }
        removed
    }

    /// Binds an authenticated player name to a connection.
    ///
    /// Fails if the connection is gone or another live connection already
    /// plays under `name`. The check and the binding happen under one lock.
    pub async fn claim_name(&self, id: ConnectionId, name: &str) -> bool {
        let mut peers = self.peers.write().await;
        let taken = peers
            .values()
            .any(|peer| peer.id != id && peer.name.as_deref() == Some(name));
        if taken {
            debug!("Connection {} cannot play as {}: already connected", id, name);
            return false;
        }

        match peers.get_mut(&id) {
            Some(peer) => {
                peer.name = Some(name.to_string());
                true
            }
            None => false,
        }
    }

    pub async fn name_of(&self, id: ConnectionId) -> Option<String> {
        self.peers
            .read()
            .await
            .get(&id)
            .and_then(|peer| peer.name.clone())
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.peers.read().await.contains_key(&id)
    }

    /// All live connection ids in connection order
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.peers.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sends `message` to each target in order.
    ///
    /// Returns the targets that could not be reached: peers whose writer has
    /// shut down, peers with a full outbox and ids no longer in the hub. One
    /// failed peer never stops delivery to the rest.
    pub async fn deliver(
        &self,
        targets: &[ConnectionId],
        message: &ServerMessage,
    ) -> Vec<ConnectionId> {
        let outboxes: Vec<(ConnectionId, Option<Outbox>)> = {
            let peers = self.peers.read().await;
            targets
                .iter()
                .map(|id| (*id, peers.get(id).map(|peer| peer.outbox.clone())))
                .collect()
        };

        let mut unreachable = Vec::new();
        for (id, outbox) in outboxes {
            match push(id, outbox.as_ref(), message) {
                Ok(()) => debug!("Queued {} for connection {}", message.kind(), id),
                Err(e) => {
                    debug!("Skipping {}: {}", message.kind(), e);
                    unreachable.push(id);
                }
            }
        }

        unreachable
    }

    /// Returns the number of live connections
    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Returns true if nobody is connected
    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }
}

/// Queues one message without waiting for room in the outbox.
fn push(id: ConnectionId, outbox: Option<&Outbox>, message: &ServerMessage) -> Result<(), GameError> {
    let outbox = outbox.ok_or(GameError::PeerUnreachable(id))?;

    match outbox.try_send(message.clone()) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            warn!(
                "Connection {} has {} messages waiting, dropping it",
                id, OUTBOX_CAPACITY
            );
            Err(GameError::PeerUnreachable(id))
        }
        Err(TrySendError::Closed(_)) => {
            warn!("Connection {} is unreachable, dropping it", id);
            Err(GameError::PeerUnreachable(id))
        }
    }
}
