//! Server network layer: TCP accept loop and per-connection tasks
//!
//! Each accepted connection gets two tasks. The reader runs the client's
//! `Session`; the writer drains the connection's outbox onto the socket.
//! When the writer fails, or a peer takes too long to accept a frame, the
//! writer drops its end of the outbox, which is how a broadcast later
//! notices the peer is gone.

use crate::game::Game;
use crate::hub::{peer_channel, ConnectionId, Inbox};
use crate::session::Session;
use log::{debug, error, info, warn};
use shared::write_frame;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinError;
use tokio::time::timeout;

/// Listening socket bound to the shared game state
pub struct Server {
    listener: TcpListener,
    game: Arc<Game>,
}

impl Server {
    pub async fn bind(addr: &str, game: Arc<Game>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server { listener, game })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn game(&self) -> &Arc<Game> {
        &self.game
    }

    /// Accepts connections until the task is dropped.
    pub async fn run(self) -> io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let game = Arc::clone(&self.game);
                    tokio::spawn(async move {
                        handle_connection(game, stream, addr).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

async fn handle_connection(game: Arc<Game>, stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
    }

    let (mut reader, writer) = stream.into_split();
    let (outbox, inbox) = peer_channel();
    let conn = game.connect(addr, outbox).await;

    let write_timeout = game.config().write_timeout;
    let mut writer_task = tokio::spawn(write_loop(conn, writer, inbox, write_timeout));

    // An evicted peer may never send again, so a finished writer also ends
    // the session.
    let mut session = Session::new(conn, addr, Arc::clone(&game));
    let writer_finished = tokio::select! {
        result = session.run(&mut reader) => {
            if let Err(e) = result {
                warn!("Session {} ended with error: {}", conn, e);
            }
            false
        }
        joined = &mut writer_task => {
            debug!("Writer for connection {} stopped, ending session", conn);
            log_writer_exit(conn, joined);
            true
        }
    };

    // Removing the peer drops the hub's outbox; the writer flushes what is
    // queued and then closes the socket.
    game.disconnect(conn).await;
    if !writer_finished {
        log_writer_exit(conn, writer_task.await);
    }
}

fn log_writer_exit(conn: ConnectionId, joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!("Writer task for connection {} panicked: {}", conn, e);
    }
}

/// Writes queued messages until the outbox closes, a write fails or a single
/// frame takes longer than `write_timeout`.
async fn write_loop<W>(conn: ConnectionId, mut writer: W, mut inbox: Inbox, write_timeout: Duration)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = inbox.recv().await {
        match timeout(write_timeout, write_frame(&mut writer, &message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Failed to send {} to connection {}: {}", message.kind(), conn, e);
                return;
            }
            Err(_) => {
                warn!(
                    "Connection {} did not accept {} within {:?}",
                    conn,
                    message.kind(),
                    write_timeout
                );
                return;
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of connection {} failed: {}", conn, e);
    }
}
