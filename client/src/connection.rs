//! Client side of the TCP connection to the game server

use log::{debug, info};
use shared::{read_frame, write_frame, ClientCommand, FrameError, ServerMessage};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// A framed connection to the server.
pub struct Connection {
    reader: MessageReader,
    writer: CommandWriter,
}

impl Connection {
    pub async fn connect(addr: &str) -> Result<Self, FrameError> {
        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to {}", stream.peer_addr()?);

        let (reader, writer) = stream.into_split();
        Ok(Connection {
            reader: MessageReader { inner: reader },
            writer: CommandWriter { inner: writer },
        })
    }

    pub async fn send(&mut self, command: &ClientCommand) -> Result<(), FrameError> {
        self.writer.send(command).await
    }

    /// Next server message, or `None` once the server closed the connection.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, FrameError> {
        self.reader.recv().await
    }

    /// Splits the connection so reading and writing can happen from
    /// different branches of a `select!`.
    pub fn into_split(self) -> (MessageReader, CommandWriter) {
        (self.reader, self.writer)
    }
}

pub struct MessageReader {
    inner: OwnedReadHalf,
}

impl MessageReader {
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, FrameError> {
        let message = read_frame::<_, ServerMessage>(&mut self.inner).await?;
        if let Some(message) = &message {
            debug!("Received {}", message.kind());
        }
        Ok(message)
    }
}

pub struct CommandWriter {
    inner: OwnedWriteHalf,
}

impl CommandWriter {
    pub async fn send(&mut self, command: &ClientCommand) -> Result<(), FrameError> {
        debug!("Sending {}", command.kind());
        write_frame(&mut self.inner, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_send_and_receive_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let command: ClientCommand = read_frame(&mut stream).await.unwrap().unwrap();
            write_frame(&mut stream, &ServerMessage::info(command.kind()))
                .await
                .unwrap();
        });

        let mut connection = Connection::connect(&addr).await.unwrap();
        connection.send(&ClientCommand::Exit).await.unwrap();

        let reply = connection.recv().await.unwrap();
        assert_eq!(reply, Some(ServerMessage::info("exit")));

        server.await.unwrap();
        assert_eq!(connection.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(matches!(
            Connection::connect(&addr).await,
            Err(FrameError::Io(_))
        ));
    }
}
