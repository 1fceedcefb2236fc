//! Length-prefixed framing for protocol messages
//!
//! Every frame is a 4-byte big-endian payload length followed by the
//! `bincode` encoding of one message. The length is checked against
//! `MAX_FRAME_SIZE` before any allocation so a corrupt prefix cannot make the
//! reader allocate unbounded memory.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted payload in bytes.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("frame too large: {0} bytes (max {MAX_FRAME_SIZE})")]
    TooLarge(usize),

    #[error("malformed payload: {0}")]
    Decode(bincode::Error),

    #[error("failed to encode payload: {0}")]
    Encode(bincode::Error),
}

/// Encodes `value` into a complete frame, length prefix included.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, FrameError> {
    let payload = bincode::serialize(value).map_err(FrameError::Encode)?;
    if payload.len() > MAX_FRAME_SIZE as usize {
        return Err(FrameError::TooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Encodes `value` and writes it as a single frame, flushing the writer.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(value)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads and decodes the next frame.
///
/// Returns `Ok(None)` when the stream ends before a length prefix, which is
/// how a peer that simply closes its socket looks from here.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, FrameError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(len as usize));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;

    bincode::deserialize(&payload)
        .map(Some)
        .map_err(FrameError::Decode)
}
