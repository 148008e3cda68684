//! Length-prefixed bincode frames.
//!
//! ```text
//! +----------------+---------------------+
//! | length: u32 BE | payload: bincode    |
//! +----------------+---------------------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};

pub const FRAME_HEADER_SIZE: usize = 4;

/// Serializes `message` into one frame.
pub fn encode_frame<T: Serialize>(message: &T, max_frame_bytes: usize) -> Result<Bytes> {
    let payload = bincode::serialize(message)?;
    if payload.len() > max_frame_bytes || payload.len() > u32::MAX as usize {
        return Err(TransportError::FrameTooLarge {
            size: payload.len(),
            max_size: max_frame_bytes,
        });
    }
    let mut frame = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Takes one complete frame off the front of `buf`. [`read_frame`] decodes
/// through this once it has buffered a whole frame.
///
/// Returns `Ok(None)` and leaves `buf` untouched while the frame is still
/// incomplete.
pub fn decode_frame<T: DeserializeOwned>(
    buf: &mut BytesMut,
    max_frame_bytes: usize,
) -> Result<Option<T>> {
    if buf.len() < FRAME_HEADER_SIZE {
        return Ok(None);
    }
    let len = frame_len(buf);
    if len > max_frame_bytes {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max_size: max_frame_bytes,
        });
    }
    if buf.len() < FRAME_HEADER_SIZE + len {
        return Ok(None);
    }
    buf.advance(FRAME_HEADER_SIZE);
    let payload = buf.split_to(len);
    Ok(Some(bincode::deserialize(&payload)?))
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T, max_frame_bytes: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(message, max_frame_bytes)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_frame<R, T>(reader: &mut R, max_frame_bytes: usize) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut buf = BytesMut::zeroed(FRAME_HEADER_SIZE);
    if let Err(e) = reader.read_exact(&mut buf).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            _ => TransportError::Io(e),
        });
    }
    let len = frame_len(&buf);
    if len > max_frame_bytes {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max_size: max_frame_bytes,
        });
    }
    buf.resize(FRAME_HEADER_SIZE + len, 0);
    reader.read_exact(&mut buf[FRAME_HEADER_SIZE..]).await?;
    decode_frame(&mut buf, max_frame_bytes)?.ok_or(TransportError::ConnectionClosed)
}

/// Payload length announced by a frame header.
fn frame_len(header: &[u8]) -> usize {
    u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize
}
