//! Length-prefixed frames
//!
//! Each frame is a little-endian `u32` length followed by that many bytes.
//! Lengths above [`MAX_FRAME_LEN`] are refused before anything is
//! allocated.

use anyhow::{bail, Result};
use floorplan_core::MAX_FRAME_LEN;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Send one frame
pub async fn send_frame<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> Result<()> {
    if data.len() > MAX_FRAME_LEN {
        bail!("Refusing to send frame of {} bytes", data.len());
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Receive one frame
pub async fn recv_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        bail!("Peer announced frame of {} bytes", len);
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    Ok(data)
}

/// Read frames on a dedicated task so callers can `select!` on the
/// receiver without ever abandoning a half-read frame.
///
/// The channel closes after the first read error (including a clean EOF).
pub fn spawn_frame_reader<R>(mut reader: R) -> mpsc::Receiver<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        loop {
            match recv_frame(&mut reader).await {
                Ok(frame) => {
                    if tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "frame reader stopped");
                    break;
                }
            }
        }
    });
    rx
}
