#![cfg(feature = "std")]

//! Length-prefixed framing shared by the game channel and the signaling
//! protocol: a 4-byte big-endian length followed by the payload.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame payload (64 KiB). Game messages are a few dozen bytes.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

const LEN_PREFIX: usize = 4;

fn io_error(e: std::io::Error, what: &str) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::BrokenPipe => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("{} error: {}", what, e),
    }
}

/// Write one frame and flush it.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
    max_frame_size: u32,
) -> anyhow::Result<()> {
    if payload.len() as u64 > max_frame_size as u64 {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            payload.len(),
            max_frame_size
        ));
    }
    let len = (payload.len() as u32).to_be_bytes();
    writer.write_all(&len).await.map_err(|e| io_error(e, "Write"))?;
    writer.write_all(payload).await.map_err(|e| io_error(e, "Write"))?;
    writer.flush().await.map_err(|e| io_error(e, "Write"))?;
    Ok(())
}

/// Buffers partial reads between calls, so a `read_frame` future can be
/// dropped (e.g. by `tokio::select!`) without losing bytes.
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_frame_size: u32,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_frame_size: u32) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            max_frame_size,
        }
    }

    /// Split a complete frame off the front of the buffer, if there is one.
    fn take_frame(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        if self.buf.len() < LEN_PREFIX {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
        if len > self.max_frame_size {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                len,
                self.max_frame_size
            ));
        }
        if len == 0 {
            return Err(anyhow::anyhow!("Invalid message length: 0"));
        }
        let end = LEN_PREFIX + len as usize;
        if self.buf.len() < end {
            return Ok(None);
        }
        let payload = self.buf[LEN_PREFIX..end].to_vec();
        self.buf.drain(..end);
        Ok(Some(payload))
    }

    /// Read the next frame payload. Cancel safe.
    pub async fn read_frame(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(frame);
            }
            let n = self
                .inner
                .read(&mut chunk)
                .await
                .map_err(|e| io_error(e, "Read"))?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed by peer"));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
