#![cfg(feature = "std")]

use std::net::SocketAddr;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Message;
use crate::transport::frame::{write_frame, FrameReader, MAX_FRAME_SIZE};
use crate::transport::Transport;

/// Default timeout for a single send (30 seconds).
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Game channel over a direct TCP connection, one JSON message per frame.
pub struct TcpTransport {
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    send_timeout: Duration,
    max_frame_size: u32,
    peer: Option<SocketAddr>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_SEND_TIMEOUT, MAX_FRAME_SIZE)
    }

    pub fn with_config(stream: TcpStream, send_timeout: Duration, max_frame_size: u32) -> Self {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("Could not disable Nagle on game channel: {}", e);
        }
        let (read, write) = stream.into_split();
        Self {
            reader: FrameReader::new(read, max_frame_size),
            writer: write,
            send_timeout,
            max_frame_size,
            peer,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Address of the remote peer, when the socket still knows it.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let data = msg.encode()?;
        timeout(
            self.send_timeout,
            write_frame(&mut self.writer, &data, self.max_frame_size),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.send_timeout))?
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        let frame = self.reader.read_frame().await?;
        Ok(Message::decode(&frame))
    }
}
