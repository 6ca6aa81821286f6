//! Rendezvous between the two peers: the host registers a room code and the
//! joiner opens a channel to it. Once the channel exists the signaling layer
//! is out of the picture.

use crate::core::RoomCode;
use crate::transport::Transport;

#[async_trait::async_trait]
pub trait Signaling: Send + Sync {
    /// Claim `room` and start accepting inbound channels for it. The room
    /// stays registered for as long as the returned listener is alive.
    async fn register(&self, room: RoomCode) -> anyhow::Result<Box<dyn Listener>>;

    /// Open a channel to the host of `room`. Fails straight away when the
    /// room does not exist or its host cannot be reached.
    async fn connect(&self, room: RoomCode) -> anyhow::Result<Box<dyn Transport>>;
}

/// Host side of a registered room.
#[async_trait::async_trait]
pub trait Listener: Send {
    /// Wait for the next inbound channel.
    async fn accept(&mut self) -> anyhow::Result<Box<dyn Transport>>;
}

pub mod in_memory;
pub mod tcp;

pub use in_memory::InMemorySignaling;
pub use tcp::{SignalServer, TcpSignaling};
