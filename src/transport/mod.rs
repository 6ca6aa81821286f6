use crate::protocol::Message;

/// A reliable, ordered, point-to-point message channel between two peers.
///
/// `recv` returning an error means the channel is closed; implementations
/// must keep `recv` cancel safe so it can sit in a `tokio::select!`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<Message>;
}

#[cfg(feature = "std")]
pub mod frame;
#[cfg(feature = "std")]
pub mod in_memory;
#[cfg(feature = "std")]
pub mod tcp;
