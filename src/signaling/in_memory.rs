use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::RoomCode;
use crate::signaling::{Listener, Signaling};
use crate::transport::{in_memory::InMemoryTransport, Transport};

type Rooms = Arc<Mutex<HashMap<RoomCode, UnboundedSender<InMemoryTransport>>>>;

/// Process-local signaling. Clones share one room registry, so two peers in
/// the same process can find each other.
#[derive(Clone, Default)]
pub struct InMemorySignaling {
    rooms: Rooms,
}

impl InMemorySignaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `room` currently has a live host.
    pub fn is_registered(&self, room: RoomCode) -> bool {
        self.rooms
            .lock()
            .map(|rooms| rooms.get(&room).is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl Signaling for InMemorySignaling {
    async fn register(&self, room: RoomCode) -> anyhow::Result<Box<dyn Listener>> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| anyhow::anyhow!("Signaling registry poisoned"))?;
        if rooms.get(&room).is_some_and(|tx| !tx.is_closed()) {
            return Err(anyhow::anyhow!("unavailable-id: room {} is already taken", room));
        }
        let (tx, rx) = unbounded_channel();
        rooms.insert(room, tx);
        log::debug!("Registered room {} in memory", room);
        Ok(Box::new(InMemoryListener {
            room,
            rx,
            rooms: self.rooms.clone(),
        }))
    }

    async fn connect(&self, room: RoomCode) -> anyhow::Result<Box<dyn Transport>> {
        let rooms = self
            .rooms
            .lock()
            .map_err(|_| anyhow::anyhow!("Signaling registry poisoned"))?;
        let host = rooms
            .get(&room)
            .ok_or_else(|| anyhow::anyhow!("peer-unavailable: room {} does not exist", room))?;
        let (local, remote) = InMemoryTransport::pair();
        host.send(remote)
            .map_err(|_| anyhow::anyhow!("peer-unavailable: host of room {} is gone", room))?;
        Ok(Box::new(local))
    }
}

struct InMemoryListener {
    room: RoomCode,
    rx: UnboundedReceiver<InMemoryTransport>,
    rooms: Rooms,
}

#[async_trait::async_trait]
impl Listener for InMemoryListener {
    async fn accept(&mut self) -> anyhow::Result<Box<dyn Transport>> {
        let transport = self
            .rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Room {} was unregistered", self.room))?;
        Ok(Box::new(transport))
    }
}

impl Drop for InMemoryListener {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(mut rooms) = self.rooms.lock() {
            if rooms.get(&self.room).is_some_and(|tx| tx.is_closed()) {
                rooms.remove(&self.room);
            }
        }
    }
}
