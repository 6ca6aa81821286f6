//! Signaling over TCP: a small rendezvous server maps room codes to the
//! host's game socket. The server never carries game traffic; the joiner
//! connects straight to the host once it has the address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::core::RoomCode;
use crate::signaling::{Listener, Signaling};
use crate::transport::frame::{write_frame, FrameReader};
use crate::transport::{tcp::TcpTransport, Transport};

/// Signaling frames are tiny; anything bigger is garbage.
const MAX_SIGNAL_FRAME: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalRequest {
    /// Claim a room; the registration lives as long as this connection.
    Register { room: RoomCode, addr: SocketAddr },
    /// Resolve a room to its host's address.
    Lookup { room: RoomCode },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalResponse {
    Registered,
    Taken,
    Found { addr: SocketAddr },
    NotFound,
}

async fn send_signal<W, T>(writer: &mut W, msg: &T) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data =
        bincode::serialize(msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
    write_frame(writer, &data, MAX_SIGNAL_FRAME).await
}

async fn recv_signal<R, T>(reader: &mut FrameReader<R>) -> anyhow::Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let frame = reader.read_frame().await?;
    bincode::deserialize(&frame).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
}

type Registry = Arc<Mutex<HashMap<RoomCode, SocketAddr>>>;

/// Rendezvous server run by the `signal` subcommand.
pub struct SignalServer {
    listener: TcpListener,
    rooms: Registry,
}

impl SignalServer {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            rooms: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve clients until the listener fails.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let rooms = self.rooms.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_client(stream, rooms).await {
                    log::debug!("Signaling client {} ended: {}", addr, e);
                }
            });
        }
    }
}

async fn serve_client(stream: TcpStream, rooms: Registry) -> anyhow::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = FrameReader::new(read, MAX_SIGNAL_FRAME);
    match recv_signal(&mut reader).await? {
        SignalRequest::Register { room, addr } => {
            let claimed = {
                let mut rooms = rooms
                    .lock()
                    .map_err(|_| anyhow::anyhow!("Room registry poisoned"))?;
                if rooms.contains_key(&room) {
                    false
                } else {
                    rooms.insert(room, addr);
                    true
                }
            };
            if !claimed {
                log::info!("Refused duplicate registration of room {}", room);
                return send_signal(&mut write, &SignalResponse::Taken).await;
            }
            log::info!("Room {} registered at {}", room, addr);
            let held = async {
                send_signal(&mut write, &SignalResponse::Registered).await?;
                // The host sends nothing more; the read ends when it hangs up.
                loop {
                    reader.read_frame().await?;
                }
            };
            let result: anyhow::Result<()> = held.await;
            if let Ok(mut rooms) = rooms.lock() {
                rooms.remove(&room);
            }
            log::info!("Room {} released", room);
            result
        }
        SignalRequest::Lookup { room } => {
            let found = rooms
                .lock()
                .map_err(|_| anyhow::anyhow!("Room registry poisoned"))?
                .get(&room)
                .copied();
            let reply = match found {
                Some(addr) => SignalResponse::Found { addr },
                None => SignalResponse::NotFound,
            };
            log::debug!("Lookup of room {}: {:?}", room, reply);
            send_signal(&mut write, &reply).await
        }
    }
}

/// Client side of [`SignalServer`].
#[derive(Clone, Debug)]
pub struct TcpSignaling {
    server: SocketAddr,
    listen: SocketAddr,
    advertise: Option<SocketAddr>,
}

impl TcpSignaling {
    /// `listen` is where a host accepts game channels (port 0 picks one).
    pub fn new(server: SocketAddr, listen: SocketAddr) -> Self {
        Self {
            server,
            listen,
            advertise: None,
        }
    }

    /// Address handed to joiners instead of the one derived from the sockets.
    pub fn with_advertise(mut self, addr: SocketAddr) -> Self {
        self.advertise = Some(addr);
        self
    }
}

#[async_trait::async_trait]
impl Signaling for TcpSignaling {
    async fn register(&self, room: RoomCode) -> anyhow::Result<Box<dyn Listener>> {
        let listener = TcpListener::bind(self.listen).await?;
        let local = listener.local_addr()?;
        let mut server = TcpStream::connect(self.server)
            .await
            .map_err(|e| anyhow::anyhow!("server-error: cannot reach signaling server: {}", e))?;
        let addr = match self.advertise {
            Some(addr) => addr,
            None if local.ip().is_unspecified() => {
                SocketAddr::new(server.local_addr()?.ip(), local.port())
            }
            None => local,
        };
        send_signal(&mut server, &SignalRequest::Register { room, addr }).await?;
        let reply = {
            let mut reader = FrameReader::new(&mut server, MAX_SIGNAL_FRAME);
            recv_signal::<_, SignalResponse>(&mut reader).await?
        };
        match reply {
            SignalResponse::Registered => {
                log::info!("Room {} registered, accepting at {}", room, addr);
                Ok(Box::new(TcpRoomListener {
                    room,
                    listener,
                    _registration: server,
                }))
            }
            SignalResponse::Taken => Err(anyhow::anyhow!(
                "unavailable-id: room {} is already taken",
                room
            )),
            other => Err(anyhow::anyhow!("Unexpected signaling reply: {:?}", other)),
        }
    }

    async fn connect(&self, room: RoomCode) -> anyhow::Result<Box<dyn Transport>> {
        let mut server = TcpStream::connect(self.server)
            .await
            .map_err(|e| anyhow::anyhow!("server-error: cannot reach signaling server: {}", e))?;
        send_signal(&mut server, &SignalRequest::Lookup { room }).await?;
        let reply = {
            let mut reader = FrameReader::new(&mut server, MAX_SIGNAL_FRAME);
            recv_signal::<_, SignalResponse>(&mut reader).await?
        };
        match reply {
            SignalResponse::Found { addr } => {
                log::debug!("Room {} resolved to {}", room, addr);
                let transport = TcpTransport::connect(addr).await.map_err(|e| {
                    anyhow::anyhow!("peer-unavailable: host of room {} unreachable: {}", room, e)
                })?;
                Ok(Box::new(transport))
            }
            SignalResponse::NotFound => Err(anyhow::anyhow!(
                "peer-unavailable: room {} does not exist",
                room
            )),
            other => Err(anyhow::anyhow!("Unexpected signaling reply: {:?}", other)),
        }
    }
}

struct TcpRoomListener {
    room: RoomCode,
    listener: TcpListener,
    // Closing this connection releases the room on the server.
    _registration: TcpStream,
}

#[async_trait::async_trait]
impl Listener for TcpRoomListener {
    async fn accept(&mut self) -> anyhow::Result<Box<dyn Transport>> {
        let (stream, addr) = self.listener.accept().await?;
        log::debug!("Inbound connection to room {} from {}", self.room, addr);
        Ok(Box::new(TcpTransport::new(stream)))
    }
}
