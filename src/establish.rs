#![cfg(feature = "std")]

//! Session establishment: registering or joining a room and opening the
//! channel, including the username exchange and turning away extra joiners.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::SessionConfig;
use crate::core::RoomCode;
use crate::protocol::{Message, PROTOCOL_VERSION};
use crate::signaling::{Listener, Signaling};
use crate::transport::Transport;

/// Why a session could not be established. All of these end the attempt;
/// retrying is up to the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not connect to room {room} within {timeout:?}; check the room code and try again")]
    ConnectionTimeout { room: RoomCode, timeout: Duration },
    #[error("room registration timed out after {0:?}")]
    RegistrationTimeout(Duration),
    #[error("signaling error: {0}")]
    Signaling(String),
    #[error("room {0} is full")]
    RoomFull(RoomCode),
    #[error("protocol version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u16, got: u16 },
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("please enter a name")]
    EmptyUsername,
}

/// A channel that reached the open state, with the peer's username.
pub struct Opened {
    pub transport: Box<dyn Transport>,
    pub remote_username: String,
}

impl fmt::Debug for Opened {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opened")
            .field("remote_username", &self.remote_username)
            .finish_non_exhaustive()
    }
}

/// Trimmed username, or `EmptyUsername`.
pub fn validate_username(name: &str) -> Result<String, SessionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SessionError::EmptyUsername);
    }
    Ok(name.to_string())
}

/// Register a room, using `desired` or a freshly generated code. Inbound
/// channels are accepted and handshaked in the background from here on.
pub async fn host_session(
    signaling: &dyn Signaling,
    desired: Option<RoomCode>,
    local_username: &str,
    config: &SessionConfig,
) -> Result<HostedRoom, SessionError> {
    let local_username = validate_username(local_username)?;
    let room = desired.unwrap_or_else(|| RoomCode::generate(&mut rand::rng()));
    let listener = match timeout(config.registration_timeout, signaling.register(room)).await {
        Ok(Ok(listener)) => listener,
        Ok(Err(e)) => return Err(SessionError::Signaling(format!("{:#}", e))),
        Err(_) => return Err(SessionError::RegistrationTimeout(config.registration_timeout)),
    };
    log::info!("Hosting room {} as {}", room, local_username);
    let (tx, opened) = mpsc::channel(1);
    let acceptor = tokio::spawn(run_acceptor(
        listener,
        Candidate {
            room,
            local_username: local_username.clone(),
            claimed: Arc::new(AtomicBool::new(false)),
            winner: tx,
            config: *config,
        },
    ));
    Ok(HostedRoom {
        room,
        local_username,
        opened,
        accepted: false,
        acceptor,
    })
}

/// A registered room. Accepts exactly one opponent; everyone after that is
/// sent `room-full` and disconnected. Dropping it releases the room.
pub struct HostedRoom {
    room: RoomCode,
    local_username: String,
    opened: mpsc::Receiver<Opened>,
    accepted: bool,
    acceptor: JoinHandle<()>,
}

impl fmt::Debug for HostedRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedRoom")
            .field("room", &self.room)
            .field("local_username", &self.local_username)
            .field("accepted", &self.accepted)
            .finish()
    }
}

impl HostedRoom {
    pub fn code(&self) -> RoomCode {
        self.room
    }

    pub fn local_username(&self) -> &str {
        &self.local_username
    }

    /// Wait for the first inbound channel that completes the `hello`
    /// exchange. Cancel safe: dropping the future leaves any handshake in
    /// flight untouched.
    pub async fn accept_opponent(&mut self) -> Result<Opened, SessionError> {
        if self.accepted {
            return Err(SessionError::Handshake("opponent already accepted".into()));
        }
        let opened = self
            .opened
            .recv()
            .await
            .ok_or_else(|| SessionError::Signaling(format!("room {} stopped accepting", self.room)))?;
        self.accepted = true;
        log::info!("{} joined room {}", opened.remote_username, self.room);
        Ok(opened)
    }
}

impl Drop for HostedRoom {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

/// Shared state of the per-connection handshake tasks of one room.
#[derive(Clone)]
struct Candidate {
    room: RoomCode,
    local_username: String,
    /// Set by the first connection to finish the handshake.
    claimed: Arc<AtomicBool>,
    winner: mpsc::Sender<Opened>,
    config: SessionConfig,
}

/// Accept until the listener fails. Each connection is handshaked on its own
/// task, so a silent connector never holds up the next one.
async fn run_acceptor(mut listener: Box<dyn Listener>, candidate: Candidate) {
    loop {
        match listener.accept().await {
            Ok(transport) => {
                tokio::spawn(candidate.clone().handshake(transport));
            }
            Err(e) => {
                log::debug!("Stopped accepting on room {}: {:#}", candidate.room, e);
                break;
            }
        }
    }
}

impl Candidate {
    async fn handshake(self, mut transport: Box<dyn Transport>) {
        if self.claimed.load(Ordering::SeqCst) {
            log::info!("Room {} is full, turning away a connection", self.room);
            reject(transport, self.config.reject_grace).await;
            return;
        }
        let hello = timeout(self.config.handshake_timeout, transport.recv()).await;
        let username = match hello {
            Ok(Ok(Message::Hello { version, username })) if version == PROTOCOL_VERSION => username,
            Ok(Ok(Message::Hello { version, .. })) => {
                // Answer anyway so the joiner can report the mismatch.
                let _ = transport.send(self.ack()).await;
                log::warn!(
                    "Dropping inbound connection: {}",
                    SessionError::VersionMismatch {
                        expected: PROTOCOL_VERSION,
                        got: version
                    }
                );
                return;
            }
            Ok(Ok(other)) => {
                log::warn!("Dropping inbound connection: expected hello, got {}", other.kind());
                return;
            }
            Ok(Err(e)) => {
                log::warn!("Dropping inbound connection: {:#}", e);
                return;
            }
            Err(_) => {
                log::warn!(
                    "Dropping inbound connection: no hello within {:?}",
                    self.config.handshake_timeout
                );
                return;
            }
        };
        if self
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::info!("Room {} filled while {} was connecting", self.room, username);
            reject(transport, self.config.reject_grace).await;
            return;
        }
        if let Err(e) = transport.send(self.ack()).await {
            log::warn!("Lost {} before the handshake finished: {:#}", username, e);
            self.claimed.store(false, Ordering::SeqCst);
            return;
        }
        let opened = Opened {
            transport,
            remote_username: username,
        };
        if self.winner.send(opened).await.is_err() {
            log::debug!("Room {} was released before the opponent was taken", self.room);
        }
    }

    fn ack(&self) -> Message {
        Message::HelloAck {
            version: PROTOCOL_VERSION,
            username: self.local_username.clone(),
        }
    }
}

async fn reject(mut transport: Box<dyn Transport>, grace: Duration) {
    if let Err(e) = transport.send(Message::RoomFull).await {
        log::debug!("Could not send room-full: {:#}", e);
    }
    tokio::time::sleep(grace).await;
}

/// Open a channel to `room` and exchange usernames with its host. Signaling
/// failures surface at once; otherwise the attempt is bounded by
/// `config.connect_timeout`, and the deadline is dropped the moment the
/// channel opens.
pub async fn join_session(
    signaling: &dyn Signaling,
    room: RoomCode,
    local_username: &str,
    config: &SessionConfig,
) -> Result<Opened, SessionError> {
    let local_username = validate_username(local_username)?;
    let open = async {
        let mut transport = signaling
            .connect(room)
            .await
            .map_err(|e| SessionError::Signaling(format!("{:#}", e)))?;
        transport
            .send(Message::Hello {
                version: PROTOCOL_VERSION,
                username: local_username.clone(),
            })
            .await
            .map_err(|e| SessionError::Handshake(format!("{:#}", e)))?;
        let reply = transport
            .recv()
            .await
            .map_err(|e| SessionError::Handshake(format!("{:#}", e)))?;
        match reply {
            Message::HelloAck { version, username } if version == PROTOCOL_VERSION => Ok(Opened {
                transport,
                remote_username: username,
            }),
            Message::HelloAck { version, .. } => Err(SessionError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got: version,
            }),
            Message::RoomFull => Err(SessionError::RoomFull(room)),
            other => Err(SessionError::Handshake(format!(
                "expected hello-ack, got {}",
                other.kind()
            ))),
        }
    };
    match timeout(config.connect_timeout, open).await {
        Ok(Ok(opened)) => {
            log::info!("Joined room {}, host is {}", room, opened.remote_username);
            Ok(opened)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(SessionError::ConnectionTimeout {
            room,
            timeout: config.connect_timeout,
        }),
    }
}
