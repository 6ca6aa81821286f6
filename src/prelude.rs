//! Commonly used types and utilities for ease of import.

pub use crate::core::{Board, GameEngine, GameStatus, Outcome, RoomCode, Symbol};
pub use crate::{
    host_session, join_session, AiPlayer, CliPlayer, Command, Player, PeerNode, Session,
    SessionConfig, SessionError, Update,
};
pub use crate::signaling::{InMemorySignaling, Signaling, TcpSignaling};
pub use crate::transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
