#![cfg_attr(not(feature = "std"), no_std)]

//! Peer-to-peer tic-tac-toe: two peers meet through a six-character room
//! code, the host decides symbols and turn order, and both sides keep a
//! mirrored board in sync over a single reliable channel.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod core;

#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod establish;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod local;
#[cfg(feature = "std")]
pub mod peer_node;
#[cfg(feature = "std")]
pub mod player;
#[cfg(feature = "std")]
pub mod prelude;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod signaling;
#[cfg(feature = "std")]
pub mod transport;
#[cfg(feature = "std")]
pub mod ui;

pub use crate::core::*;

#[cfg(feature = "std")]
pub use config::SessionConfig;
#[cfg(feature = "std")]
pub use establish::{host_session, join_session, HostedRoom, Opened, SessionError};
#[cfg(feature = "std")]
pub use local::{run_local_match, MatchReport};
#[cfg(feature = "std")]
pub use logging::{init_logging, init_logging_with};
#[cfg(feature = "std")]
pub use peer_node::PeerNode;
#[cfg(feature = "std")]
pub use player::{drive, AiPlayer, CliPlayer, Player};
#[cfg(feature = "std")]
pub use protocol::{Message, PROTOCOL_VERSION};
#[cfg(feature = "std")]
pub use session::{Command, Effect, Event, Phase, Role, Session, Update};
#[cfg(feature = "std")]
pub use signaling::{InMemorySignaling, Listener, SignalServer, Signaling, TcpSignaling};
#[cfg(feature = "std")]
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
