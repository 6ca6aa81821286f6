//! Messages exchanged between the two peers of a game.
//!
//! On the wire every message is a JSON object whose `type` field names the
//! variant, e.g. `{"type":"move","index":4,"symbol":"X"}`.

use crate::core::Symbol;
use serde::{Deserialize, Serialize};

/// Version carried by the connection-open frames.
pub const PROTOCOL_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// Joiner → host when the channel opens, carrying the joiner's username.
    Hello { version: u16, username: String },
    /// Host → joiner answer to `Hello`, carrying the host's username.
    HelloAck { version: u16, username: String },
    /// Host → joiner, once per game start: the joiner's symbol and turn.
    Start {
        symbol: Symbol,
        #[serde(rename = "startTurn")]
        start_turn: bool,
        #[serde(rename = "opponentName")]
        opponent_name: String,
    },
    /// A move just made by the sender.
    Move { index: u8, symbol: Symbol },
    /// The sender wants a rematch.
    PlayAgain,
    /// Host → joiner after a rematch `Start`.
    Restart,
    /// The sender is leaving.
    Quit,
    /// Host → a second connector that was turned away.
    RoomFull,
    /// Any message type this build does not understand.
    #[serde(other)]
    Unknown,
}

impl Message {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "hello",
            Message::HelloAck { .. } => "hello-ack",
            Message::Start { .. } => "start",
            Message::Move { .. } => "move",
            Message::PlayAgain => "play-again",
            Message::Restart => "restart",
            Message::Quit => "quit",
            Message::RoomFull => "room-full",
            Message::Unknown => "unknown",
        }
    }

    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))
    }

    /// Decode a payload. Anything that is not a well-formed message becomes
    /// [`Message::Unknown`] so that a bad frame never ends the session.
    pub fn decode(bytes: &[u8]) -> Message {
        match serde_json::from_slice(bytes) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Ignoring malformed message: {}", e);
                Message::Unknown
            }
        }
    }
}
