//! Short human-shareable room codes used to rendezvous through signaling.

use crate::core::config::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use core::fmt;
use core::str::FromStr;
use rand::Rng;

/// Six characters drawn from `[A-Z0-9]`.
///
/// Serialized as its string form and validated with [`RoomCode::parse`] on
/// the way in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct RoomCode([u8; ROOM_CODE_LEN]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCodeError {
    /// Code does not have exactly six characters.
    InvalidLength(usize),
    /// Character outside `[A-Z0-9]` after upper-casing.
    InvalidChar(char),
}

impl fmt::Display for RoomCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomCodeError::InvalidLength(len) => write!(
                f,
                "Room code must be {} characters, got {}",
                ROOM_CODE_LEN, len
            ),
            RoomCodeError::InvalidChar(c) => {
                write!(f, "Invalid character '{}' in room code - use A-Z and 0-9", c)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RoomCodeError {}

impl RoomCode {
    /// Draw a uniformly random code. Collisions are not checked; a failed
    /// registration is the caller's cue to try another.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut code = [0u8; ROOM_CODE_LEN];
        for b in code.iter_mut() {
            *b = ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())];
        }
        Self(code)
    }

    /// Parse user input, case-insensitively and ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, RoomCodeError> {
        let input = input.trim();
        let len = input.chars().count();
        if len != ROOM_CODE_LEN {
            return Err(RoomCodeError::InvalidLength(len));
        }
        let mut code = [0u8; ROOM_CODE_LEN];
        for (slot, ch) in code.iter_mut().zip(input.chars()) {
            let up = ch.to_ascii_uppercase();
            if !up.is_ascii() || !ROOM_CODE_ALPHABET.contains(&(up as u8)) {
                return Err(RoomCodeError::InvalidChar(ch));
            }
            *slot = up as u8;
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII from the alphabet is ever stored.
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "std")]
impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

#[cfg(feature = "std")]
impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
