#![cfg(feature = "std")]

use std::time::Duration;

/// Joiner gives up if the channel is not open after this long.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Host gives up if the signaling layer has not confirmed the room by then.
pub const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(10);
/// Time a rejected second connector gets to read `room-full` before the close.
pub const DEFAULT_REJECT_GRACE: Duration = Duration::from_millis(500);
/// Delay between sending `quit` and dropping the channel.
pub const DEFAULT_QUIT_FLUSH: Duration = Duration::from_millis(100);
/// Host waits this long for an inbound channel's `hello`.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timing knobs for establishing and tearing down a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub connect_timeout: Duration,
    pub registration_timeout: Duration,
    pub reject_grace: Duration,
    pub quit_flush: Duration,
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            registration_timeout: DEFAULT_REGISTRATION_TIMEOUT,
            reject_grace: DEFAULT_REJECT_GRACE,
            quit_flush: DEFAULT_QUIT_FLUSH,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}
