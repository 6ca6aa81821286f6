//! Player trait and implementations
//!
//! A player is the front end of a session: it watches the [`Update`]s the
//! session emits and answers with [`Command`]s.
//! - AiPlayer: computer opponent that plays a fixed number of games
//! - CliPlayer: interactive command-line player

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::session::{Command, Update};

/// Interface implemented by different player types.
pub trait Player: Send {
    /// React to one session update. Returned commands go to the session in
    /// order.
    fn on_update(&mut self, update: &Update) -> Vec<Command>;
}

/// Feed session updates to `player` and forward its commands until the
/// session is left or either channel closes.
pub async fn drive<P: Player + ?Sized>(
    player: &mut P,
    mut updates: UnboundedReceiver<Update>,
    commands: UnboundedSender<Command>,
) {
    while let Some(update) = updates.recv().await {
        for cmd in player.on_update(&update) {
            if commands.send(cmd).is_err() {
                return;
            }
        }
        if update == Update::Left {
            break;
        }
    }
}

pub mod ai;
pub use ai::AiPlayer;

pub mod cli;
pub use cli::CliPlayer;
