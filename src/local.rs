#![cfg(feature = "std")]

//! Two bots playing each other in-process over the in-memory signaling
//! layer. Used by the `local` subcommand and the `sim` binary.

use rand::{rngs::SmallRng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::SessionConfig;
use crate::core::{Outcome, RoomCode};
use crate::establish::{host_session, join_session};
use crate::peer_node::PeerNode;
use crate::player::{drive, AiPlayer};
use crate::signaling::InMemorySignaling;

/// Result of a local bot match, from the host's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub room: String,
    /// Outcome of every finished game, seen by the host.
    pub games: Vec<Outcome>,
    pub host_wins: usize,
    pub joiner_wins: usize,
    pub draws: usize,
    /// Set when the match ended before all games were played.
    pub aborted: Option<Outcome>,
}

impl MatchReport {
    fn new(room: RoomCode, games: Vec<Outcome>, aborted: Option<Outcome>) -> Self {
        let count = |o: Outcome| games.iter().filter(|g| **g == o).count();
        Self {
            room: room.to_string(),
            host_wins: count(Outcome::Win),
            joiner_wins: count(Outcome::Loss),
            draws: count(Outcome::Draw),
            games,
            aborted,
        }
    }
}

/// Play `games` games between two bots seeded with `host_seed` and
/// `joiner_seed`.
pub async fn run_local_match(
    games: usize,
    host_seed: u64,
    joiner_seed: u64,
    config: SessionConfig,
) -> anyhow::Result<MatchReport> {
    let signaling = InMemorySignaling::new();
    let mut host_rng = SmallRng::seed_from_u64(host_seed);
    let room_code = RoomCode::generate(&mut host_rng);
    let room = host_session(&signaling, Some(room_code), "Host bot", &config).await?;

    let (host_cmd_tx, mut host_cmd_rx) = mpsc::unbounded_channel();
    let (host_up_tx, host_up_rx) = mpsc::unbounded_channel();
    let mut host_node = PeerNode::host(room, config, host_rng, host_up_tx);
    let mut host_bot = AiPlayer::new(SmallRng::seed_from_u64(host_seed.wrapping_add(1)), games);

    let (joiner_cmd_tx, mut joiner_cmd_rx) = mpsc::unbounded_channel();
    let (joiner_up_tx, joiner_up_rx) = mpsc::unbounded_channel();
    let mut joiner_bot = AiPlayer::new(SmallRng::seed_from_u64(joiner_seed), games);

    let host = async {
        host_node.run(&mut host_cmd_rx).await?;
        Ok::<_, anyhow::Error>(())
    };
    let host_front = async {
        drive(&mut host_bot, host_up_rx, host_cmd_tx).await;
        Ok::<_, anyhow::Error>(())
    };
    let joiner = async {
        let opened = join_session(&signaling, room_code, "Joiner bot", &config).await?;
        let rng = SmallRng::seed_from_u64(joiner_seed.wrapping_add(1));
        let mut node = PeerNode::joiner(room_code, "Joiner bot", opened, config, rng, joiner_up_tx);
        node.run(&mut joiner_cmd_rx).await?;
        Ok::<_, anyhow::Error>(())
    };
    let joiner_front = async {
        drive(&mut joiner_bot, joiner_up_rx, joiner_cmd_tx).await;
        Ok::<_, anyhow::Error>(())
    };
    tokio::try_join!(host, host_front, joiner, joiner_front)?;

    let report = MatchReport::new(
        room_code,
        host_bot.results().to_vec(),
        host_bot.aborted().or(joiner_bot.aborted()),
    );
    log::info!(
        "Match in room {} done: host {} / joiner {} / draws {}",
        report.room,
        report.host_wins,
        report.joiner_wins,
        report.draws
    );
    Ok(report)
}
