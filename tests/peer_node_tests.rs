use std::time::Duration;

use p2p_tictactoe::{
    host_session, join_session, run_local_match, Command, InMemorySignaling, Message, Outcome,
    PeerNode, Phase, RoomCode, SessionConfig, Signaling, Transport, Update, PROTOCOL_VERSION,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread")]
async fn test_bots_play_a_full_match() -> anyhow::Result<()> {
    let report = run_local_match(5, 11, 22, SessionConfig::default()).await?;
    assert_eq!(report.games.len(), 5);
    assert_eq!(report.host_wins + report.joiner_wins + report.draws, 5);
    assert!(report.games.iter().all(|o| o.offers_rematch()));
    assert_eq!(report.aborted, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_same_seeds_same_match() -> anyhow::Result<()> {
    let a = run_local_match(3, 5, 6, SessionConfig::default()).await?;
    let b = run_local_match(3, 5, 6, SessionConfig::default()).await?;
    assert_eq!(a, b);
    Ok(())
}

async fn next_update(rx: &mut UnboundedReceiver<Update>) -> Update {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no update in time")
        .expect("update channel closed")
}

async fn wait_for<F: Fn(&Update) -> bool>(rx: &mut UnboundedReceiver<Update>, f: F) -> Update {
    loop {
        let update = next_update(rx).await;
        if f(&update) {
            return update;
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_quit_reaches_the_other_side() -> anyhow::Result<()> {
    let signaling = InMemorySignaling::new();
    let config = SessionConfig::default();
    let code = RoomCode::parse("QUIT01").unwrap();
    let hosted = host_session(&signaling, Some(code), "Host", &config).await?;

    let (host_cmd, mut host_cmd_rx) = mpsc::unbounded_channel();
    let (host_up, mut host_updates) = mpsc::unbounded_channel();
    let mut host = PeerNode::host(hosted, config, SmallRng::seed_from_u64(1), host_up);
    let host_task = tokio::spawn(async move {
        host.run(&mut host_cmd_rx).await?;
        Ok::<_, anyhow::Error>(host.session().phase())
    });

    let opened = join_session(&signaling, code, "Guest", &config).await?;
    let (joiner_cmd, mut joiner_cmd_rx) = mpsc::unbounded_channel();
    let (joiner_up, mut joiner_updates) = mpsc::unbounded_channel();
    let mut joiner = PeerNode::joiner(
        code,
        "Guest",
        opened,
        config,
        SmallRng::seed_from_u64(2),
        joiner_up,
    );
    let joiner_task = tokio::spawn(async move {
        joiner.run(&mut joiner_cmd_rx).await?;
        Ok::<_, anyhow::Error>(joiner.session().phase())
    });

    let host_start = wait_for(&mut host_updates, |u| matches!(u, Update::Started { .. })).await;
    let joiner_start = wait_for(&mut joiner_updates, |u| matches!(u, Update::Started { .. })).await;
    let (Update::Started { symbol: hs, my_turn: host_turn, opponent: host_opp }, Update::Started { symbol: js, my_turn: joiner_turn, opponent: joiner_opp }) =
        (host_start, joiner_start)
    else {
        unreachable!()
    };
    assert_eq!(hs.opponent(), js);
    assert_ne!(host_turn, joiner_turn);
    assert_eq!(host_opp, "Guest");
    assert_eq!(joiner_opp, "Host");

    // Whoever moves first takes the centre; both sides see it.
    let mover = if host_turn { &host_cmd } else { &joiner_cmd };
    mover.send(Command::Play(4))?;
    let moved = |u: &Update| matches!(u, Update::Moved { index: 4, .. });
    wait_for(&mut host_updates, moved).await;
    wait_for(&mut joiner_updates, moved).await;

    joiner_cmd.send(Command::Quit)?;
    assert_eq!(
        wait_for(&mut joiner_updates, |u| *u == Update::Left).await,
        Update::Left
    );
    let finished = wait_for(&mut host_updates, |u| matches!(u, Update::Finished { .. })).await;
    assert!(matches!(
        finished,
        Update::Finished {
            outcome: Outcome::OpponentQuit,
            rematch_offered: false,
            ..
        }
    ));
    assert_eq!(joiner_task.await??, Phase::Idle);

    // The host stays on the result screen until it leaves too.
    host_cmd.send(Command::Quit)?;
    assert_eq!(host_task.await??, Phase::Idle);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dropped_channel_reports_disconnect() -> anyhow::Result<()> {
    let signaling = InMemorySignaling::new();
    let config = SessionConfig::default();
    let code = RoomCode::parse("DROP01").unwrap();
    let mut hosted = host_session(&signaling, Some(code), "Host", &config).await?;

    let (accepted, joined) = tokio::join!(
        hosted.accept_opponent(),
        join_session(&signaling, code, "Guest", &config)
    );
    // The host side vanishes without a quit.
    drop(accepted?);
    drop(hosted);

    let (_cmd, mut cmd_rx) = mpsc::unbounded_channel();
    let (up, mut updates) = mpsc::unbounded_channel();
    let mut joiner = PeerNode::joiner(code, "Guest", joined?, config, SmallRng::seed_from_u64(3), up);
    let task = tokio::spawn(async move { joiner.run(&mut cmd_rx).await });

    let finished = next_update(&mut updates).await;
    assert!(matches!(
        finished,
        Update::Finished {
            outcome: Outcome::OpponentDisconnected,
            ..
        }
    ));
    task.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_host_can_leave_before_anyone_joins() -> anyhow::Result<()> {
    let signaling = InMemorySignaling::new();
    let config = SessionConfig::default();
    let code = RoomCode::parse("EMPTY1").unwrap();
    let hosted = host_session(&signaling, Some(code), "Host", &config).await?;
    let (cmd, mut cmd_rx) = mpsc::unbounded_channel();
    let (up, mut updates) = mpsc::unbounded_channel();
    let mut host = PeerNode::host(hosted, config, SmallRng::seed_from_u64(4), up);
    cmd.send(Command::Quit)?;
    host.run(&mut cmd_rx).await?;
    assert!(host.session().is_idle());
    assert_eq!(next_update(&mut updates).await, Update::Left);
    drop(host);
    let mut released = false;
    for _ in 0..50 {
        if !signaling.is_registered(code) {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(released);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_local_command_during_handshake_keeps_the_joiner() -> anyhow::Result<()> {
    let signaling = InMemorySignaling::new();
    let config = SessionConfig::default();
    let code = RoomCode::parse("HAND01").unwrap();
    let hosted = host_session(&signaling, Some(code), "Host", &config).await?;

    let (cmd, mut cmd_rx) = mpsc::unbounded_channel();
    let (up, mut updates) = mpsc::unbounded_channel();
    let mut host = PeerNode::host(hosted, config, SmallRng::seed_from_u64(5), up);
    let host_task = tokio::spawn(async move { host.run(&mut cmd_rx).await });

    let mut joiner = signaling.connect(code).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Ignored while nobody has joined, but it wakes the host loop.
    cmd.send(Command::Play(0))?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    joiner
        .send(Message::Hello {
            version: PROTOCOL_VERSION,
            username: "Guest".into(),
        })
        .await?;
    let reply = timeout(Duration::from_secs(5), joiner.recv()).await??;
    assert!(matches!(reply, Message::HelloAck { ref username, .. } if username == "Host"));
    assert!(matches!(
        timeout(Duration::from_secs(5), joiner.recv()).await??,
        Message::Start { .. }
    ));
    assert!(matches!(next_update(&mut updates).await, Update::Started { .. }));

    cmd.send(Command::Quit)?;
    host_task.await??;
    Ok(())
}
