use std::net::SocketAddr;
use std::time::Duration;

use p2p_tictactoe::{
    drive, host_session, join_session, AiPlayer, Outcome, PeerNode, RoomCode, SessionConfig,
    SessionError, SignalServer, TcpSignaling,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

async fn start_server() -> anyhow::Result<SocketAddr> {
    let server = SignalServer::bind("127.0.0.1:0").await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.run());
    Ok(addr)
}

fn signaling(server: SocketAddr) -> TcpSignaling {
    TcpSignaling::new(server, "127.0.0.1:0".parse().unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bots_play_over_tcp() -> anyhow::Result<()> {
    let server = start_server().await?;
    let config = SessionConfig::default();
    let code = RoomCode::parse("TCP001").unwrap();
    let host_signaling = signaling(server);
    let hosted = host_session(&host_signaling, Some(code), "Host", &config).await?;

    let (host_cmd, mut host_cmd_rx) = mpsc::unbounded_channel();
    let (host_up, host_up_rx) = mpsc::unbounded_channel();
    let mut host = PeerNode::host(hosted, config, SmallRng::seed_from_u64(1), host_up);
    let mut host_bot = AiPlayer::new(SmallRng::seed_from_u64(2), 2);
    let host_side = tokio::spawn(async move {
        let (node, _) = tokio::join!(host.run(&mut host_cmd_rx), drive(&mut host_bot, host_up_rx, host_cmd));
        node?;
        Ok::<_, anyhow::Error>(host_bot.results().to_vec())
    });

    let opened = join_session(&signaling(server), code, "Guest", &config).await?;
    assert_eq!(opened.remote_username, "Host");
    let (cmd, mut cmd_rx) = mpsc::unbounded_channel();
    let (up, up_rx) = mpsc::unbounded_channel();
    let mut joiner = PeerNode::joiner(code, "Guest", opened, config, SmallRng::seed_from_u64(3), up);
    let mut joiner_bot = AiPlayer::new(SmallRng::seed_from_u64(4), 2);
    let (node, _) = tokio::join!(joiner.run(&mut cmd_rx), drive(&mut joiner_bot, up_rx, cmd));
    node?;

    let host_results = tokio::time::timeout(Duration::from_secs(10), host_side).await???;
    assert_eq!(host_results.len(), 2);
    let mirrored: Vec<Outcome> = joiner_bot
        .results()
        .iter()
        .map(|o| match o {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            other => *other,
        })
        .collect();
    assert_eq!(host_results, mirrored);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_room_over_tcp() -> anyhow::Result<()> {
    let server = start_server().await?;
    let err = join_session(
        &signaling(server),
        RoomCode::parse("NONE00").unwrap(),
        "Guest",
        &SessionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SessionError::Signaling(ref msg) if msg.contains("peer-unavailable")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_room_is_released_when_host_leaves() -> anyhow::Result<()> {
    let server = start_server().await?;
    let config = SessionConfig::default();
    let code = RoomCode::parse("TCP002").unwrap();
    let first = host_session(&signaling(server), Some(code), "Host", &config).await?;
    let err = host_session(&signaling(server), Some(code), "Other", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Signaling(ref msg) if msg.contains("unavailable-id")));

    drop(first);
    // The server notices the hang-up asynchronously.
    let mut again = None;
    for _ in 0..50 {
        match host_session(&signaling(server), Some(code), "Other", &config).await {
            Ok(hosted) => {
                again = Some(hosted);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    assert!(again.is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_joiner_turned_away_over_tcp() -> anyhow::Result<()> {
    let server = start_server().await?;
    let config = SessionConfig::default();
    let code = RoomCode::parse("TCP003").unwrap();
    let host_signaling = signaling(server);
    let mut hosted = host_session(&host_signaling, Some(code), "Host", &config).await?;
    let join_signaling = signaling(server);
    let (accepted, joined) = tokio::join!(
        hosted.accept_opponent(),
        join_session(&join_signaling, code, "First", &config)
    );
    let (_accepted, _joined) = (accepted?, joined?);
    let err = join_session(&signaling(server), code, "Second", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::RoomFull(r) if r == code));
    Ok(())
}
