#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::net::SocketAddr;

#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use p2p_tictactoe::{
    host_session, init_logging, join_session, player::cli::spawn_stdin_commands,
    run_local_match, AiPlayer, CliPlayer, Command, PeerNode, Player, RoomCode, SessionConfig,
    SignalServer, TcpSignaling, Update,
};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum PlayerType {
    Human,
    Ai,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Run the rendezvous server that maps room codes to hosts.
    Signal {
        #[arg(long, default_value = "0.0.0.0:9000")]
        bind: String,
    },
    /// Create a room and wait for an opponent.
    Host {
        #[arg(long, default_value = "127.0.0.1:9000")]
        signal: SocketAddr,
        #[arg(long, default_value = "0.0.0.0:0", help = "Where to accept the game channel")]
        listen: SocketAddr,
        #[arg(long, help = "Address joiners should dial, if different from the detected one")]
        advertise: Option<SocketAddr>,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Room code to claim instead of a random one")]
        room: Option<String>,
        #[arg(long, value_enum, default_value_t = PlayerType::Human)]
        player: PlayerType,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1, help = "Games an AI player plays before leaving")]
        games: usize,
        #[arg(long, default_value_t = 10, help = "Seconds to wait for the room to be registered")]
        registration_timeout: u64,
    },
    /// Join an existing room by its code.
    Join {
        #[arg(long, default_value = "127.0.0.1:9000")]
        signal: SocketAddr,
        #[arg(long)]
        name: String,
        #[arg(long)]
        room: String,
        #[arg(long, value_enum, default_value_t = PlayerType::Human)]
        player: PlayerType,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1, help = "Games an AI player plays before leaving")]
        games: usize,
        #[arg(long, default_value_t = 15, help = "Seconds to wait for the channel to open")]
        connect_timeout: u64,
    },
    /// Two AI players on the local machine.
    Local {
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 3)]
        games: usize,
    },
}

#[cfg(feature = "std")]
fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => {
            let mut seed_rng = rand::rng();
            SmallRng::from_rng(&mut seed_rng)
        }
    }
}

#[cfg(feature = "std")]
fn parse_room(input: &str) -> anyhow::Result<RoomCode> {
    RoomCode::parse(input).map_err(|e| anyhow::anyhow!("Invalid room code '{}': {}", input, e))
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Signal { bind } => {
            let server = SignalServer::bind(&bind).await?;
            println!("Signaling server listening on {}", server.local_addr()?);
            server.run().await?;
        }
        Commands::Host {
            signal,
            listen,
            advertise,
            name,
            room,
            player,
            seed,
            games,
            registration_timeout,
        } => {
            if let Some(s) = seed {
                println!("Using fixed seed: {} (game will be reproducible)", s);
            }
            let desired = room.as_deref().map(parse_room).transpose()?;
            let mut signaling = TcpSignaling::new(signal, listen);
            if let Some(addr) = advertise {
                signaling = signaling.with_advertise(addr);
            }
            let config = SessionConfig {
                registration_timeout: Duration::from_secs(registration_timeout),
                ..SessionConfig::default()
            };
            let hosted = match host_session(&signaling, desired, &name, &config).await {
                Ok(hosted) => hosted,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };
            println!("Room code: {}", hosted.code());
            println!("Waiting for opponent to join...");

            let mut rng = make_rng(seed);
            let bot_rng = SmallRng::from_rng(&mut rng);
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
            let (up_tx, up_rx) = mpsc::unbounded_channel();
            let node = PeerNode::host(hosted, config, rng, up_tx);
            play(node, player, bot_rng, games, cmd_tx, cmd_rx, up_rx).await?;
        }
        Commands::Join {
            signal,
            name,
            room,
            player,
            seed,
            games,
            connect_timeout,
        } => {
            if let Some(s) = seed {
                println!("Using fixed seed: {} (game will be reproducible)", s);
            }
            let room = parse_room(&room)?;
            // Joiners never accept channels; the listen address is unused.
            let signaling = TcpSignaling::new(signal, SocketAddr::from(([0, 0, 0, 0], 0)));
            let config = SessionConfig {
                connect_timeout: Duration::from_secs(connect_timeout),
                ..SessionConfig::default()
            };
            println!("Connecting to room {}...", room);
            let opened = match join_session(&signaling, room, &name, &config).await {
                Ok(opened) => opened,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };
            println!("Connected! Playing against {}", opened.remote_username);

            let mut rng = make_rng(seed);
            let bot_rng = SmallRng::from_rng(&mut rng);
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
            let (up_tx, up_rx) = mpsc::unbounded_channel();
            let node = PeerNode::joiner(room, name.trim(), opened, config, rng, up_tx);
            play(node, player, bot_rng, games, cmd_tx, cmd_rx, up_rx).await?;
        }
        Commands::Local { seed, games } => {
            println!("Starting local AI vs AI match...");
            let seed = match seed {
                Some(s) => {
                    println!("Using fixed seed: {} (match will be reproducible)", s);
                    s
                }
                None => rand::random(),
            };
            let report =
                run_local_match(games, seed, seed.wrapping_add(1), SessionConfig::default())
                    .await?;
            println!("Room {}", report.room);
            for (i, outcome) in report.games.iter().enumerate() {
                println!("Game {}: host says \"{}\"", i + 1, outcome);
            }
            println!(
                "Host wins: {}, joiner wins: {}, draws: {}",
                report.host_wins, report.joiner_wins, report.draws
            );
            if let Some(outcome) = report.aborted {
                println!("Match cut short: {}", outcome);
            }
        }
    }
    Ok(())
}

/// Run the node and its front end side by side until the session is left.
#[cfg(feature = "std")]
async fn play(
    mut node: PeerNode<SmallRng>,
    player: PlayerType,
    bot_rng: SmallRng,
    games: usize,
    cmd_tx: UnboundedSender<Command>,
    mut cmd_rx: UnboundedReceiver<Command>,
    up_rx: UnboundedReceiver<Update>,
) -> anyhow::Result<()> {
    let mut front: Box<dyn Player> = match player {
        PlayerType::Human => {
            println!("Enter 1-9 to play a cell, 'r' for a rematch, 'q' to leave.");
            spawn_stdin_commands(cmd_tx.clone());
            Box::new(CliPlayer::new())
        }
        PlayerType::Ai => {
            println!("AI player selected.");
            Box::new(AiPlayer::new(bot_rng, games))
        }
    };
    let session = async {
        node.run(&mut cmd_rx).await?;
        Ok::<_, anyhow::Error>(())
    };
    let front_end = async {
        p2p_tictactoe::drive(front.as_mut(), up_rx, cmd_tx).await;
        Ok::<_, anyhow::Error>(())
    };
    tokio::try_join!(session, front_end)?;
    Ok(())
}
