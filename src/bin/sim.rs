use p2p_tictactoe::{run_local_match, SessionConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 && args.len() != 4 {
        eprintln!("Usage: {} <seed1> <seed2> [games]", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;
    let games: usize = match args.get(3) {
        Some(n) => n.parse()?,
        None => 1,
    };

    let report = run_local_match(games, seed1, seed2, SessionConfig::default()).await?;

    let winner = if report.host_wins > report.joiner_wins {
        Some("host")
    } else if report.joiner_wins > report.host_wins {
        Some("joiner")
    } else {
        None
    };

    let result = json!({
        "room": report.room,
        "games": report.games.iter().map(|o| format!("{:?}", o)).collect::<Vec<_>>(),
        "host_wins": report.host_wins,
        "joiner_wins": report.joiner_wins,
        "draws": report.draws,
        "aborted": report.aborted.map(|o| format!("{:?}", o)),
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
