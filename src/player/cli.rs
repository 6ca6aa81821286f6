#![cfg(feature = "std")]

use std::io::{self, BufRead};

use tokio::sync::mpsc::UnboundedSender;

use crate::core::{Symbol, BOARD_CELLS};
use crate::session::{Command, Update};
use crate::ui;

use super::Player;

/// Interactive player. Updates are printed as they arrive; commands come from
/// stdin through [`spawn_stdin_commands`], so `on_update` never answers.
#[derive(Debug, Default)]
pub struct CliPlayer {
    symbol: Option<Symbol>,
}

impl CliPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Player for CliPlayer {
    fn on_update(&mut self, update: &Update) -> Vec<Command> {
        if let Update::Started { symbol, .. } = update {
            self.symbol = Some(*symbol);
        }
        ui::print_update(update, self.symbol);
        if matches!(update, Update::Finished { .. } | Update::Left) {
            self.symbol = None;
        }
        Vec::new()
    }
}

/// Parse one line of user input: a cell number `1`-`9`, `r` for a rematch,
/// or `q` to leave.
pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim().to_ascii_lowercase();
    match input.as_str() {
        "" => Err("Empty input".to_string()),
        "r" | "rematch" | "play again" => Ok(Command::RequestRematch),
        "q" | "quit" | "leave" => Ok(Command::Quit),
        other => {
            let cell: usize = other
                .parse()
                .map_err(|_| format!("Unknown command '{}' - enter 1-9, r or q", other))?;
            if cell == 0 || cell > BOARD_CELLS {
                return Err(format!("Cell {} out of range - must be 1-9", cell));
            }
            Ok(Command::Play(cell - 1))
        }
    }
}

/// Read commands from stdin on a plain thread and forward them. End of input
/// counts as leaving the room.
pub fn spawn_stdin_commands(commands: UnboundedSender<Command>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Failed to read input: {}", e);
                    break;
                }
            };
            match parse_command(&line) {
                Ok(cmd) => {
                    if commands.send(cmd).is_err() || cmd == Command::Quit {
                        return;
                    }
                }
                Err(msg) => println!("{}", msg),
            }
        }
        let _ = commands.send(Command::Quit);
    })
}
