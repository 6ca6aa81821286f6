#![cfg(feature = "std")]

//! Text rendering of boards and session updates for the terminal front end.

use std::fmt::Write as _;

use crate::core::{Board, Symbol, BOARD_SIDE};
use crate::session::Update;

/// Turn indicator, e.g. `Your turn (X)` or `Opponent's turn (O)`.
pub fn status_line(local: Symbol, my_turn: bool) -> String {
    if my_turn {
        format!("Your turn ({})", local)
    } else {
        format!("Opponent's turn ({})", local.opponent())
    }
}

/// Board as a 3x3 grid. Empty cells show their number (1-9); cells on the
/// winning `line` are bracketed.
pub fn render_board(board: &Board, line: Option<[usize; 3]>) -> String {
    let mut out = String::new();
    for row in 0..BOARD_SIDE {
        if row > 0 {
            out.push_str("   ---+---+---\n");
        }
        out.push_str("   ");
        for col in 0..BOARD_SIDE {
            let idx = row * BOARD_SIDE + col;
            if col > 0 {
                out.push('|');
            }
            let highlighted = line.is_some_and(|l| l.contains(&idx));
            let _ = match (board.cells()[idx], highlighted) {
                (Some(s), true) => write!(out, "[{}]", s),
                (Some(s), false) => write!(out, " {} ", s),
                (None, _) => write!(out, " {} ", idx + 1),
            };
        }
        out.push('\n');
    }
    out
}

/// One-line summary of an update. `local` is our symbol in the current game,
/// when one is running.
pub fn describe(update: &Update, local: Option<Symbol>) -> String {
    match update {
        Update::Started {
            symbol,
            my_turn,
            opponent,
        } => format!(
            "New game against {}. You play {}. {}",
            if opponent.is_empty() { "your opponent" } else { opponent },
            symbol,
            status_line(*symbol, *my_turn)
        ),
        Update::Moved {
            index,
            symbol,
            my_turn,
            ..
        } => {
            let mut text = format!("{} played cell {}.", symbol, index + 1);
            if let Some(local) = local {
                text.push(' ');
                text.push_str(&status_line(local, *my_turn));
            }
            text
        }
        Update::Finished {
            outcome,
            rematch_offered,
            ..
        } => {
            if *rematch_offered {
                format!("{} Type 'r' for a rematch or 'q' to leave.", outcome)
            } else {
                format!("{} Type 'q' to leave.", outcome)
            }
        }
        Update::OpponentWantsRematch => "Opponent wants a rematch! Type 'r' to accept.".into(),
        Update::AwaitingRematch => "Waiting for opponent to accept the rematch...".into(),
        Update::Left => "You left the room.".into(),
    }
}

/// Print an update the way the interactive player shows it.
pub fn print_update(update: &Update, local: Option<Symbol>) {
    match update {
        Update::Moved { board, .. } => {
            println!();
            print!("{}", render_board(board, None));
        }
        Update::Finished { board, line, .. } => {
            println!();
            print!("{}", render_board(board, *line));
        }
        Update::Started { .. } => {
            println!();
            print!("{}", render_board(&Board::new(), None));
        }
        _ => {}
    }
    println!("{}", describe(update, local));
}
