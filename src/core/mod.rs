//! Core tic-tac-toe rules (no_std compatible)
//!
//! This module contains the pure game logic: board, win detection, the
//! per-peer game mirror and room codes. It depends only on `rand` and can be
//! built without the networking stack.

pub mod ai;
pub mod board;
pub mod common;
pub mod config;
pub mod game;
pub mod room;

// Re-export commonly used types
pub use ai::{choose_cell, random_cell};
pub use board::{Board, Verdict};
pub use common::{BoardError, Outcome, Symbol};
pub use config::*;
pub use game::{GameEngine, GameStatus};
pub use room::{RoomCode, RoomCodeError};
