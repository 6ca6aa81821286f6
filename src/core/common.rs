//! Common types for tic-tac-toe: symbols, game outcomes and board errors.

use core::fmt;

/// Mark placed on the board by one of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The symbol played by the other side.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => f.write_str("X"),
            Symbol::O => f.write_str("O"),
        }
    }
}

/// How a game ended, seen from the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    /// The channel closed without a prior `quit`.
    OpponentDisconnected,
    /// The opponent left with an explicit `quit`.
    OpponentQuit,
    /// The host turned us away because another player already joined.
    OpponentRoomFull,
}

impl Outcome {
    /// Only games that were played to the end can be rematched.
    pub fn offers_rematch(self) -> bool {
        matches!(self, Outcome::Win | Outcome::Loss | Outcome::Draw)
    }

    /// Whether the opponent is gone and the game can never resume.
    pub fn is_abort(self) -> bool {
        !self.offers_rematch()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => f.write_str("You win!"),
            Outcome::Loss => f.write_str("You lose!"),
            Outcome::Draw => f.write_str("It's a draw!"),
            Outcome::OpponentDisconnected => f.write_str("Opponent has disconnected."),
            Outcome::OpponentQuit => f.write_str("Opponent has left the game."),
            Outcome::OpponentRoomFull => f.write_str("The room is already full."),
        }
    }
}

/// Errors returned by board and engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Cell index outside `0..9`.
    InvalidIndex,
    /// Cell already holds a symbol.
    Occupied,
    /// It is the opponent's turn.
    NotYourTurn,
    /// The game has already ended.
    GameOver,
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidIndex => write!(f, "Cell index is out of range"),
            BoardError::Occupied => write!(f, "Cell is already occupied"),
            BoardError::NotYourTurn => write!(f, "It is not your turn"),
            BoardError::GameOver => write!(f, "The game is already over"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
