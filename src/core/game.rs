use crate::core::{
    board::{Board, Verdict},
    common::{BoardError, Outcome, Symbol},
};

/// Current status of a game, relative to the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Over {
        outcome: Outcome,
        /// Winning combination, when the game ended on the board.
        line: Option<[usize; 3]>,
    },
}

/// Local mirror of a single game. Each peer owns one and keeps it in step
/// with the other through the message protocol.
pub struct GameEngine {
    board: Board,
    local_symbol: Symbol,
    local_turn: bool,
    status: GameStatus,
    rematch_local: bool,
    rematch_remote: bool,
}

impl GameEngine {
    /// Fresh game with an empty board.
    pub fn new(local_symbol: Symbol, local_turn: bool) -> Self {
        Self {
            board: Board::new(),
            local_symbol,
            local_turn,
            status: GameStatus::InProgress,
            rematch_local: false,
            rematch_remote: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn local_symbol(&self) -> Symbol {
        self.local_symbol
    }

    pub fn local_turn(&self) -> bool {
        self.local_turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, GameStatus::Over { .. })
    }

    /// Outcome of a finished game.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.status {
            GameStatus::Over { outcome, .. } => Some(outcome),
            GameStatus::InProgress => None,
        }
    }

    /// Play the local symbol at `index`. Rejected unless it is our turn,
    /// the cell is empty and the game is still running.
    pub fn play_local(&mut self, index: usize) -> Result<GameStatus, BoardError> {
        if self.is_over() {
            return Err(BoardError::GameOver);
        }
        if !self.local_turn {
            return Err(BoardError::NotYourTurn);
        }
        self.board.place(index, self.local_symbol)?;
        self.local_turn = false;
        Ok(self.evaluate())
    }

    /// Apply the opponent's move as received. The sender is trusted: no turn
    /// or occupancy check is made here.
    pub fn apply_remote(&mut self, index: usize, symbol: Symbol) -> Result<GameStatus, BoardError> {
        if self.is_over() {
            return Err(BoardError::GameOver);
        }
        self.board.overwrite(index, symbol)?;
        self.local_turn = true;
        Ok(self.evaluate())
    }

    fn evaluate(&mut self) -> GameStatus {
        self.status = match self.board.verdict() {
            Verdict::Won { symbol, line } => GameStatus::Over {
                outcome: if symbol == self.local_symbol {
                    Outcome::Win
                } else {
                    Outcome::Loss
                },
                line: Some(line),
            },
            Verdict::Draw => GameStatus::Over {
                outcome: Outcome::Draw,
                line: None,
            },
            Verdict::InProgress => GameStatus::InProgress,
        };
        if self.is_over() {
            self.local_turn = false;
        }
        self.status
    }

    /// End the game for a reason outside the board (quit, disconnect).
    /// A later abort replaces an earlier board result but never another abort.
    pub fn abort(&mut self, outcome: Outcome) -> bool {
        if let GameStatus::Over { outcome: prev, .. } = self.status {
            if prev.is_abort() {
                return false;
            }
        }
        self.status = GameStatus::Over { outcome, line: None };
        self.local_turn = false;
        self.rematch_local = false;
        self.rematch_remote = false;
        true
    }

    /// Whether a rematch may still be negotiated for this game.
    pub fn rematch_offered(&self) -> bool {
        self.outcome().is_some_and(Outcome::offers_rematch)
    }

    /// Record the local wish to play again. Returns `false` if nothing changed.
    pub fn request_rematch_local(&mut self) -> bool {
        if !self.rematch_offered() || self.rematch_local {
            return false;
        }
        self.rematch_local = true;
        true
    }

    /// Record the opponent's wish to play again.
    pub fn request_rematch_remote(&mut self) -> bool {
        if !self.rematch_offered() || self.rematch_remote {
            return false;
        }
        self.rematch_remote = true;
        true
    }

    pub fn rematch_requested_locally(&self) -> bool {
        self.rematch_local
    }

    pub fn rematch_requested_remotely(&self) -> bool {
        self.rematch_remote
    }

    /// Both sides asked for another game.
    pub fn rematch_agreed(&self) -> bool {
        self.rematch_local && self.rematch_remote
    }
}
