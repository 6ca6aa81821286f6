use rand::rngs::SmallRng;

use crate::core::{ai, Board, Outcome, Symbol};
use crate::session::{Command, Update};

use super::Player;

/// Computer player. Plays `games` games, asking for a rematch after each
/// one, then quits.
pub struct AiPlayer {
    rng: SmallRng,
    games: usize,
    symbol: Option<Symbol>,
    results: Vec<Outcome>,
    aborted: Option<Outcome>,
    quitting: bool,
}

impl AiPlayer {
    pub fn new(rng: SmallRng, games: usize) -> Self {
        Self {
            rng,
            games: games.max(1),
            symbol: None,
            results: Vec::new(),
            aborted: None,
            quitting: false,
        }
    }

    /// Outcomes of the games that were played to the end, in order.
    pub fn results(&self) -> &[Outcome] {
        &self.results
    }

    /// Why the session was cut short, if it was.
    pub fn aborted(&self) -> Option<Outcome> {
        self.aborted
    }

    fn pick(&mut self, board: &Board) -> Vec<Command> {
        let Some(symbol) = self.symbol else {
            return Vec::new();
        };
        ai::choose_cell(board, symbol, &mut self.rng)
            .map(Command::Play)
            .into_iter()
            .collect()
    }

    fn quit(&mut self) -> Vec<Command> {
        if self.quitting {
            return Vec::new();
        }
        self.quitting = true;
        vec![Command::Quit]
    }
}

impl Player for AiPlayer {
    fn on_update(&mut self, update: &Update) -> Vec<Command> {
        match update {
            Update::Started { symbol, my_turn, .. } => {
                self.symbol = Some(*symbol);
                if *my_turn {
                    self.pick(&Board::new())
                } else {
                    Vec::new()
                }
            }
            Update::Moved {
                board,
                my_turn: true,
                ..
            } => self.pick(board),
            Update::Finished {
                outcome,
                rematch_offered,
                ..
            } => {
                if outcome.is_abort() {
                    if self.results.len() < self.games {
                        self.aborted = Some(*outcome);
                    }
                    return self.quit();
                }
                self.results.push(*outcome);
                if *rematch_offered && self.results.len() < self.games {
                    vec![Command::RequestRematch]
                } else {
                    self.quit()
                }
            }
            _ => Vec::new(),
        }
    }
}
