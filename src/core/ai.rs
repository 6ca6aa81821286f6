//! Move selection for computer-controlled players.

use crate::core::{board::Board, common::Symbol, config::WIN_COMBINATIONS};
use rand::Rng;

const CENTER: usize = 4;

/// Cell that completes a line for `symbol`, if one exists.
pub fn completing_cell(board: &Board, symbol: Symbol) -> Option<usize> {
    WIN_COMBINATIONS.iter().find_map(|line| {
        let mut own = 0;
        let mut free = None;
        for &idx in line {
            match board.cells()[idx] {
                Some(s) if s == symbol => own += 1,
                Some(_) => return None,
                None => free = Some(idx),
            }
        }
        if own == 2 {
            free
        } else {
            None
        }
    })
}

/// Pick a cell for `me`: win if possible, else block, else take the centre,
/// else a random free cell. `None` when the board is full.
pub fn choose_cell<R: Rng + ?Sized>(board: &Board, me: Symbol, rng: &mut R) -> Option<usize> {
    if let Some(idx) = completing_cell(board, me) {
        return Some(idx);
    }
    if let Some(idx) = completing_cell(board, me.opponent()) {
        return Some(idx);
    }
    if board.is_empty_cell(CENTER) {
        return Some(CENTER);
    }
    random_cell(board, rng)
}

/// Uniformly random free cell.
pub fn random_cell<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    let free = board.empty_cells().count();
    if free == 0 {
        return None;
    }
    board.empty_cells().nth(rng.random_range(0..free))
}
