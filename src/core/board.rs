//! The nine-cell board and its win/draw evaluation.

use crate::core::common::{BoardError, Symbol};
use crate::core::config::{BOARD_CELLS, BOARD_SIDE, WIN_COMBINATIONS};
use core::fmt;

/// Result of evaluating a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// `symbol` holds all three cells of `line`.
    Won { symbol: Symbol, line: [usize; 3] },
    /// Every cell is taken and nobody won.
    Draw,
    InProgress,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    cells: [Option<Symbol>; BOARD_CELLS],
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_CELLS],
        }
    }

    pub fn cells(&self) -> &[Option<Symbol>; BOARD_CELLS] {
        &self.cells
    }

    /// Contents of a single cell, or `InvalidIndex`.
    pub fn get(&self, index: usize) -> Result<Option<Symbol>, BoardError> {
        self.cells.get(index).copied().ok_or(BoardError::InvalidIndex)
    }

    pub fn is_empty_cell(&self, index: usize) -> bool {
        matches!(self.get(index), Ok(None))
    }

    /// Place `symbol` on an empty cell.
    pub fn place(&mut self, index: usize, symbol: Symbol) -> Result<(), BoardError> {
        match self.get(index)? {
            Some(_) => Err(BoardError::Occupied),
            None => {
                self.cells[index] = Some(symbol);
                Ok(())
            }
        }
    }

    /// Write `symbol` at `index` regardless of what the cell holds.
    pub fn overwrite(&mut self, index: usize, symbol: Symbol) -> Result<(), BoardError> {
        let cell = self.cells.get_mut(index).ok_or(BoardError::InvalidIndex)?;
        *cell = Some(symbol);
        Ok(())
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells.iter().filter(|c| **c == Some(symbol)).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Indices of the cells still free, in ascending order.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
    }

    /// First win combination fully held by one symbol.
    pub fn winner(&self) -> Option<(Symbol, [usize; 3])> {
        WIN_COMBINATIONS.iter().find_map(|&[a, b, c]| {
            let s = self.cells[a]?;
            (self.cells[b] == Some(s) && self.cells[c] == Some(s)).then_some((s, [a, b, c]))
        })
    }

    /// Win takes precedence over a full board.
    pub fn verdict(&self) -> Verdict {
        if let Some((symbol, line)) = self.winner() {
            Verdict::Won { symbol, line }
        } else if self.is_full() {
            Verdict::Draw
        } else {
            Verdict::InProgress
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIDE {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            for col in 0..BOARD_SIDE {
                let idx = row * BOARD_SIDE + col;
                if col > 0 {
                    f.write_str("|")?;
                }
                match self.cells[idx] {
                    Some(s) => write!(f, " {} ", s)?,
                    None => write!(f, " {} ", idx + 1)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
