use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// A letter a player can place on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    S,
    O,
}

/// Square grid of cells. A cell holds `Some(letter)` once written and is
/// never overwritten until the whole board is reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Vec<Option<Letter>>>,
}

impl Board {
    pub fn empty(size: usize) -> Self {
        Board {
            size,
            cells: vec![vec![None; size]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Option<Letter>, GameError> {
        if row >= self.size || col >= self.size {
            return Err(GameError::OutOfBounds { row, col });
        }
        Ok(self.cells[row][col])
    }

    pub fn set(&mut self, row: usize, col: usize, letter: Letter) -> Result<(), GameError> {
        if row >= self.size || col >= self.size {
            return Err(GameError::OutOfBounds { row, col });
        }
        self.cells[row][col] = Some(letter);
        Ok(())
    }

    /// Signed-coordinate probe used by the line detector. Anything outside
    /// the grid reads as an empty cell.
    pub fn letter_at(&self, row: isize, col: isize) -> Option<Letter> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells[row][col]
    }

    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_some()))
    }
}
