//! The 3x3 playing grid.
//!
//! This module contains:
//! - Player marks and cell contents
//! - The nine-cell grid (row-major, index 0 is top-left)
//! - The eight winning lines and line detection

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of cells on the grid
pub const CELL_COUNT: usize = 9;

/// Every line that wins the game: three rows, three columns, two diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The mark a seated player puts on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// The player who created the game
    One,
    /// The player who joined the game
    Two,
}

impl Mark {
    /// The opposing mark
    pub fn other(&self) -> Mark {
        match self {
            Mark::One => Mark::Two,
            Mark::Two => Mark::One,
        }
    }
}

/// Contents of a single grid cell.
///
/// Serialized as `0` (empty), `1` (player one) or `2` (player two).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    #[default]
    Empty,
    PlayerOne,
    PlayerTwo,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The mark in this cell, if any
    pub fn mark(&self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::PlayerOne => Some(Mark::One),
            Cell::PlayerTwo => Some(Mark::Two),
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::One => Cell::PlayerOne,
            Mark::Two => Cell::PlayerTwo,
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => 0,
            Cell::PlayerOne => 1,
            Cell::PlayerTwo => 2,
        }
    }
}

/// A cell value outside `0..=2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid cell value {0}, expected 0, 1 or 2")]
pub struct InvalidCellValue(pub u8);

impl TryFrom<u8> for Cell {
    type Error = InvalidCellValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::PlayerOne),
            2 => Ok(Cell::PlayerTwo),
            other => Err(InvalidCellValue(other)),
        }
    }
}

/// The nine cells of a game, serialized as a flat array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid([Cell; CELL_COUNT]);

impl Grid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.0
    }

    /// Get the cell at an index, `None` when out of range
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.0.get(index).copied()
    }

    /// Place a mark in an empty cell.
    ///
    /// Returns `false` and leaves the grid untouched if the index is out of
    /// range or the cell is already marked.
    pub(crate) fn place(&mut self, index: usize, mark: Mark) -> bool {
        match self.0.get_mut(index) {
            Some(cell) if cell.is_empty() => {
                *cell = mark.into();
                true
            }
            _ => false,
        }
    }

    /// True once no empty cell remains
    pub fn is_full(&self) -> bool {
        self.0.iter().all(|c| !c.is_empty())
    }

    /// Indices of all empty cells, in ascending order
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_empty())
            .map(|(i, _)| i)
    }

    /// Number of cells holding the given mark
    pub fn count(&self, mark: Mark) -> usize {
        self.0.iter().filter(|c| c.mark() == Some(mark)).count()
    }

    /// The first winning line (in [`WINNING_LINES`] order) completed by `mark`
    pub fn winning_line(&self, mark: Mark) -> Option<[usize; 3]> {
        let cell = Cell::from(mark);
        WINNING_LINES
            .iter()
            .find(|line| line.iter().all(|&i| self.0[i] == cell))
            .copied()
    }
}

impl TryFrom<[u8; CELL_COUNT]> for Grid {
    type Error = InvalidCellValue;

    fn try_from(values: [u8; CELL_COUNT]) -> Result<Self, Self::Error> {
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (cell, value) in cells.iter_mut().zip(values) {
            *cell = Cell::try_from(value)?;
        }
        Ok(Self(cells))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.0.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in cells {
                let c = match cell {
                    Cell::Empty => '.',
                    Cell::PlayerOne => 'X',
                    Cell::PlayerTwo => 'O',
                };
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
