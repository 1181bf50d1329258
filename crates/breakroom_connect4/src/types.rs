//! Core domain types for Connect Four.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Default number of rows.
pub const DEFAULT_ROWS: usize = 6;

/// Default number of columns.
pub const DEFAULT_COLS: usize = 7;

/// A player's piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Piece {
    /// First player (moves first).
    #[display("1")]
    Player1,
    /// Second player.
    #[display("2")]
    Player2,
}

impl Piece {
    /// Returns the other player's piece.
    pub fn opponent(self) -> Self {
        match self {
            Piece::Player1 => Piece::Player2,
            Piece::Player2 => Piece::Player1,
        }
    }
}

/// A single cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// No piece.
    Empty,
    /// Cell holds a piece.
    Occupied(Piece),
}

impl Cell {
    /// Returns the piece in this cell, if any.
    pub fn piece(self) -> Option<Piece> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(piece) => Some(piece),
        }
    }
}

/// Zero-based grid coordinate. Row 0 is the top of the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("({row}, {col})")]
pub struct Coord {
    /// Row index, top to bottom.
    pub row: usize,
    /// Column index, left to right.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A column as chosen by a player.
///
/// Players address columns starting at 1; the board works with the zero-based
/// index this type stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{}", _0 + 1)]
pub struct Column(usize);

impl Column {
    /// Creates a column from the 1-based number shown on the buttons.
    ///
    /// Returns `None` for 0, which no button carries.
    #[instrument]
    pub fn from_one_based(number: usize) -> Option<Self> {
        number.checked_sub(1).map(Self)
    }

    /// Creates a column from a zero-based index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Zero-based index.
    pub fn index(self) -> usize {
        self.0
    }

    /// 1-based number.
    pub fn one_based(self) -> usize {
        self.0 + 1
    }
}

/// Errors constructing a board.
#[derive(Debug, Clone, PartialEq, Eq, Display, derive_more::Error)]
#[display("Board must have at least one row and one column (got {rows}x{cols})")]
pub struct InvalidDimensions {
    /// Requested rows.
    pub rows: usize,
    /// Requested columns.
    pub cols: usize,
}

/// A stored board whose cells do not fill its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Display, derive_more::Error)]
#[display("Board of {rows}x{cols} cannot hold {cells} cells")]
pub struct MalformedBoard {
    /// Declared rows.
    pub rows: usize,
    /// Declared columns.
    pub cols: usize,
    /// Cells actually present.
    pub cells: usize,
}

/// Connect Four grid in row-major order.
///
/// Deserialization checks that the cells fill the declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredBoard")]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

#[derive(Deserialize)]
struct StoredBoard {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl TryFrom<StoredBoard> for Board {
    type Error = MalformedBoard;

    fn try_from(stored: StoredBoard) -> Result<Self, Self::Error> {
        let StoredBoard { rows, cols, cells } = stored;
        if rows == 0 || cols == 0 || rows.checked_mul(cols) != Some(cells.len()) {
            return Err(MalformedBoard {
                rows,
                cols,
                cells: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
    }
}

impl Board {
    /// Creates an empty board.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDimensions`] when either dimension is zero.
    #[instrument]
    pub fn new(rows: usize, cols: usize) -> Result<Self, InvalidDimensions> {
        if rows == 0 || cols == 0 {
            return Err(InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the cell at `coord`, or `None` off the board.
    pub fn get(&self, coord: Coord) -> Option<Cell> {
        if coord.row >= self.rows || coord.col >= self.cols {
            return None;
        }
        self.cells.get(coord.row * self.cols + coord.col).copied()
    }

    /// Returns the cell at a signed position, `None` when off the board.
    ///
    /// Walks during win detection step into negative indices; they must
    /// never wrap around to another row.
    pub(crate) fn get_signed(&self, row: isize, col: isize) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.get(Coord::new(row as usize, col as usize))
    }

    /// Writes a cell. Out-of-range coordinates are ignored.
    pub(crate) fn set(&mut self, coord: Coord, cell: Cell) {
        if coord.row >= self.rows || coord.col >= self.cols {
            return;
        }
        if let Some(slot) = self.cells.get_mut(coord.row * self.cols + coord.col) {
            *slot = cell;
        }
    }

    /// Iterates rows top to bottom.
    pub fn row_slices(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols)
    }

    /// The top row of the board.
    pub fn top_row(&self) -> &[Cell] {
        self.cells.get(..self.cols).unwrap_or(&[])
    }

    /// Whether the column cannot take another piece.
    pub fn is_column_full(&self, column: Column) -> bool {
        !matches!(self.get(Coord::new(0, column.index())), Some(Cell::Empty))
    }

    /// Finds the most recently placed piece in a column: the topmost occupied cell.
    pub fn topmost_piece(&self, column: Column) -> Option<Coord> {
        (0..self.rows)
            .map(|row| Coord::new(row, column.index()))
            .find(|coord| matches!(self.get(*coord), Some(Cell::Occupied(_))))
    }

    /// Board as a grid of small integers (0 empty, 1 or 2 for a player).
    ///
    /// This is the shape handed to the renderer.
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        self.row_slices()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Empty => 0,
                        Cell::Occupied(Piece::Player1) => 1,
                        Cell::Occupied(Piece::Player2) => 2,
                    })
                    .collect()
            })
            .collect()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (idx, row) in self.row_slices().enumerate() {
            let line: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => ".".to_string(),
                    Cell::Occupied(piece) => piece.to_string(),
                })
                .collect();
            result.push_str(&line.join(" "));
            if idx + 1 < self.rows {
                result.push('\n');
            }
        }
        result
    }
}

#[cfg(test)]
impl Board {
    /// Builds a board from text rows: `.` empty, `1`/`2` pieces. Top row first.
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let mut board = Board::new(rows.len(), rows[0].len()).unwrap();
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '1' => Cell::Occupied(Piece::Player1),
                    '2' => Cell::Occupied(Piece::Player2),
                    _ => Cell::Empty,
                };
                board.set(Coord::new(r, c), cell);
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cells: vec![Cell::Empty; DEFAULT_ROWS * DEFAULT_COLS],
        }
    }
}
