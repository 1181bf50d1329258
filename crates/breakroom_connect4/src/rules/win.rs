//! Win detection logic for Connect Four.

use super::super::{Board, Column, Coord, Piece};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

/// Pieces in a row needed to win.
pub const WIN_LENGTH: usize = 4;

/// One of the four lines a piece can win along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Axis {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Bottom-left to top-right (`/`).
    Rising,
    /// Top-left to bottom-right (`\`).
    Falling,
}

impl Axis {
    /// Row and column step of the axis' forward direction.
    fn step(self) -> (isize, isize) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::Rising => (-1, 1),
            Axis::Falling => (1, 1),
        }
    }
}

/// A run of at least [`WIN_LENGTH`] same-player cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningLine {
    /// Axis the run lies on.
    pub axis: Axis,
    /// Player owning the run.
    pub piece: Piece,
    /// Cells from the backward end of the run to the forward end.
    pub cells: Vec<Coord>,
}

impl WinningLine {
    /// Number of cells in the run.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the run is empty (never true for a detected line).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Checks whether the piece just dropped into `column` won the game.
///
/// The most recent piece in a column is its topmost occupied cell. Returns
/// every winning line through that piece; empty when there is none or the
/// column holds no piece at all.
#[instrument(skip(board), fields(column = %column))]
pub fn check_win(board: &Board, column: Column) -> Vec<WinningLine> {
    match board.topmost_piece(column) {
        Some(origin) => winning_lines_through(board, origin),
        None => {
            debug!("Column is empty, nothing to check");
            Vec::new()
        }
    }
}

/// Returns every winning line passing through `origin`.
#[instrument(skip(board), fields(origin = %origin))]
pub fn winning_lines_through(board: &Board, origin: Coord) -> Vec<WinningLine> {
    let Some(piece) = board.get(origin).and_then(|cell| cell.piece()) else {
        return Vec::new();
    };

    let lines: Vec<WinningLine> = Axis::iter()
        .filter_map(|axis| {
            let (dr, dc) = axis.step();
            let mut backward = walk(board, origin, piece, -dr, -dc);
            backward.reverse();
            let forward = walk(board, origin, piece, dr, dc);

            let mut cells = backward;
            cells.push(origin);
            cells.extend(forward);

            (cells.len() >= WIN_LENGTH).then_some(WinningLine { axis, piece, cells })
        })
        .collect();

    debug!(count = lines.len(), "Winning lines evaluated");
    lines
}

/// Collects consecutive `piece` cells stepping away from `origin`.
///
/// Stops at the edge, an empty cell or an opposing piece.
fn walk(board: &Board, origin: Coord, piece: Piece, dr: isize, dc: isize) -> Vec<Coord> {
    let mut run = Vec::new();
    let mut row = origin.row as isize + dr;
    let mut col = origin.col as isize + dc;
    while let Some(cell) = board.get_signed(row, col) {
        if cell.piece() != Some(piece) {
            break;
        }
        run.push(Coord::new(row as usize, col as usize));
        row += dr;
        col += dc;
    }
    run
}
