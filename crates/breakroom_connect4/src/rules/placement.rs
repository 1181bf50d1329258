//! Gravity placement.

use super::super::{Board, Cell, Column, Coord, Piece};
use derive_more::{Display, Error};
use tracing::{debug, instrument};

/// Errors from dropping a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PlaceError {
    /// The column's top cell is already occupied.
    #[display("Column {_0} is full")]
    ColumnFull(#[error(not(source))] Column),
    /// The column does not exist on this board.
    #[display("Column {_0} is not on the board")]
    ColumnOutOfRange(#[error(not(source))] Column),
}

/// Drops `piece` into `column`, returning the new board and where it landed.
///
/// The input board is left untouched; a full column yields
/// [`PlaceError::ColumnFull`].
#[instrument(skip(board), fields(column = %column, piece = %piece))]
pub fn place(board: &Board, column: Column, piece: Piece) -> Result<(Board, Coord), PlaceError> {
    if column.index() >= board.cols() {
        return Err(PlaceError::ColumnOutOfRange(column));
    }

    let landing = (0..board.rows())
        .rev()
        .map(|row| Coord::new(row, column.index()))
        .find(|coord| board.get(*coord) == Some(Cell::Empty))
        .ok_or(PlaceError::ColumnFull(column))?;

    let mut next = board.clone();
    next.set(landing, Cell::Occupied(piece));
    debug!(row = landing.row, col = landing.col, "Piece placed");
    Ok((next, landing))
}
