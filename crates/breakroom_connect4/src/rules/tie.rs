//! Tie detection logic for Connect Four.

use super::super::{Board, Cell};
use tracing::instrument;

/// Checks whether no further piece can be played.
///
/// Gravity means the board is full exactly when the top row is. A full board
/// can also be a win, so this is only meaningful after
/// [`check_win`](super::check_win) came back empty.
#[instrument(skip(board))]
pub fn check_tie(board: &Board) -> bool {
    board.top_row().iter().all(|cell| *cell != Cell::Empty)
}
