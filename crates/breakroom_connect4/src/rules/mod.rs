//! Game rules for Connect Four.
//!
//! Pure functions over a [`Board`](super::Board): placement, win detection
//! and tie detection. Boards are values; every rule returns new data.

pub mod placement;
pub mod tie;
pub mod win;

pub use placement::{PlaceError, place};
pub use tie::check_tie;
pub use win::{Axis, WIN_LENGTH, WinningLine, check_win, winning_lines_through};
