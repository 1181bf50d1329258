//! Connect Four game logic.
//!
//! Pure rules with no I/O:
//!
//! - [`Board`]: a `rows × cols` grid with gravity
//! - [`rules`]: placement, win detection, tie detection
//! - [`Connect4Game`]: a two-player session with turn tracking and history
//!
//! # Example
//!
//! ```
//! use breakroom_connect4::{Column, Connect4Game, GameStatus};
//!
//! let mut game = Connect4Game::new("g1".into(), "alice".into(), "bob".into(), 6, 7).unwrap();
//! game.start();
//! let report = game.apply_move("alice", Column::from_one_based(4).unwrap()).unwrap();
//! assert_eq!(report.status, GameStatus::InProgress);
//! assert_eq!(game.current_player(), "bob");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod game;
pub mod rules;
mod types;

pub use game::{
    Connect4Game, GameStatus, MoveError, MoveRecord, MoveReport, PlayerId, SetupError,
};
pub use rules::{Axis, PlaceError, WinningLine, check_tie, check_win, place};
pub use types::{
    Board, Cell, Column, Coord, DEFAULT_COLS, DEFAULT_ROWS, InvalidDimensions, MalformedBoard, Piece,
};
