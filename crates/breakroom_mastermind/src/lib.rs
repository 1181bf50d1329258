//! Mastermind game logic.
//!
//! - [`Board`]: hidden secret plus guess rows
//! - [`score`]: black/white peg feedback
//! - [`MastermindGame`]: a single-player session with history
//!
//! # Example
//!
//! ```
//! use breakroom_mastermind::{Board, Color, GameStatus, MastermindGame, Move};
//!
//! let board = Board::with_secret(vec![Color(0), Color(1), Color(2), Color(3)], 6, 6).unwrap();
//! let mut game = MastermindGame::with_board("g1".into(), "alice".into(), board);
//! game.start();
//! for c in 0..4 {
//!     game.apply_move("alice", Move::Color(Color(c))).unwrap();
//! }
//! assert_eq!(game.apply_move("alice", Move::Submit).unwrap(), GameStatus::Won);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
mod game;
mod scoring;
mod types;

pub use action::{Move, MoveError, SUBMIT_VALUE, UNDO_VALUE};
pub use board::{Board, Outcome};
pub use game::{GameStatus, MastermindGame, MoveRecord};
pub use scoring::score;
pub use types::{
    BoardConfig, Color, DEFAULT_COLORS, DEFAULT_GUESSES, DEFAULT_HOLES, GuessRow, InvalidConfig,
    Peg,
};
