//! Player actions on a Mastermind board.

use super::Color;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Button value for [`Move::Undo`].
pub const UNDO_VALUE: i64 = -1;

/// Button value for [`Move::Submit`].
pub const SUBMIT_VALUE: i64 = -2;

/// A single button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Move {
    /// Fill the next empty slot of the current row.
    #[display("color {_0}")]
    Color(Color),
    /// Clear the most recently filled slot of the current row.
    #[display("undo")]
    Undo,
    /// Score the current row.
    #[display("submit")]
    Submit,
}

impl Move {
    /// Decodes a button value: `-1` undo, `-2` submit, `0..=255` a color.
    ///
    /// Returns `None` for anything else.
    #[instrument]
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            UNDO_VALUE => Some(Move::Undo),
            SUBMIT_VALUE => Some(Move::Submit),
            v => u8::try_from(v).ok().map(|c| Move::Color(Color(c))),
        }
    }

    /// Encodes the move as a button value.
    pub fn to_value(self) -> i64 {
        match self {
            Move::Color(Color(c)) => i64::from(c),
            Move::Undo => UNDO_VALUE,
            Move::Submit => SUBMIT_VALUE,
        }
    }
}

/// Errors applying a move. None of them change the board.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Undo pressed on a row with no colors.
    #[display("Nothing to undo in the current code")]
    NothingToUndo,
    /// Submit pressed before every hole was filled.
    #[display("Complete code before submitting")]
    MustCompleteCode,
    /// Color pressed on a full row.
    #[display("No more holes to play in. Submit your guess")]
    MustSubmitGuess,
    /// Color outside the game's palette.
    #[display("Color {_0} is not in this game")]
    ColorOutOfRange(#[error(not(source))] Color),
    /// Every row has been submitted.
    #[display("No guesses left")]
    NoGuessesLeft,
    /// Someone other than the owner pressed a button.
    #[display("This is {owner}'s game")]
    NotYourGame {
        /// Owner of the game.
        owner: String,
    },
    /// The game was never started.
    #[display("Game has not started")]
    NotStarted,
    /// The game already ended.
    #[display("Game is already over")]
    GameOver,
}
