//! Mastermind board: the hidden secret and the guess rows.

use super::action::{Move, MoveError};
use super::scoring::score;
use super::{BoardConfig, Color, GuessRow, InvalidConfig};
use derive_more::Display;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Result of a move on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Outcome {
    /// More guesses may follow.
    #[display("in progress")]
    InProgress,
    /// The code was cracked.
    #[display("won")]
    Won,
    /// The last row was submitted without cracking the code.
    #[display("lost")]
    Lost,
}

/// Secret code plus guess rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    secret: Vec<Color>,
    colors: u8,
    rows: Vec<GuessRow>,
}

impl Board {
    /// Generates a board with a random secret of distinct colors.
    ///
    /// # Errors
    ///
    /// [`InvalidConfig`] when the config cannot yield a distinct-color secret.
    #[instrument(skip(rng))]
    pub fn generate<R: Rng + ?Sized>(config: BoardConfig, rng: &mut R) -> Result<Self, InvalidConfig> {
        let config = config.validate()?;
        let mut palette: Vec<Color> = (0..config.colors).map(Color).collect();
        palette.shuffle(rng);
        palette.truncate(config.holes);
        info!(holes = config.holes, colors = config.colors, guesses = config.guesses, "Generated secret");
        Ok(Self {
            secret: palette,
            colors: config.colors,
            rows: vec![GuessRow::empty(config.holes); config.guesses],
        })
    }

    /// Builds a board around a known secret.
    ///
    /// # Errors
    ///
    /// [`InvalidConfig`] for an empty secret, repeated colors, colors outside
    /// `0..colors` or zero guesses.
    #[instrument]
    pub fn with_secret(secret: Vec<Color>, colors: u8, guesses: usize) -> Result<Self, InvalidConfig> {
        let invalid = InvalidConfig {
            holes: secret.len(),
            colors,
            guesses,
        };
        let config = BoardConfig {
            holes: secret.len(),
            colors,
            guesses,
        }
        .validate()
        .map_err(|_| invalid.clone())?;

        let mut seen = secret.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != secret.len() || secret.iter().any(|c| c.0 >= colors) {
            return Err(invalid);
        }

        Ok(Self {
            secret,
            colors,
            rows: vec![GuessRow::empty(config.holes); config.guesses],
        })
    }

    /// The hidden code.
    pub fn secret(&self) -> &[Color] {
        &self.secret
    }

    /// Number of colors in play.
    pub fn colors(&self) -> u8 {
        self.colors
    }

    /// Holes per row.
    pub fn holes(&self) -> usize {
        self.secret.len()
    }

    /// All guess rows, first guess first.
    pub fn rows(&self) -> &[GuessRow] {
        &self.rows
    }

    /// Index of the first row not yet submitted.
    pub fn current_row_index(&self) -> Option<usize> {
        self.rows.iter().position(|row| !row.is_submitted())
    }

    /// The row being filled in.
    pub fn current_row(&self) -> Option<&GuessRow> {
        self.current_row_index().map(|idx| &self.rows[idx])
    }

    /// Outcome judged from the submitted rows.
    pub fn outcome(&self) -> Outcome {
        if self.rows.iter().any(GuessRow::is_solved) {
            Outcome::Won
        } else if self.current_row_index().is_none() {
            Outcome::Lost
        } else {
            Outcome::InProgress
        }
    }

    /// Applies a button press, returning the new board and its outcome.
    ///
    /// Undo is accepted whenever the current row has a color in it, whether
    /// or not the row is full. The board itself is never modified.
    #[instrument(skip(self), fields(row = ?self.current_row_index()))]
    pub fn apply_move(&self, mv: Move) -> Result<(Board, Outcome), MoveError> {
        let row_idx = self.current_row_index().ok_or(MoveError::NoGuessesLeft)?;
        let mut next = self.clone();
        let row = &mut next.rows[row_idx];

        match mv {
            Move::Color(color) => {
                if color.0 >= self.colors {
                    return Err(MoveError::ColorOutOfRange(color));
                }
                let slot = row
                    .slots_mut()
                    .iter_mut()
                    .find(|slot| slot.is_none())
                    .ok_or(MoveError::MustSubmitGuess)?;
                *slot = Some(color);
            }
            Move::Undo => {
                let slot = row
                    .slots_mut()
                    .iter_mut()
                    .rev()
                    .find(|slot| slot.is_some())
                    .ok_or(MoveError::NothingToUndo)?;
                *slot = None;
            }
            Move::Submit => {
                let guess = row.code().ok_or(MoveError::MustCompleteCode)?;
                let feedback = score(&self.secret, &guess);
                row.record_feedback(feedback);
            }
        }

        let outcome = next.outcome();
        debug!(%mv, %outcome, "Move applied");
        Ok((next, outcome))
    }

    /// Formats the board as a human-readable string, secret hidden.
    pub fn display(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let slots: Vec<String> = row
                    .slots()
                    .iter()
                    .map(|slot| slot.map_or_else(|| "_".to_string(), |c| c.to_string()))
                    .collect();
                let pegs: Vec<String> = row.feedback().iter().map(ToString::to_string).collect();
                format!("{}  |  {}", slots.join(" "), pegs.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
