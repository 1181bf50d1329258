//! Core domain types for Mastermind.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Default number of holes in the code.
pub const DEFAULT_HOLES: usize = 4;

/// Default number of colors to choose from.
pub const DEFAULT_COLORS: u8 = 6;

/// Default number of guesses the player gets.
pub const DEFAULT_GUESSES: usize = 6;

/// A peg color, numbered from 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(transparent)]
pub struct Color(pub u8);

/// A feedback peg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Peg {
    /// Right color, right position.
    #[display("black")]
    Black,
    /// Right color, wrong position.
    #[display("white")]
    White,
    /// No peg.
    #[display("-")]
    Unset,
}

/// Size of a Mastermind game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Holes in the code.
    pub holes: usize,
    /// Colors available.
    pub colors: u8,
    /// Guess rows.
    pub guesses: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            holes: DEFAULT_HOLES,
            colors: DEFAULT_COLORS,
            guesses: DEFAULT_GUESSES,
        }
    }
}

/// Rejected [`BoardConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid board: {holes} holes, {colors} colors, {guesses} guesses")]
pub struct InvalidConfig {
    /// Holes requested.
    pub holes: usize,
    /// Colors requested.
    pub colors: u8,
    /// Guesses requested.
    pub guesses: usize,
}

impl BoardConfig {
    /// Checks the config can produce a secret of distinct colors.
    ///
    /// # Errors
    ///
    /// [`InvalidConfig`] when any value is zero or there are more holes than colors.
    #[instrument]
    pub fn validate(self) -> Result<Self, InvalidConfig> {
        if self.holes == 0 || self.colors == 0 || self.guesses == 0 || self.holes > usize::from(self.colors) {
            return Err(InvalidConfig {
                holes: self.holes,
                colors: self.colors,
                guesses: self.guesses,
            });
        }
        Ok(self)
    }
}

/// One guess row: the player's code and its feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRow {
    slots: Vec<Option<Color>>,
    feedback: Vec<Peg>,
    submitted: bool,
}

impl GuessRow {
    /// An empty row for a code of `holes` slots.
    pub fn empty(holes: usize) -> Self {
        Self {
            slots: vec![None; holes],
            feedback: vec![Peg::Unset; holes],
            submitted: false,
        }
    }

    /// Slots of the guess; `None` is unset.
    pub fn slots(&self) -> &[Option<Color>] {
        &self.slots
    }

    /// Feedback pegs; all [`Peg::Unset`] until submitted.
    pub fn feedback(&self) -> &[Peg] {
        &self.feedback
    }

    /// Whether the row was scored.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Whether every slot holds a color.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Whether no slot holds a color.
    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// The guess as colors, when complete.
    pub fn code(&self) -> Option<Vec<Color>> {
        self.slots.iter().copied().collect()
    }

    /// Whether the feedback is all black.
    pub fn is_solved(&self) -> bool {
        self.submitted && self.feedback.iter().all(|peg| *peg == Peg::Black)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Color>] {
        &mut self.slots
    }

    pub(crate) fn record_feedback(&mut self, feedback: Vec<Peg>) {
        self.feedback = feedback;
        self.submitted = true;
    }
}
