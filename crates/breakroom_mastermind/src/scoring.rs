//! Peg feedback for a guess.

use super::{Color, Peg};
use tracing::{debug, instrument};

/// Scores `guess` against `secret`.
///
/// Exact matches become [`Peg::Black`] and are taken out of both codes; each
/// remaining guess color still present in what is left of the secret becomes
/// [`Peg::White`] and consumes one instance. Blacks come first, then whites,
/// then [`Peg::Unset`] padding up to the guess length.
#[instrument]
pub fn score(secret: &[Color], guess: &[Color]) -> Vec<Peg> {
    let mut feedback = Vec::with_capacity(guess.len());
    let mut secret_left = Vec::with_capacity(secret.len());
    let mut guess_left = Vec::with_capacity(guess.len());

    for (idx, color) in guess.iter().enumerate() {
        match secret.get(idx) {
            Some(expected) if expected == color => feedback.push(Peg::Black),
            Some(expected) => {
                secret_left.push(*expected);
                guess_left.push(*color);
            }
            None => guess_left.push(*color),
        }
    }
    secret_left.extend(secret.iter().skip(guess.len()));

    for color in guess_left {
        if let Some(pos) = secret_left.iter().position(|c| *c == color) {
            secret_left.swap_remove(pos);
            feedback.push(Peg::White);
        }
    }

    feedback.resize(guess.len(), Peg::Unset);
    debug!(?feedback, "Guess scored");
    feedback
}
