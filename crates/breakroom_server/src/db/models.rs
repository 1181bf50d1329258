//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{DbError, DbErrorKind, schema};

/// A finished game.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_histories)]
pub struct GameHistory {
    id: i32,
    game_id: String,
    game_kind: String,
    theme: String,
    moves_count: i32,
    started_at: NaiveDateTime,
    ended_at: NaiveDateTime,
    recap_url: Option<String>,
    history_json: String,
}

/// Insertable finished game.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_histories)]
pub struct NewGameHistory {
    game_id: String,
    game_kind: String,
    theme: String,
    moves_count: i32,
    started_at: NaiveDateTime,
    ended_at: NaiveDateTime,
    recap_url: Option<String>,
    history_json: String,
}

/// One player's result in a finished game.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::player_results)]
#[diesel(belongs_to(GameHistory, foreign_key = history_id))]
pub struct PlayerResultRow {
    id: i32,
    history_id: i32,
    player_id: String,
    outcome: String,
}

impl PlayerResultRow {
    /// Parses the stored outcome string into a [`GameOutcome`] enum.
    #[instrument(skip(self), fields(outcome = %self.outcome))]
    pub fn parse_outcome(&self) -> Result<GameOutcome, DbError> {
        GameOutcome::from_db_string(self.outcome())
    }
}

/// Insertable player result.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::player_results)]
pub struct NewPlayerResult {
    history_id: i32,
    player_id: String,
    outcome: String,
}

/// Game outcome from one player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    /// The player won.
    Win,
    /// The player lost.
    Loss,
    /// Nobody won.
    Draw,
}

impl GameOutcome {
    /// Converts outcome to the string stored in the database.
    #[instrument]
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    /// Parses outcome from the string stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the string is not a valid outcome value.
    #[instrument(skip(s), fields(s = %s))]
    pub fn from_db_string(s: &str) -> Result<Self, DbError> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "draw" => Ok(Self::Draw),
            _ => Err(DbError::new(DbErrorKind::InvalidOutcome(s.to_string()))),
        }
    }
}

/// Aggregated results for a player.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct AggregatedStats {
    total_games: i32,
    wins: i32,
    losses: i32,
    draws: i32,
}

impl AggregatedStats {
    /// Creates new aggregated statistics.
    #[instrument]
    pub fn new(total_games: i32, wins: i32, losses: i32, draws: i32) -> Self {
        Self {
            total_games,
            wins,
            losses,
            draws,
        }
    }

    /// Win rate as a percentage (0.0 to 100.0).
    #[instrument(skip(self))]
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            (f64::from(self.wins) / f64::from(self.total_games)) * 100.0
        }
    }
}
