//! Finished-game history and the collaborator that records it.

use crate::db::{GameOutcome, HistoryRepository};
use crate::error::HistoryError;
use crate::session::GameKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// One participant's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PlayerResult {
    /// Chat user id.
    pub player_id: String,
    /// Result from this player's perspective.
    pub outcome: GameOutcome,
}

/// Everything kept about a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Game id.
    pub game_id: String,
    /// Which game was played.
    pub kind: GameKind,
    /// Theme it was played in.
    pub theme: String,
    /// Result per participant.
    pub players: Vec<PlayerResult>,
    /// Moves applied after the opening board.
    pub moves_count: usize,
    /// When the game started.
    pub started_at: DateTime<Utc>,
    /// When the game ended.
    pub ended_at: DateTime<Utc>,
    /// Animated recap, once rendered.
    pub recap_url: Option<String>,
    /// Full move history.
    pub history: serde_json::Value,
}

/// Persists finished games. Invoked once per game, off the request path.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    /// Stores `record`.
    async fn record_history(&self, record: &HistoryRecord) -> Result<(), HistoryError>;
}

#[async_trait]
impl HistoryRecorder for HistoryRepository {
    #[instrument(skip(self, record), fields(game_id = %record.game_id, kind = %record.kind))]
    async fn record_history(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        debug!("Recording history on blocking pool");
        let repo = self.clone();
        let record = record.clone();
        let stored = tokio::task::spawn_blocking(move || repo.record(&record))
            .await
            .map_err(|e| HistoryError::new(format!("History task failed: {}", e)))??;
        info!(history_id = stored.id(), "History recorded");
        Ok(())
    }
}
