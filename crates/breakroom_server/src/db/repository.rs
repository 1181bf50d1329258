//! Database repository for finished games and player statistics.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{
    AggregatedStats, DbError, DbErrorKind, GameHistory, NewGameHistory, NewPlayerResult, PlayerResultRow,
    schema,
};
use crate::history::HistoryRecord;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for game history.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db_path: String,
}

impl HistoryRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new(DbErrorKind::EmptyPath));
        }
        info!(path = %db_path, "Creating HistoryRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| {
                DbError::new(DbErrorKind::Connection {
                    path: self.db_path.clone(),
                    reason: e.to_string(),
                })
            })
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration(e.to_string())))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Stores a finished game and its player results in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the game id was already recorded or a database error occurs.
    #[instrument(skip(self, record), fields(game_id = %record.game_id, kind = %record.kind))]
    pub fn record(&self, record: &HistoryRecord) -> Result<GameHistory, DbError> {
        debug!("Recording finished game");
        let mut conn = self.connection()?;

        let new_history = NewGameHistory::new(
            record.game_id.clone(),
            record.kind.to_string(),
            record.theme.clone(),
            i32::try_from(record.moves_count)?,
            record.started_at.naive_utc(),
            record.ended_at.naive_utc(),
            record.recap_url.clone(),
            serde_json::to_string(&record.history)?,
        );

        let history = conn.transaction::<_, DbError, _>(|conn| {
            let history = diesel::insert_into(schema::game_histories::table)
                .values(&new_history)
                .returning(GameHistory::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        DbError::new(DbErrorKind::AlreadyRecorded(record.game_id.clone()))
                    }
                    other => DbError::from(other),
                })?;

            let results: Vec<NewPlayerResult> = record
                .players
                .iter()
                .map(|p| {
                    NewPlayerResult::new(
                        *history.id(),
                        p.player_id.clone(),
                        p.outcome.to_db_string().to_string(),
                    )
                })
                .collect();
            if !results.is_empty() {
                diesel::insert_into(schema::player_results::table)
                    .values(&results)
                    .execute(conn)?;
            }
            Ok(history)
        })?;

        info!(
            history_id = history.id(),
            players = record.players.len(),
            "Game history recorded"
        );
        Ok(history)
    }

    /// Gets a finished game by its game id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_history(&self, game_id: &str) -> Result<Option<GameHistory>, DbError> {
        let mut conn = self.connection()?;
        let history = schema::game_histories::table
            .filter(schema::game_histories::game_id.eq(game_id))
            .select(GameHistory::as_select())
            .first(&mut conn)
            .optional()?;
        debug!(found = history.is_some(), "History lookup");
        Ok(history)
    }

    /// Lists the most recently finished games.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_games(&self, limit: i64) -> Result<Vec<GameHistory>, DbError> {
        let mut conn = self.connection()?;
        let games = schema::game_histories::table
            .order((
                schema::game_histories::ended_at.desc(),
                schema::game_histories::id.desc(),
            ))
            .limit(limit)
            .select(GameHistory::as_select())
            .load(&mut conn)?;
        info!(count = games.len(), "Recent games loaded");
        Ok(games)
    }

    /// Gets every result for a player, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn results_for_player(&self, player_id: &str) -> Result<Vec<PlayerResultRow>, DbError> {
        let mut conn = self.connection()?;
        let results = schema::player_results::table
            .filter(schema::player_results::player_id.eq(player_id))
            .order(schema::player_results::id.desc())
            .select(PlayerResultRow::as_select())
            .load(&mut conn)?;
        info!(player_id, count = results.len(), "Player results loaded");
        Ok(results)
    }

    /// Gets a player's most recent games together with their result.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_for_player(
        &self,
        player_id: &str,
        limit: i64,
    ) -> Result<Vec<(PlayerResultRow, GameHistory)>, DbError> {
        let mut conn = self.connection()?;
        let rows = schema::player_results::table
            .inner_join(schema::game_histories::table)
            .filter(schema::player_results::player_id.eq(player_id))
            .order(schema::player_results::id.desc())
            .limit(limit)
            .select((PlayerResultRow::as_select(), GameHistory::as_select()))
            .load(&mut conn)?;
        debug!(player_id, count = rows.len(), "Recent player games loaded");
        Ok(rows)
    }

    /// Gets aggregated win/loss/draw counts for a player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn aggregated_stats(&self, player_id: &str) -> Result<AggregatedStats, DbError> {
        let results = self.results_for_player(player_id)?;

        let mut wins = 0;
        let mut losses = 0;
        let mut draws = 0;

        for result in &results {
            match result.outcome().as_str() {
                "win" => wins += 1,
                "loss" => losses += 1,
                "draw" => draws += 1,
                other => warn!(outcome = %other, result_id = result.id(), "Unknown outcome value"),
            }
        }

        let total = i32::try_from(results.len())?;
        let aggregated = AggregatedStats::new(total, wins, losses, draws);

        info!(
            player_id,
            total,
            wins,
            losses,
            draws,
            win_rate = %format!("{:.1}%", aggregated.win_rate()),
            "Aggregated stats computed"
        );
        Ok(aggregated)
    }
}
