//! Errors raised by the game history store.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong while reading or writing game history.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// No database file was configured.
    #[display("History database path is empty")]
    EmptyPath,
    /// The SQLite file could not be opened.
    #[display("Cannot open history database '{path}': {reason}")]
    Connection {
        /// Configured database path.
        path: String,
        /// Driver message.
        reason: String,
    },
    /// Applying the schema failed.
    #[display("History schema migration failed: {_0}")]
    Migration(String),
    /// A finished game can only be recorded once.
    #[display("Game {_0} is already recorded")]
    AlreadyRecorded(String),
    /// Any other query failure.
    #[display("History query failed: {_0}")]
    Query(String),
    /// A player result row holds something other than win, loss or draw.
    #[display("Stored outcome '{_0}' is not win, loss or draw")]
    InvalidOutcome(String),
    /// The move history could not be turned into JSON.
    #[display("Move history is not storable: {_0}")]
    HistoryBlob(String),
    /// A move or game count does not fit the column type.
    #[display("Count does not fit the history table: {_0}")]
    CountOutOfRange(String),
}

/// History store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("History store error: {} at {}:{}", kind, file, line)]
pub struct DbError {
    /// What went wrong.
    pub kind: DbErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a new history store error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: DbErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Whether the game id was recorded before.
    pub fn is_already_recorded(&self) -> bool {
        matches!(self.kind, DbErrorKind::AlreadyRecorded(_))
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query(err.to_string()))
    }
}

impl From<serde_json::Error> for DbError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(DbErrorKind::HistoryBlob(err.to_string()))
    }
}

impl From<std::num::TryFromIntError> for DbError {
    #[track_caller]
    fn from(err: std::num::TryFromIntError) -> Self {
        Self::new(DbErrorKind::CountOutOfRange(err.to_string()))
    }
}
