//! SQLite persistence for finished games and per-player statistics.

mod error;
mod models;
mod repository;
mod schema;

pub use error::{DbError, DbErrorKind};
pub use models::{
    AggregatedStats, GameHistory, GameOutcome, NewGameHistory, NewPlayerResult, PlayerResultRow,
};
pub use repository::HistoryRepository;
