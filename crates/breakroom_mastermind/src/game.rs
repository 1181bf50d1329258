//! Mastermind game session.
//!
//! Single-player: only the owner may press buttons. Submitted guesses and
//! every slot change are kept in an append-only history.

use super::action::{Move, MoveError};
use super::board::{Board, Outcome};
use super::{BoardConfig, Color, InvalidConfig};
use chrono::{DateTime, Utc};
use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Lifecycle of a Mastermind game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum GameStatus {
    /// Created but not yet started.
    #[display("created")]
    Created,
    /// Guesses are being accepted.
    #[display("in progress")]
    InProgress,
    /// The code was cracked.
    #[display("won")]
    Won,
    /// Out of guesses.
    #[display("lost")]
    Lost,
}

impl GameStatus {
    /// Whether no further moves are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

impl From<Outcome> for GameStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::InProgress => GameStatus::InProgress,
            Outcome::Won => GameStatus::Won,
            Outcome::Lost => GameStatus::Lost,
        }
    }
}

/// One entry of the move history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// The move; `None` for the opening board.
    pub played: Option<Move>,
    /// Board after the move.
    pub board: Board,
    /// When the move was applied.
    pub timestamp: DateTime<Utc>,
}

/// A Mastermind game owned by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MastermindGame {
    game_id: String,
    owner: String,
    board: Board,
    status: GameStatus,
    history: Vec<MoveRecord>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl MastermindGame {
    /// Creates a game with a random secret.
    ///
    /// # Errors
    ///
    /// [`InvalidConfig`] when the config is unusable.
    #[instrument(skip(game_id, rng), fields(game_id = %game_id))]
    pub fn new<R: Rng + ?Sized>(
        game_id: String,
        owner: String,
        config: BoardConfig,
        rng: &mut R,
    ) -> Result<Self, InvalidConfig> {
        let board = Board::generate(config, rng)?;
        Ok(Self::with_board(game_id, owner, board))
    }

    /// Creates a game around an existing board.
    pub fn with_board(game_id: String, owner: String, board: Board) -> Self {
        Self {
            game_id,
            owner,
            board,
            status: GameStatus::Created,
            history: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Records the opening board and starts accepting moves.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn start(&mut self) {
        if self.status != GameStatus::Created {
            debug!(status = %self.status, "Game already started");
            return;
        }
        let now = Utc::now();
        self.started_at = now;
        self.history.push(MoveRecord {
            played: None,
            board: self.board.clone(),
            timestamp: now,
        });
        self.status = GameStatus::InProgress;
        info!(owner = %self.owner, "Game started");
    }

    /// Applies a button press by `actor`.
    ///
    /// On error the game is unchanged.
    #[instrument(skip(self), fields(game_id = %self.game_id, mv = %mv))]
    pub fn apply_move(&mut self, actor: &str, mv: Move) -> Result<GameStatus, MoveError> {
        match self.status {
            GameStatus::Created => return Err(MoveError::NotStarted),
            GameStatus::Won | GameStatus::Lost => return Err(MoveError::GameOver),
            GameStatus::InProgress => {}
        }
        if actor != self.owner {
            debug!(actor, "Move by someone else");
            return Err(MoveError::NotYourGame {
                owner: self.owner.clone(),
            });
        }

        let (board, outcome) = self.board.apply_move(mv)?;
        let now = Utc::now();
        self.history.push(MoveRecord {
            played: Some(mv),
            board: board.clone(),
            timestamp: now,
        });
        self.board = board;
        self.status = outcome.into();

        if self.status.is_terminal() {
            self.ended_at = Some(now);
            info!(status = %self.status, guesses = self.guesses_used(), "Game over");
        }
        Ok(self.status)
    }

    /// Unique game id.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// The only player allowed to move.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The hidden code, for the game-over message.
    pub fn secret(&self) -> &[Color] {
        self.board.secret()
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Whether the game has ended.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of rows submitted.
    pub fn guesses_used(&self) -> usize {
        self.board.rows().iter().filter(|row| row.is_submitted()).count()
    }

    /// Every move so far, the opening board first.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// When the game started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the game ended.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }
}
