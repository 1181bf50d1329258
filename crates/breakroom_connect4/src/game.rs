//! Connect Four game session.
//!
//! Wraps a [`Board`] with the two participants, whose turn it is, the
//! outcome and an append-only move history. The only way to change a
//! started game is [`Connect4Game::apply_move`].

use super::rules::{self, PlaceError, WinningLine};
use super::{Board, Column, Coord, InvalidDimensions, Piece};
use chrono::{DateTime, Utc};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Opaque chat-platform user identifier.
pub type PlayerId = String;

/// Lifecycle of a Connect Four game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum GameStatus {
    /// Created but the opening board has not been recorded.
    #[display("created")]
    Created,
    /// Moves are being accepted.
    #[display("in progress")]
    InProgress,
    /// A player connected four.
    #[display("won by player {_0}")]
    Won(Piece),
    /// The board filled up without a winner.
    #[display("tied")]
    Tied,
}

impl GameStatus {
    /// Whether no further moves are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won(_) | GameStatus::Tied)
    }
}

/// One entry of the move history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Who moved; `None` for the opening board.
    pub mover: Option<Piece>,
    /// Where the piece landed; `None` for the opening board.
    pub played: Option<Coord>,
    /// Board after the move, independent of later moves.
    pub board: Board,
    /// When the move was applied.
    pub timestamp: DateTime<Utc>,
}

/// What a successful move produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// Player who moved.
    pub mover: Piece,
    /// Landing cell.
    pub landed: Coord,
    /// Status after the move.
    pub status: GameStatus,
    /// Winning lines, empty unless the move won.
    pub winning_lines: Vec<WinningLine>,
}

/// Errors starting a game.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SetupError {
    /// Both participants are the same user.
    #[display("You cannot play against yourself")]
    #[from(ignore)]
    SelfPlayNotAllowed,
    /// Board dimensions were rejected.
    #[display("{_0}")]
    InvalidDimensions(InvalidDimensions),
}

/// Errors applying a move. None of them change the game.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum MoveError {
    /// The acting user is not the player to move.
    #[display("It is not {actor}'s turn")]
    #[from(ignore)]
    NotYourTurn {
        /// User who pressed the button.
        actor: PlayerId,
    },
    /// The board rejected the placement.
    #[display("{_0}")]
    Place(PlaceError),
    /// [`Connect4Game::start`] was never called.
    #[display("Game has not started")]
    #[from(ignore)]
    NotStarted,
    /// The game already ended.
    #[display("Game is already over")]
    #[from(ignore)]
    GameOver,
}

/// A two-player Connect Four game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect4Game {
    game_id: String,
    player1: PlayerId,
    player2: PlayerId,
    current: Piece,
    board: Board,
    status: GameStatus,
    latest_move: Option<Coord>,
    winning_lines: Vec<WinningLine>,
    history: Vec<MoveRecord>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Connect4Game {
    /// Creates a game between two distinct users on a `rows × cols` board.
    ///
    /// `player1` moves first.
    ///
    /// # Errors
    ///
    /// [`SetupError::SelfPlayNotAllowed`] when both ids match,
    /// [`SetupError::InvalidDimensions`] for a zero-sized board.
    #[instrument(skip(game_id), fields(game_id = %game_id))]
    pub fn new(
        game_id: String,
        player1: PlayerId,
        player2: PlayerId,
        rows: usize,
        cols: usize,
    ) -> Result<Self, SetupError> {
        if player1 == player2 {
            warn!(player = %player1, "Rejected self play");
            return Err(SetupError::SelfPlayNotAllowed);
        }
        let board = Board::new(rows, cols)?;
        info!(rows, cols, "Creating Connect Four game");
        Ok(Self {
            game_id,
            player1,
            player2,
            current: Piece::Player1,
            board,
            status: GameStatus::Created,
            latest_move: None,
            winning_lines: Vec::new(),
            history: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        })
    }

    /// Records the opening board and starts accepting moves.
    ///
    /// Calling it again on a started game does nothing.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn start(&mut self) {
        if self.status != GameStatus::Created {
            debug!(status = %self.status, "Game already started");
            return;
        }
        let now = Utc::now();
        self.started_at = now;
        self.history.push(MoveRecord {
            mover: None,
            played: None,
            board: self.board.clone(),
            timestamp: now,
        });
        self.status = GameStatus::InProgress;
        info!("Game started");
    }

    /// Applies `actor` dropping a piece into `column`.
    ///
    /// On error the game is unchanged.
    #[instrument(skip(self), fields(game_id = %self.game_id, column = %column))]
    pub fn apply_move(&mut self, actor: &str, column: Column) -> Result<MoveReport, MoveError> {
        match self.status {
            GameStatus::Created => return Err(MoveError::NotStarted),
            GameStatus::Won(_) | GameStatus::Tied => return Err(MoveError::GameOver),
            GameStatus::InProgress => {}
        }

        if actor != self.player_id(self.current) {
            debug!(expected = %self.player_id(self.current), "Move out of turn");
            return Err(MoveError::NotYourTurn {
                actor: actor.to_string(),
            });
        }

        let mover = self.current;
        let (board, landed) = rules::place(&self.board, column, mover)?;

        let winning_lines = rules::check_win(&board, column);
        let status = if !winning_lines.is_empty() {
            GameStatus::Won(mover)
        } else if rules::check_tie(&board) {
            GameStatus::Tied
        } else {
            GameStatus::InProgress
        };

        let now = Utc::now();
        self.history.push(MoveRecord {
            mover: Some(mover),
            played: Some(landed),
            board: board.clone(),
            timestamp: now,
        });
        self.board = board;
        self.latest_move = Some(landed);
        self.winning_lines = winning_lines.clone();
        self.status = status;

        if status.is_terminal() {
            self.ended_at = Some(now);
            info!(status = %status, moves = self.history.len() - 1, "Game over");
        } else {
            self.current = mover.opponent();
        }

        debug!(row = landed.row, col = landed.col, status = %status, "Move applied");
        Ok(MoveReport {
            mover,
            landed,
            status,
            winning_lines,
        })
    }

    /// Unique game id.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// User playing `piece`.
    pub fn player_id(&self, piece: Piece) -> &str {
        match piece {
            Piece::Player1 => &self.player1,
            Piece::Player2 => &self.player2,
        }
    }

    /// User whose turn it is.
    pub fn current_player(&self) -> &str {
        self.player_id(self.current)
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Whether the game has ended.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Cell of the most recent move.
    pub fn latest_move(&self) -> Option<Coord> {
        self.latest_move
    }

    /// Lines that won the game.
    pub fn winning_lines(&self) -> &[WinningLine] {
        &self.winning_lines
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
