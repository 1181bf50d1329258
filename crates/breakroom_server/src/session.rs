//! Game sessions as stored between requests.
//!
//! [`SessionGame`] is the capability set the dispatcher needs from a game.
//! Connect Four and Mastermind implement it independently; [`AnyGame`]
//! selects between them and [`SessionRecord`] adds the chat context that
//! travels with a game in the store.

use crate::error::CodecError;
use crate::history::{HistoryRecord, PlayerResult};
use crate::db::GameOutcome;
use crate::render::{BannerRequest, BoardImage, RenderRequest};
use breakroom_connect4::{Column, Connect4Game, Coord, GameStatus as Connect4Status, Piece};
use breakroom_mastermind::{GameStatus as MastermindStatus, MastermindGame, Move};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Which game a session plays.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    /// Two-player Connect Four.
    Connect4,
    /// Single-player Mastermind.
    Mastermind,
}

/// A decoded button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum GameAction {
    /// Drop a piece into a column.
    #[display("column {_0}")]
    Connect4(Column),
    /// Press a Mastermind button.
    #[display("{_0}")]
    Mastermind(Move),
}

impl GameAction {
    /// Game the action belongs to.
    pub fn kind(&self) -> GameKind {
        match self {
            GameAction::Connect4(_) => GameKind::Connect4,
            GameAction::Mastermind(_) => GameKind::Mastermind,
        }
    }
}

/// A move the game refused. The session is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum MoveRejection {
    /// Connect Four refused the move.
    #[display("{_0}")]
    Connect4(breakroom_connect4::MoveError),
    /// Mastermind refused the move.
    #[display("{_0}")]
    Mastermind(breakroom_mastermind::MoveError),
    /// The button belongs to the other game.
    #[display("A {action} move cannot be played in a {game} game")]
    #[from(ignore)]
    WrongGame {
        /// Game the button was for.
        action: GameKind,
        /// Game stored under the id.
        game: GameKind,
    },
}

impl MoveRejection {
    /// Warning shown in the game message, for rejections the player should see.
    ///
    /// Mastermind board errors are shown inline; everything else is a silent
    /// no-op from the player's point of view.
    pub fn inline_warning(&self) -> Option<String> {
        use breakroom_mastermind::MoveError as M;
        match self {
            MoveRejection::Mastermind(
                err @ (M::NothingToUndo
                | M::MustCompleteCode
                | M::MustSubmitGuess
                | M::ColorOutOfRange(_)
                | M::NoGuessesLeft),
            ) => Some(format!(":red_circle: *{}* :red_circle:", err)),
            _ => None,
        }
    }
}

/// What the dispatcher needs from a game, independent of its rules.
pub trait SessionGame: Send + Sync {
    /// Game kind.
    fn kind(&self) -> GameKind;

    /// Unique game id.
    fn game_id(&self) -> &str;

    /// Applies a button press by `actor`; on error nothing changes.
    fn apply(&mut self, actor: &str, action: GameAction) -> Result<(), MoveRejection>;

    /// What the renderer should draw for the current board.
    fn render_request(&self, theme: &str) -> RenderRequest;

    /// Whether the game has ended.
    fn is_terminal(&self) -> bool;

    /// The full move history as JSON.
    fn history_blob(&self) -> Result<serde_json::Value, CodecError>;

    /// Per-player outcome; empty while the game is running.
    fn player_results(&self) -> Vec<PlayerResult>;

    /// Moves applied since the opening board.
    fn moves_played(&self) -> usize;

    /// When the game started.
    fn started_at(&self) -> DateTime<Utc>;

    /// When the game ended.
    fn ended_at(&self) -> Option<DateTime<Utc>>;
}

impl SessionGame for Connect4Game {
    fn kind(&self) -> GameKind {
        GameKind::Connect4
    }

    fn game_id(&self) -> &str {
        Connect4Game::game_id(self)
    }

    #[instrument(skip(self), fields(game_id = %Connect4Game::game_id(self)))]
    fn apply(&mut self, actor: &str, action: GameAction) -> Result<(), MoveRejection> {
        let GameAction::Connect4(column) = action else {
            return Err(MoveRejection::WrongGame {
                action: action.kind(),
                game: GameKind::Connect4,
            });
        };
        let report = self.apply_move(actor, column)?;
        debug!(
            landed = %report.landed,
            status = %report.status,
            board = %self.board().display(),
            "Connect Four move applied"
        );
        Ok(())
    }

    fn render_request(&self, theme: &str) -> RenderRequest {
        let highlight: Vec<Coord> = if self.winning_lines().is_empty() {
            self.latest_move().into_iter().collect()
        } else {
            let mut cells: Vec<Coord> = self
                .winning_lines()
                .iter()
                .flat_map(|line| line.cells.iter().copied())
                .collect();
            cells.sort();
            cells.dedup();
            cells
        };
        RenderRequest {
            game_id: Connect4Game::game_id(self).to_string(),
            kind: GameKind::Connect4,
            theme: theme.to_string(),
            frame: self.history().len(),
            board: BoardImage::Connect4 {
                grid: self.board().to_grid(),
                highlight,
            },
        }
    }

    fn is_terminal(&self) -> bool {
        Connect4Game::is_terminal(self)
    }

    fn history_blob(&self) -> Result<serde_json::Value, CodecError> {
        Ok(serde_json::to_value(self.history())?)
    }

    fn player_results(&self) -> Vec<PlayerResult> {
        let result = |piece: Piece, outcome: GameOutcome| {
            PlayerResult::new(self.player_id(piece).to_string(), outcome)
        };
        match self.status() {
            Connect4Status::Won(winner) => vec![
                result(winner, GameOutcome::Win),
                result(winner.opponent(), GameOutcome::Loss),
            ],
            Connect4Status::Tied => vec![
                result(Piece::Player1, GameOutcome::Draw),
                result(Piece::Player2, GameOutcome::Draw),
            ],
            Connect4Status::Created | Connect4Status::InProgress => Vec::new(),
        }
    }

    fn moves_played(&self) -> usize {
        self.history().len().saturating_sub(1)
    }

    fn started_at(&self) -> DateTime<Utc> {
        Connect4Game::started_at(self)
    }

    fn ended_at(&self) -> Option<DateTime<Utc>> {
        Connect4Game::ended_at(self)
    }
}

impl SessionGame for MastermindGame {
    fn kind(&self) -> GameKind {
        GameKind::Mastermind
    }

    fn game_id(&self) -> &str {
        MastermindGame::game_id(self)
    }

    #[instrument(skip(self), fields(game_id = %MastermindGame::game_id(self)))]
    fn apply(&mut self, actor: &str, action: GameAction) -> Result<(), MoveRejection> {
        let GameAction::Mastermind(mv) = action else {
            return Err(MoveRejection::WrongGame {
                action: action.kind(),
                game: GameKind::Mastermind,
            });
        };
        let status = self.apply_move(actor, mv)?;
        debug!(%status, board = %self.board().display(), "Mastermind move applied");
        Ok(())
    }

    fn render_request(&self, theme: &str) -> RenderRequest {
        let board = self.board();
        RenderRequest {
            game_id: MastermindGame::game_id(self).to_string(),
            kind: GameKind::Mastermind,
            theme: theme.to_string(),
            frame: self.history().len(),
            board: BoardImage::Mastermind {
                holes: board.holes(),
                colors: board.colors(),
                rows: board.rows().to_vec(),
                secret: MastermindGame::is_terminal(self).then(|| self.secret().to_vec()),
            },
        }
    }

    fn is_terminal(&self) -> bool {
        MastermindGame::is_terminal(self)
    }

    fn history_blob(&self) -> Result<serde_json::Value, CodecError> {
        Ok(serde_json::to_value(self.history())?)
    }

    fn player_results(&self) -> Vec<PlayerResult> {
        let outcome = match self.status() {
            MastermindStatus::Won => GameOutcome::Win,
            MastermindStatus::Lost => GameOutcome::Loss,
            MastermindStatus::Created | MastermindStatus::InProgress => return Vec::new(),
        };
        vec![PlayerResult::new(self.owner().to_string(), outcome)]
    }

    fn moves_played(&self) -> usize {
        self.history().len().saturating_sub(1)
    }

    fn started_at(&self) -> DateTime<Utc> {
        MastermindGame::started_at(self)
    }

    fn ended_at(&self) -> Option<DateTime<Utc>> {
        MastermindGame::ended_at(self)
    }
}

/// Either game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From)]
#[serde(tag = "kind", content = "game", rename_all = "lowercase")]
pub enum AnyGame {
    /// A Connect Four game.
    Connect4(Connect4Game),
    /// A Mastermind game.
    Mastermind(MastermindGame),
}

impl AnyGame {
    /// The game behind its capability set.
    pub fn session(&self) -> &dyn SessionGame {
        match self {
            AnyGame::Connect4(game) => game,
            AnyGame::Mastermind(game) => game,
        }
    }

    /// Mutable access to the capability set.
    pub fn session_mut(&mut self) -> &mut dyn SessionGame {
        match self {
            AnyGame::Connect4(game) => game,
            AnyGame::Mastermind(game) => game,
        }
    }
}

/// A game plus the chat context it needs across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct SessionRecord {
    /// The game.
    game: AnyGame,
    /// Resolved theme name.
    theme: String,
    /// Channel the game was started in.
    channel_id: String,
    /// Display names keyed by player id.
    players: Vec<(String, String)>,
    /// Rendered board URLs, one per history entry.
    #[new(default)]
    frames: Vec<String>,
    /// Player banner shown above a Connect Four board.
    #[new(default)]
    #[serde(default)]
    banner_url: Option<String>,
}

impl SessionRecord {
    /// Mutable access to the game.
    pub fn game_mut(&mut self) -> &mut AnyGame {
        &mut self.game
    }

    /// Records the URL of a newly rendered board.
    pub fn push_frame(&mut self, url: String) {
        self.frames.push(url);
    }

    /// Most recently rendered board.
    pub fn latest_frame(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }

    /// Records the URL of the rendered player banner.
    pub fn set_banner_url(&mut self, url: String) {
        self.banner_url = Some(url);
    }

    /// Banner to render when the game opens; only Connect Four has one.
    pub fn banner_request(&self) -> Option<BannerRequest> {
        let AnyGame::Connect4(game) = &self.game else {
            return None;
        };
        let names = [
            self.display_name(game.player_id(Piece::Player1)),
            self.display_name(game.player_id(Piece::Player2)),
        ];
        Some(BannerRequest::new(
            game.game_id().to_string(),
            self.theme.clone(),
            &names,
        ))
    }

    /// Display name for `player_id`, falling back to the id.
    pub fn display_name<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.players
            .iter()
            .find(|(id, _)| id == player_id)
            .map_or(player_id, |(_, name)| name.as_str())
    }

    /// Serializes the record for the store.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if serialization fails.
    #[instrument(skip(self), fields(game_id = %self.game.session().game_id()))]
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Restores a record read from the store.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the bytes are not a session record.
    #[instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// History entry for a finished game.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the move history cannot be serialized.
    #[instrument(skip(self), fields(game_id = %self.game.session().game_id()))]
    pub fn history_record(&self) -> Result<HistoryRecord, CodecError> {
        let game = self.game.session();
        Ok(HistoryRecord {
            game_id: game.game_id().to_string(),
            kind: game.kind(),
            theme: self.theme.clone(),
            players: game.player_results(),
            moves_count: game.moves_played(),
            started_at: game.started_at(),
            ended_at: game.ended_at().unwrap_or_else(Utc::now),
            recap_url: None,
            history: game.history_blob()?,
        })
    }
}
