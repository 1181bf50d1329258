//! Move dispatcher: the only writer of the session store.
//!
//! A button press is parsed, the session for its game id is locked and
//! loaded, the move is applied, the new board is rendered and the original
//! message is updated. The store changes only after that update went
//! through, so a failed notification leaves the session exactly as it was.

use crate::config::{Connect4Settings, MastermindSettings, ServerConfig};
use crate::error::{CodecError, NotifyError, RenderError, StoreError};
use crate::jobs::{JobQueue, OutcomeJob};
use crate::message::{Delivery, game_message, outcome_summary};
use crate::notify::Notifier;
use crate::payload::{InteractionPayload, PayloadError};
use crate::render::Renderer;
use crate::session::{AnyGame, GameKind, MoveRejection, SessionRecord};
use crate::store::{KeyedLocks, SessionStore};
use crate::themes::{ThemeCatalog, UnknownTheme};
use breakroom_connect4::{Connect4Game, SetupError};
use breakroom_mastermind::MastermindGame;
use derive_more::{Display, Error, From};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A `/connect4` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartConnect4 {
    /// User who typed the command; moves first.
    pub challenger_id: String,
    /// Challenger's display name.
    pub challenger_name: String,
    /// Mentioned opponent.
    pub opponent_id: String,
    /// Opponent's display name, when the mention carried one.
    pub opponent_name: Option<String>,
    /// Channel the command was typed in.
    pub channel_id: String,
    /// Requested theme, `None` for the default.
    pub theme: Option<String>,
}

/// A `/mastermind` start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMastermind {
    /// User who typed the command and owns the game.
    pub owner_id: String,
    /// Owner's display name.
    pub owner_name: String,
    /// Channel the command was typed in.
    pub channel_id: String,
    /// Requested theme, `None` for the default.
    pub theme: Option<String>,
}

/// A newly created session.
#[derive(Debug, Clone, PartialEq)]
pub struct Started {
    /// Id the session is stored under.
    pub game_id: String,
    /// Message to post in the channel.
    pub message: Value,
}

/// Why a game could not be started.
#[derive(Debug, Display, Error, From)]
pub enum StartError {
    /// The requested theme does not exist.
    #[display("{_0}")]
    UnknownTheme(UnknownTheme),
    /// The challenger mentioned themselves.
    #[display("You cannot play against yourself")]
    #[from(ignore)]
    SelfPlayNotAllowed,
    /// Configured board settings are unusable.
    #[display("Cannot set up game: {_0}")]
    #[from(ignore)]
    InvalidSetup(#[error(not(source))] String),
    /// A collaborator failed while opening the game.
    #[display("{_0}")]
    Dispatch(DispatchError),
}

impl StartError {
    /// Whether the user can fix this by changing the command.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            StartError::UnknownTheme(_) | StartError::SelfPlayNotAllowed
        )
    }
}

/// Why a button press was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IgnoreReason {
    /// No live session under the pressed game id.
    #[display("session not found")]
    SessionNotFound,
}

/// Result of a handled button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The move was applied and the message updated.
    Applied {
        /// Whether the move ended the game.
        terminal: bool,
    },
    /// The game refused the move; the session is unchanged.
    Rejected(MoveRejection),
    /// Nothing was done.
    Ignored(IgnoreReason),
}

/// Request-level failure. The session is unchanged.
#[derive(Debug, Display, Error, From)]
pub enum DispatchError {
    /// The payload is not a usable button press.
    #[display("{_0}")]
    MalformedPayload(PayloadError),
    /// The session store failed.
    #[display("{_0}")]
    Store(StoreError),
    /// The renderer failed.
    #[display("{_0}")]
    Render(RenderError),
    /// The message update failed.
    #[display("{_0}")]
    Notify(NotifyError),
    /// A stored session could not be read or written.
    #[display("{_0}")]
    Codec(CodecError),
    /// A collaborator did not answer in time.
    #[display("{collaborator} did not answer within {timeout_ms} ms")]
    #[from(ignore)]
    Timeout {
        /// Which collaborator.
        collaborator: &'static str,
        /// The bound that was exceeded.
        timeout_ms: u64,
    },
}

/// Owns the session lifecycle: creation, moves and teardown.
pub struct Dispatcher {
    store: Arc<dyn SessionStore>,
    locks: KeyedLocks,
    renderer: Arc<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
    jobs: JobQueue,
    themes: ThemeCatalog,
    connect4: Connect4Settings,
    mastermind: MastermindSettings,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("themes", &self.themes)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Wires a dispatcher to its collaborators, with game settings from `config`.
    pub fn new(
        store: Arc<dyn SessionStore>,
        renderer: Arc<dyn Renderer>,
        notifier: Arc<dyn Notifier>,
        jobs: JobQueue,
        config: &ServerConfig,
    ) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            renderer,
            notifier,
            jobs,
            themes: ThemeCatalog::from_config(config),
            connect4: config.connect4().clone(),
            mastermind: config.mastermind().clone(),
            timeout: config.collaborator_timeout(),
        }
    }

    /// Theme names per game.
    pub fn themes(&self) -> &ThemeCatalog {
        &self.themes
    }

    /// Starts a Connect Four game between the challenger and the mentioned user.
    ///
    /// The player banner is rendered with both display names before the
    /// opening board.
    ///
    /// # Errors
    ///
    /// [`StartError::UnknownTheme`] and [`StartError::SelfPlayNotAllowed`] for
    /// bad commands; [`StartError::Dispatch`] when rendering or storing fails,
    /// in which case nothing is stored.
    #[instrument(skip(self, request), fields(challenger = %request.challenger_id, opponent = %request.opponent_id))]
    pub async fn start_connect4(&self, request: StartConnect4) -> Result<Started, StartError> {
        let theme = self
            .themes
            .resolve(GameKind::Connect4, request.theme.as_deref())?;
        if request.challenger_id == request.opponent_id {
            warn!("Rejected self play");
            return Err(StartError::SelfPlayNotAllowed);
        }

        let game_id = Uuid::new_v4().to_string();
        let mut game = Connect4Game::new(
            game_id.clone(),
            request.challenger_id.clone(),
            request.opponent_id.clone(),
            *self.connect4.rows(),
            *self.connect4.cols(),
        )
        .map_err(|e| match e {
            SetupError::SelfPlayNotAllowed => StartError::SelfPlayNotAllowed,
            other => StartError::InvalidSetup(other.to_string()),
        })?;
        game.start();

        let opponent_name = request
            .opponent_name
            .unwrap_or_else(|| request.opponent_id.clone());
        let record = SessionRecord::new(
            AnyGame::Connect4(game),
            theme,
            request.channel_id,
            vec![
                (request.challenger_id, request.challenger_name),
                (request.opponent_id, opponent_name),
            ],
        );
        Ok(self.open(game_id, record).await?)
    }

    /// Starts a Mastermind game with a fresh random secret.
    ///
    /// # Errors
    ///
    /// [`StartError::UnknownTheme`] for a bad theme, [`StartError::InvalidSetup`]
    /// when the configured board is unusable, [`StartError::Dispatch`] when
    /// rendering or storing fails.
    #[instrument(skip(self, request), fields(owner = %request.owner_id))]
    pub async fn start_mastermind(&self, request: StartMastermind) -> Result<Started, StartError> {
        let theme = self
            .themes
            .resolve(GameKind::Mastermind, request.theme.as_deref())?;

        let game_id = Uuid::new_v4().to_string();
        let mut game = MastermindGame::new(
            game_id.clone(),
            request.owner_id.clone(),
            self.mastermind.board_config(),
            &mut rand::thread_rng(),
        )
        .map_err(|e| StartError::InvalidSetup(e.to_string()))?;
        game.start();

        let record = SessionRecord::new(
            AnyGame::Mastermind(game),
            theme,
            request.channel_id,
            vec![(request.owner_id, request.owner_name)],
        );
        Ok(self.open(game_id, record).await?)
    }

    /// Applies a button press.
    ///
    /// Presses for the same game are handled one at a time, so a duplicate
    /// press sees the result of the first.
    ///
    /// # Errors
    ///
    /// [`DispatchError`] when the payload is malformed or a collaborator
    /// fails. The stored session is unchanged in every error case.
    #[instrument(skip(self, payload), fields(actor = %payload.user.id))]
    pub async fn handle_interaction(
        &self,
        payload: &InteractionPayload,
    ) -> Result<DispatchOutcome, DispatchError> {
        let request = payload.parse_move()?;
        let game_id = request.game_id.as_str();
        let _guard = self.locks.lock(game_id).await;

        let Some(bytes) = self.store.get(game_id).await? else {
            warn!(%game_id, "Button pressed for a session that is not live");
            return Ok(DispatchOutcome::Ignored(IgnoreReason::SessionNotFound));
        };
        let mut record = SessionRecord::decode(&bytes)?;

        let applied = record
            .game_mut()
            .session_mut()
            .apply(&request.actor, request.action);
        if let Err(rejection) = applied {
            warn!(%game_id, %rejection, "Move rejected");
            if let Some(warning) = rejection.inline_warning() {
                self.show_warning(&record, &warning, &payload.response_url)
                    .await;
            }
            return Ok(DispatchOutcome::Rejected(rejection));
        }

        let render_request = record.game().session().render_request(record.theme());
        let url = self
            .bounded("renderer", self.renderer.render(&render_request))
            .await?;
        record.push_frame(url.clone());

        let terminal = record.game().session().is_terminal();
        let encoded = if terminal { None } else { Some(record.encode()?) };

        let message = game_message(
            &record,
            &url,
            None,
            &self.mastermind,
            Delivery::ReplaceOriginal,
        );
        self.bounded(
            "notifier",
            self.notifier.notify(&payload.response_url, &message),
        )
        .await?;

        match encoded {
            Some(bytes) => self.store.put(game_id, bytes).await?,
            None => {
                self.store.delete(game_id).await?;
                info!(%game_id, channel_id = %record.channel_id(), "Game over, session closed");
                self.submit_outcome(&record, &payload.response_url);
            }
        }

        debug!(%game_id, action = %request.action, terminal, "Move dispatched");
        Ok(DispatchOutcome::Applied { terminal })
    }

    async fn open(&self, game_id: String, mut record: SessionRecord) -> Result<Started, DispatchError> {
        if let Some(banner) = record.banner_request() {
            let url = self
                .bounded("renderer", self.renderer.render_banner(&banner))
                .await?;
            record.set_banner_url(url);
        }

        let render_request = record.game().session().render_request(record.theme());
        let url = self
            .bounded("renderer", self.renderer.render(&render_request))
            .await?;
        record.push_frame(url.clone());
        self.store.put(&game_id, record.encode()?).await?;

        info!(
            %game_id,
            kind = %record.game().session().kind(),
            theme = %record.theme(),
            channel_id = %record.channel_id(),
            "Game started"
        );
        let message = game_message(
            &record,
            &url,
            None,
            &self.mastermind,
            Delivery::NewInChannel,
        );
        Ok(Started { game_id, message })
    }

    async fn show_warning(&self, record: &SessionRecord, warning: &str, response_url: &str) {
        let Some(url) = record.latest_frame() else {
            warn!("No rendered board to show the warning with");
            return;
        };
        let message = game_message(
            record,
            url,
            Some(warning),
            &self.mastermind,
            Delivery::ReplaceOriginal,
        );
        if let Err(e) = self
            .bounded("notifier", self.notifier.notify(response_url, &message))
            .await
        {
            warn!(error = %e, "Warning not shown");
        }
    }

    fn submit_outcome(&self, record: &SessionRecord, response_url: &str) {
        let history = match record.history_record() {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "History not built, outcome dropped");
                return;
            }
        };
        let job = OutcomeJob {
            history,
            frames: record.frames().clone(),
            response_url: response_url.to_string(),
            summary: outcome_summary(record, &self.mastermind),
        };
        if let Err(e) = self.jobs.submit(job) {
            warn!(error = %e, "Outcome job dropped");
        }
    }

    async fn bounded<T, E>(
        &self,
        collaborator: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, DispatchError>
    where
        DispatchError: From<E>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(collaborator, timeout_ms, "Collaborator timed out");
                Err(DispatchError::Timeout {
                    collaborator,
                    timeout_ms,
                })
            }
        }
    }
}
