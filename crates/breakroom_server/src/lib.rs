//! Break Room server - Connect Four and Mastermind played in chat
//!
//! Slash commands start games; button presses in the posted message drive
//! them. Each live game is a session in the [`SessionStore`], owned by the
//! [`Dispatcher`], which applies moves, asks the [`Renderer`] for a board
//! image and updates the chat message through the [`Notifier`].
//!
//! # Architecture
//!
//! - **HTTP**: axum router for slash commands and button presses
//! - **Dispatcher**: per-game locking, move application, store updates
//! - **Collaborators**: board renderer, chat webhook, history recorder
//! - **Jobs**: background workers that record finished games and post recaps
//!
//! # Example
//!
//! ```no_run
//! use breakroom_server::{
//!     AppState, Dispatcher, HistoryRecorder, HistoryRepository, HttpRenderer, JobQueue,
//!     MemoryStore, Notifier, Renderer, ServerConfig, WebhookNotifier, build_router,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let timeout = config.collaborator_timeout();
//! let renderer: Arc<dyn Renderer> =
//!     Arc::new(HttpRenderer::new(config.render_url().clone(), timeout)?);
//! let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new(timeout)?);
//! let recorder: Arc<dyn HistoryRecorder> =
//!     Arc::new(HistoryRepository::new(config.database_path().clone())?);
//! let (jobs, _workers) =
//!     JobQueue::spawn(2, 64, timeout, recorder, notifier.clone(), renderer.clone());
//!
//! let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()), renderer, notifier, jobs, &config);
//! let app = build_router(AppState { dispatcher: Arc::new(dispatcher) });
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod command;
mod config;
mod db;
mod dispatcher;
mod error;
mod history;
mod http;
mod jobs;
mod message;
mod notify;
mod payload;
mod render;
mod session;
mod store;
mod themes;

// Crate-level exports - Configuration
pub use config::{
    ConfigError, Connect4Settings, ENV_DATABASE_PATH, ENV_HOST, ENV_PORT, ENV_RENDER_URL,
    MastermindSettings, ServerConfig,
};

// Crate-level exports - Errors
pub use error::{CodecError, HistoryError, NotifyError, RenderError, StoreError};

// Crate-level exports - Sessions and store
pub use session::{AnyGame, GameAction, GameKind, MoveRejection, SessionGame, SessionRecord};
pub use store::{KeyGuard, KeyedLocks, MemoryStore, SessionStore};

// Crate-level exports - Dispatcher
pub use dispatcher::{
    DispatchError, DispatchOutcome, Dispatcher, IgnoreReason, StartConnect4, StartError,
    StartMastermind, Started,
};

// Crate-level exports - Collaborators
pub use history::{HistoryRecord, HistoryRecorder, PlayerResult};
pub use notify::{Notifier, WebhookNotifier};
pub use render::{
    BANNER_NAME_CHARS, BannerRequest, BoardImage, HttpRenderer, RECAP_FPS, RenderRequest, Renderer,
};

// Crate-level exports - Background jobs
pub use jobs::{JobError, JobQueue, JobWorkers, OutcomeJob};

// Crate-level exports - Themes
pub use themes::{DEFAULT_THEME, ThemeCatalog, UnknownTheme};

// Crate-level exports - Chat surface
pub use command::{
    CONNECT4_HELP, CommandError, Connect4Command, MASTERMIND_HELP, MastermindCommand,
    breakroom_help, parse_connect4, parse_mastermind,
};
pub use http::{ApiError, AppState, build_router};
pub use message::{Delivery, ephemeral, game_message, outcome_summary, themes_message};
pub use payload::{
    CONNECT4_ACTION_PREFIX, InteractionPayload, InteractiveForm, MASTERMIND_ACTION_PREFIX,
    MoveRequest, PayloadAction, PayloadError, PayloadUser, SlashCommand,
};

// Crate-level exports - Database
pub use db::{
    AggregatedStats, DbError, DbErrorKind, GameHistory, GameOutcome, NewGameHistory, NewPlayerResult,
    PlayerResultRow, HistoryRepository,
};
