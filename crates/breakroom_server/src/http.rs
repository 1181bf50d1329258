//! HTTP surface for the chat platform.
//!
//! Slash commands and button presses arrive form-encoded. Mistakes a user
//! can fix are answered with a private message and status 200; collaborator
//! failures map to 5xx.

use crate::command::{
    CONNECT4_HELP, Connect4Command, MASTERMIND_HELP, MastermindCommand, breakroom_help,
    parse_connect4, parse_mastermind,
};
use crate::dispatcher::{
    DispatchError, DispatchOutcome, Dispatcher, StartConnect4, StartError, StartMastermind,
};
use crate::message::{ephemeral, themes_message};
use crate::payload::{InteractionPayload, InteractiveForm, SlashCommand};
use crate::session::GameKind;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The session owner.
    pub dispatcher: Arc<Dispatcher>,
}

/// Builds the router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/slack/breakroom", post(breakroom_handler))
        .route("/slack/connect4", post(connect4_handler))
        .route("/slack/mastermind", post(mastermind_handler))
        .route("/slack/interactive", post(interactive_handler))
        .with_state(state)
}

async fn healthcheck() -> Json<Value> {
    Json(json!({"success": true}))
}

fn help_message(text: impl Into<String>) -> Json<Value> {
    Json(json!({"replace_original": true, "text": text.into()}))
}

#[instrument(skip_all, fields(user = %command.user_id))]
async fn breakroom_handler(Form(command): Form<SlashCommand>) -> Json<Value> {
    debug!("Help requested");
    help_message(breakroom_help())
}

#[instrument(skip_all, fields(user = %command.user_id, channel = %command.channel_id))]
async fn connect4_handler(
    State(state): State<AppState>,
    Form(command): Form<SlashCommand>,
) -> Result<Json<Value>, ApiError> {
    let parsed = match parse_connect4(&command.text) {
        Ok(parsed) => parsed,
        Err(e) => return Ok(Json(ephemeral(e.to_string()))),
    };
    match parsed {
        Connect4Command::Help => Ok(help_message(CONNECT4_HELP)),
        Connect4Command::Themes => Ok(Json(themes_message(
            GameKind::Connect4,
            state.dispatcher.themes().themes(GameKind::Connect4),
        ))),
        Connect4Command::Start {
            opponent_id,
            opponent_name,
            theme,
        } => {
            let request = StartConnect4 {
                challenger_id: command.user_id,
                challenger_name: command.user_name,
                opponent_id,
                opponent_name,
                channel_id: command.channel_id,
                theme,
            };
            started(state.dispatcher.start_connect4(request).await)
        }
    }
}

#[instrument(skip_all, fields(user = %command.user_id, channel = %command.channel_id))]
async fn mastermind_handler(
    State(state): State<AppState>,
    Form(command): Form<SlashCommand>,
) -> Result<Json<Value>, ApiError> {
    let parsed = match parse_mastermind(&command.text) {
        Ok(parsed) => parsed,
        Err(e) => return Ok(Json(ephemeral(e.to_string()))),
    };
    match parsed {
        MastermindCommand::Help => Ok(help_message(MASTERMIND_HELP)),
        MastermindCommand::Themes => Ok(Json(themes_message(
            GameKind::Mastermind,
            state.dispatcher.themes().themes(GameKind::Mastermind),
        ))),
        MastermindCommand::Start { theme } => {
            let request = StartMastermind {
                owner_id: command.user_id,
                owner_name: command.user_name,
                channel_id: command.channel_id,
                theme,
            };
            started(state.dispatcher.start_mastermind(request).await)
        }
    }
}

fn started(result: Result<crate::dispatcher::Started, StartError>) -> Result<Json<Value>, ApiError> {
    match result {
        Ok(started) => {
            info!(game_id = %started.game_id, "Game posted");
            Ok(Json(started.message))
        }
        Err(e) if e.is_user_error() => Ok(Json(ephemeral(e.to_string()))),
        Err(StartError::Dispatch(e)) => Err(ApiError::from(e)),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

#[instrument(skip_all)]
async fn interactive_handler(
    State(state): State<AppState>,
    Form(form): Form<InteractiveForm>,
) -> Result<StatusCode, ApiError> {
    let payload = InteractionPayload::from_json(&form.payload)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    match state.dispatcher.handle_interaction(&payload).await? {
        DispatchOutcome::Applied { terminal } => debug!(terminal, "Press applied"),
        DispatchOutcome::Rejected(rejection) => debug!(%rejection, "Press rejected"),
        DispatchOutcome::Ignored(reason) => debug!(%reason, "Press ignored"),
    }
    Ok(StatusCode::OK)
}

/// Error response with a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match &e {
            DispatchError::MalformedPayload(_) => Self::bad_request(e.to_string()),
            DispatchError::Codec(_) => Self::internal(e.to_string()),
            DispatchError::Store(_)
            | DispatchError::Render(_)
            | DispatchError::Notify(_)
            | DispatchError::Timeout { .. } => Self::bad_gateway(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, message = %self.message, "Request failed");
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}
