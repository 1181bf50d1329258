//! Inbound chat platform payloads.
//!
//! Slash commands arrive form-encoded. Button presses arrive as a form with a
//! single `payload` field holding JSON; the game id travels in the
//! `block_id` of the pressed button's block.

use crate::session::GameAction;
use breakroom_connect4::Column;
use breakroom_mastermind::Move;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// `action_id` prefix of Connect Four buttons.
pub const CONNECT4_ACTION_PREFIX: &str = "connect4-move-";

/// `action_id` prefix of Mastermind buttons.
pub const MASTERMIND_ACTION_PREFIX: &str = "mastermind-move-";

/// A slash command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Invoking user id.
    pub user_id: String,
    /// Invoking user name.
    #[serde(default)]
    pub user_name: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// Workspace id.
    #[serde(default)]
    pub team_id: String,
    /// Channel the command was typed in.
    #[serde(default)]
    pub channel_id: String,
    /// URL for delayed responses.
    #[serde(default)]
    pub response_url: String,
}

/// The form wrapping a button press.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractiveForm {
    /// JSON-encoded [`InteractionPayload`].
    pub payload: String,
}

/// A button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPayload {
    /// Who pressed.
    pub user: PayloadUser,
    /// Pressed buttons; the first one counts.
    #[serde(default)]
    pub actions: Vec<PayloadAction>,
    /// URL that updates the message holding the button.
    pub response_url: String,
}

/// The pressing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadUser {
    /// User id.
    pub id: String,
    /// User name, when sent.
    #[serde(default)]
    pub name: Option<String>,
}

/// One pressed button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadAction {
    /// Button id, prefixed by game.
    pub action_id: String,
    /// Id of the block holding the button: the game id.
    #[serde(default)]
    pub block_id: String,
    /// Button value.
    #[serde(default)]
    pub value: String,
}

/// A validated move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    /// Session to apply it to.
    pub game_id: String,
    /// Who pressed.
    pub actor: String,
    /// What was pressed.
    pub action: GameAction,
}

/// A payload that is not a usable button press.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum PayloadError {
    /// The payload field is not valid JSON for a button press.
    #[display("Invalid interaction payload: {_0}")]
    InvalidJson(#[error(not(source))] String),
    /// No button was pressed.
    #[display("Interaction has no action")]
    NoAction,
    /// The button does not belong to a game.
    #[display("Unknown action '{_0}'")]
    UnknownAction(#[error(not(source))] String),
    /// The button carries no game id.
    #[display("Action '{_0}' has no game id")]
    MissingGameId(#[error(not(source))] String),
    /// The button value does not decode to a move.
    #[display("Action '{action_id}' has invalid value '{value}'")]
    InvalidValue {
        /// Button id.
        action_id: String,
        /// Offending value.
        value: String,
    },
}

impl InteractionPayload {
    /// Decodes the JSON carried in the `payload` form field.
    ///
    /// # Errors
    ///
    /// [`PayloadError::InvalidJson`] if the text is not a button press.
    #[instrument(skip(json), fields(len = json.len()))]
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(json).map_err(|e| PayloadError::InvalidJson(e.to_string()))
    }

    /// Extracts `(game_id, actor, move)` from the first action.
    ///
    /// # Errors
    ///
    /// [`PayloadError`] describing what is missing or malformed.
    #[instrument(skip(self), fields(actor = %self.user.id))]
    pub fn parse_move(&self) -> Result<MoveRequest, PayloadError> {
        let action = self.actions.first().ok_or(PayloadError::NoAction)?;
        if action.block_id.is_empty() {
            return Err(PayloadError::MissingGameId(action.action_id.clone()));
        }
        let invalid = || PayloadError::InvalidValue {
            action_id: action.action_id.clone(),
            value: action.value.clone(),
        };

        let game_action = if action.action_id.starts_with(CONNECT4_ACTION_PREFIX) {
            let column = action
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(Column::from_one_based)
                .ok_or_else(invalid)?;
            GameAction::Connect4(column)
        } else if action.action_id.starts_with(MASTERMIND_ACTION_PREFIX) {
            let mv = action
                .value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Move::from_value)
                .ok_or_else(invalid)?;
            GameAction::Mastermind(mv)
        } else {
            return Err(PayloadError::UnknownAction(action.action_id.clone()));
        };

        debug!(game_id = %action.block_id, action = %game_action, "Move request parsed");
        Ok(MoveRequest {
            game_id: action.block_id.clone(),
            actor: self.user.id.clone(),
            action: game_action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakroom_mastermind::Color;
    use serde_json::json;

    fn payload(action_id: &str, block_id: &str, value: &str) -> InteractionPayload {
        serde_json::from_value(json!({
            "type": "block_actions",
            "user": {"id": "U1", "name": "alice"},
            "response_url": "https://hooks.test/r/1",
            "actions": [{"action_id": action_id, "block_id": block_id, "value": value}],
        }))
        .unwrap()
    }

    #[test]
    fn test_connect4_move() {
        let request = payload("connect4-move-3", "g1", "3").parse_move().unwrap();
        assert_eq!(request.game_id, "g1");
        assert_eq!(request.actor, "U1");
        assert_eq!(
            request.action,
            GameAction::Connect4(Column::from_one_based(3).unwrap())
        );
    }

    #[test]
    fn test_mastermind_moves() {
        let undo = payload("mastermind-move-undo", "g1", "-1").parse_move().unwrap();
        assert_eq!(undo.action, GameAction::Mastermind(Move::Undo));
        let submit = payload("mastermind-move-submit", "g1", "-2").parse_move().unwrap();
        assert_eq!(submit.action, GameAction::Mastermind(Move::Submit));
        let color = payload("mastermind-move-4", "g1", "4").parse_move().unwrap();
        assert_eq!(color.action, GameAction::Mastermind(Move::Color(Color(4))));
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            payload("connect4-move-0", "g1", "0").parse_move(),
            Err(PayloadError::InvalidValue { .. })
        ));
        assert!(matches!(
            payload("mastermind-move-x", "g1", "-7").parse_move(),
            Err(PayloadError::InvalidValue { .. })
        ));
        assert_eq!(
            payload("poll-vote", "g1", "1").parse_move(),
            Err(PayloadError::UnknownAction("poll-vote".into()))
        );
        assert!(matches!(
            payload("connect4-move-1", "", "1").parse_move(),
            Err(PayloadError::MissingGameId(_))
        ));
    }

    #[test]
    fn test_no_action() {
        let payload: InteractionPayload = serde_json::from_value(json!({
            "user": {"id": "U1"},
            "response_url": "https://hooks.test/r/1",
        }))
        .unwrap();
        assert_eq!(payload.parse_move(), Err(PayloadError::NoAction));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            InteractionPayload::from_json("{"),
            Err(PayloadError::InvalidJson(_))
        ));
    }
}
