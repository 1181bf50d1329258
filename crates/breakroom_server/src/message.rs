//! Chat messages built from game state.
//!
//! Messages are block-kit JSON. The block holding the move buttons carries
//! the game id as its `block_id`, which is how a button press finds its
//! session again.

use crate::config::MastermindSettings;
use crate::payload::{CONNECT4_ACTION_PREFIX, MASTERMIND_ACTION_PREFIX};
use crate::session::{AnyGame, GameKind, SessionRecord};
use breakroom_connect4::{Connect4Game, GameStatus as Connect4Status};
use breakroom_mastermind::{GameStatus as MastermindStatus, MastermindGame, SUBMIT_VALUE, UNDO_VALUE};
use serde_json::{Value, json};

const FOOTER: &str = "Break Room: take a break and play a game in chat.";
const MASTERMIND_PROMPT: &str = "Guess the code...";
const BOARD_TITLE: &str = "Game Board";

/// How the message reaches the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Posted as a new message visible to the channel.
    NewInChannel,
    /// Replaces the message holding the pressed button.
    ReplaceOriginal,
}

/// Full game message for the current state.
///
/// `warning` replaces the status line, for rejected Mastermind moves.
pub fn game_message(
    record: &SessionRecord,
    board_url: &str,
    warning: Option<&str>,
    colors: &MastermindSettings,
    delivery: Delivery,
) -> Value {
    let blocks = match record.game() {
        AnyGame::Connect4(game) => connect4_blocks(game, record.banner_url().as_deref(), board_url),
        AnyGame::Mastermind(game) => mastermind_blocks(game, board_url, warning, colors),
    };
    match delivery {
        Delivery::NewInChannel => json!({"response_type": "in_channel", "blocks": blocks}),
        Delivery::ReplaceOriginal => json!({"replace_original": true, "blocks": blocks}),
    }
}

/// Text posted with the recap of a finished game.
pub fn outcome_summary(record: &SessionRecord, colors: &MastermindSettings) -> String {
    match record.game() {
        AnyGame::Connect4(game) => match game.status() {
            Connect4Status::Won(winner) => format!(
                "<@{}> beat <@{}> at Connect 4 in {} moves",
                game.player_id(winner),
                game.player_id(winner.opponent()),
                game.history().len().saturating_sub(1)
            ),
            Connect4Status::Tied => format!(
                "Connect 4 between <@{}> and <@{}> ended in a tie",
                game.player_id(breakroom_connect4::Piece::Player1),
                game.player_id(breakroom_connect4::Piece::Player2)
            ),
            Connect4Status::Created | Connect4Status::InProgress => {
                format!("Connect 4 game {} is still running", game.game_id())
            }
        },
        AnyGame::Mastermind(game) => match game.status() {
            MastermindStatus::Won => format!(
                "<@{}> cracked the code in {} guesses",
                game.owner(),
                game.guesses_used()
            ),
            MastermindStatus::Lost => format!(
                "<@{}> ran out of guesses, the code was {}",
                game.owner(),
                secret_names(game, colors)
            ),
            MastermindStatus::Created | MastermindStatus::InProgress => {
                format!("Mastermind game {} is still running", game.game_id())
            }
        },
    }
}

/// Private reply visible only to the invoking user.
pub fn ephemeral(text: impl Into<String>) -> Value {
    json!({"response_type": "ephemeral", "text": text.into()})
}

/// Private reply listing the themes for `kind`.
pub fn themes_message(kind: GameKind, themes: &[String]) -> Value {
    let list: Vec<String> = themes.iter().map(|t| format!("> `{}`", t)).collect();
    ephemeral(format!("*Available {} themes*\n{}", kind, list.join("\n")))
}

fn connect4_blocks(game: &Connect4Game, banner_url: Option<&str>, board_url: &str) -> Vec<Value> {
    let status = match game.status() {
        Connect4Status::Won(winner) => format!("<@{}> WON!!!", game.player_id(winner)),
        Connect4Status::Tied => "It's a Tie!".to_string(),
        Connect4Status::Created | Connect4Status::InProgress => {
            format!("<@{}>'s Turn", game.current_player())
        }
    };
    let header = format!(
        "<@{}> & <@{}>",
        game.player_id(breakroom_connect4::Piece::Player1),
        game.player_id(breakroom_connect4::Piece::Player2)
    );

    let mut blocks = vec![section(&header)];
    if let Some(url) = banner_url {
        blocks.push(image(url, "Player Banner"));
    }
    blocks.push(image(board_url, BOARD_TITLE));
    if !game.is_terminal() {
        let buttons: Vec<Value> = (1..=game.board().cols())
            .map(|n| button(&format!("{}{}", CONNECT4_ACTION_PREFIX, n), &n.to_string(), &n.to_string()))
            .collect();
        blocks.push(actions(game.game_id(), buttons));
    }
    blocks.push(section(&status));
    blocks.push(footer());
    blocks
}

fn mastermind_blocks(
    game: &MastermindGame,
    board_url: &str,
    warning: Option<&str>,
    colors: &MastermindSettings,
) -> Vec<Value> {
    let status = match game.status() {
        MastermindStatus::Won => ":tada: *You won!!* :confetti_ball:".to_string(),
        MastermindStatus::Lost => format!(
            ":disappointed: *You failed to guess the code of {}!* :skull_and_crossbones:",
            secret_names(game, colors)
        ),
        MastermindStatus::Created | MastermindStatus::InProgress => {
            warning.unwrap_or(MASTERMIND_PROMPT).to_string()
        }
    };

    let mut blocks = vec![
        section(&format!("<@{}>'s game", game.owner())),
        image(board_url, BOARD_TITLE),
    ];
    if !game.is_terminal() {
        let mut buttons = vec![button(
            &format!("{}undo", MASTERMIND_ACTION_PREFIX),
            "Undo",
            &UNDO_VALUE.to_string(),
        )];
        buttons.extend((0..game.board().colors()).map(|c| {
            button(
                &format!("{}{}", MASTERMIND_ACTION_PREFIX, c),
                &colors.color_name(c),
                &c.to_string(),
            )
        }));
        buttons.push(button(
            &format!("{}submit", MASTERMIND_ACTION_PREFIX),
            "Submit",
            &SUBMIT_VALUE.to_string(),
        ));
        blocks.push(actions(game.game_id(), buttons));
    }
    blocks.push(section(&status));
    blocks.push(footer());
    blocks
}

fn secret_names(game: &MastermindGame, colors: &MastermindSettings) -> String {
    game.secret()
        .iter()
        .map(|c| colors.color_name(c.0))
        .collect::<Vec<_>>()
        .join(", ")
}

fn section(text: &str) -> Value {
    json!({"type": "section", "text": {"type": "mrkdwn", "text": text}})
}

fn image(url: &str, title: &str) -> Value {
    json!({
        "type": "image",
        "image_url": url,
        "title": {"type": "plain_text", "text": title},
        "alt_text": title,
    })
}

fn actions(game_id: &str, elements: Vec<Value>) -> Value {
    json!({"type": "actions", "block_id": game_id, "elements": elements})
}

fn button(action_id: &str, text: &str, value: &str) -> Value {
    json!({
        "type": "button",
        "action_id": action_id,
        "text": {"type": "plain_text", "text": text},
        "value": value,
    })
}

fn footer() -> Value {
    json!({"type": "context", "elements": [{"type": "mrkdwn", "text": FOOTER}]})
}
