//! Slash command text parsing and help messages.

use derive_more::{Display, Error};
use tracing::{debug, instrument};

/// Help for `/connect4`.
pub const CONNECT4_HELP: &str = "*_Usage_*
> This help message
> \t `/connect4 help`
> To list Themes:
> \t `/connect4 themes`
> Start a game:
> \t`/connect4 @user ThemeName`
> \t\t`@user` is who to play with
> \t\t`ThemeName` is for a custom theme, if not passed in \"classic\" will be used

*_Rules_*
> Try and get 4 of your color in a row";

/// Help for `/mastermind`.
pub const MASTERMIND_HELP: &str = "*_Usage_*
> This help message
> \t `/mastermind help`
> To list Themes:
> \t `/mastermind themes`
> Start a game:
> \t`/mastermind ThemeName`
> \t\t`ThemeName` is for a custom theme, if not passed in \"classic\" will be used

*_Rules_*
> Try and guess the code. Once you pick your colors press submit and feedback will appear.
> *Black* peg means that a peg is the correct color and position
> *White* peg means that a peg is the correct color, but wrong position";

/// Help for `/breakroom`, covering every game.
pub fn breakroom_help() -> String {
    format!(
        "Welcome to the Break Room! Take a break and play a game in chat.\n*Connect 4*\n{}\n\n*Mastermind*\n{}\n",
        CONNECT4_HELP, MASTERMIND_HELP
    )
}

/// A parsed `/connect4` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connect4Command {
    /// Show usage.
    Help,
    /// List themes.
    Themes,
    /// Challenge another user.
    Start {
        /// Mentioned user id.
        opponent_id: String,
        /// Mentioned user's name, when the mention carried one.
        opponent_name: Option<String>,
        /// Requested theme.
        theme: Option<String>,
    },
}

/// A parsed `/mastermind` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MastermindCommand {
    /// Show usage.
    Help,
    /// List themes.
    Themes,
    /// Start a game.
    Start {
        /// Requested theme.
        theme: Option<String>,
    },
}

/// Command text that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CommandError {
    /// `/connect4` without a mention.
    #[display("Mention who you want to play with, like `/connect4 @user`")]
    MissingOpponent,
    /// More words than the command takes.
    #[display("Unexpected text `{_0}`, see `help` for usage")]
    TrailingText(#[error(not(source))] String),
}

/// Parses the text after `/connect4`.
///
/// Empty text and `help` show usage. A start needs a mention in the chat
/// platform's `<@ID|name>` or `<@ID>` form, optionally followed by a theme.
#[instrument]
pub fn parse_connect4(text: &str) -> Result<Connect4Command, CommandError> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(Connect4Command::Help);
    };
    if first.eq_ignore_ascii_case("help") {
        return Ok(Connect4Command::Help);
    }
    if first.eq_ignore_ascii_case("themes") {
        return Ok(Connect4Command::Themes);
    }

    let (opponent_id, opponent_name) = parse_mention(first).ok_or(CommandError::MissingOpponent)?;
    let theme = words.next().map(str::to_string);
    reject_rest(words)?;

    debug!(%opponent_id, ?theme, "Parsed connect4 start");
    Ok(Connect4Command::Start {
        opponent_id,
        opponent_name,
        theme,
    })
}

/// Parses the text after `/mastermind`.
///
/// Empty text starts a game in the default theme; one word names a theme.
#[instrument]
pub fn parse_mastermind(text: &str) -> Result<MastermindCommand, CommandError> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(MastermindCommand::Start { theme: None });
    };
    if first.eq_ignore_ascii_case("help") {
        return Ok(MastermindCommand::Help);
    }
    if first.eq_ignore_ascii_case("themes") {
        return Ok(MastermindCommand::Themes);
    }
    reject_rest(words)?;
    Ok(MastermindCommand::Start {
        theme: Some(first.to_string()),
    })
}

fn parse_mention(word: &str) -> Option<(String, Option<String>)> {
    let inner = word.strip_prefix("<@")?.strip_suffix('>')?;
    let (id, name) = match inner.split_once('|') {
        Some((id, name)) => (id, Some(name.to_string()).filter(|n| !n.is_empty())),
        None => (inner, None),
    };
    (!id.is_empty()).then(|| (id.to_string(), name))
}

fn reject_rest<'a>(rest: impl Iterator<Item = &'a str>) -> Result<(), CommandError> {
    let rest: Vec<&str> = rest.collect();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::TrailingText(rest.join(" ")))
    }
}
