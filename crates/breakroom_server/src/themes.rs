//! Theme catalogs per game kind.

use crate::config::ServerConfig;
use crate::session::GameKind;
use derive_more::{Display, Error};
use tracing::{debug, instrument, warn};

/// Theme used when a start command names none.
pub const DEFAULT_THEME: &str = "classic";

/// A start command named a theme the catalog does not have.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("The theme *{name}* is not found. Available {kind} themes: {}", available.join(", "))]
pub struct UnknownTheme {
    /// Game the theme was requested for.
    pub kind: GameKind,
    /// Requested name.
    pub name: String,
    /// Names that would have been accepted.
    pub available: Vec<String>,
}

/// Known theme names for each game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeCatalog {
    connect4: Vec<String>,
    mastermind: Vec<String>,
}

impl ThemeCatalog {
    /// Builds a catalog; [`DEFAULT_THEME`] is always available.
    #[instrument]
    pub fn new(connect4: Vec<String>, mastermind: Vec<String>) -> Self {
        Self {
            connect4: with_default(connect4),
            mastermind: with_default(mastermind),
        }
    }

    /// Catalog from the configured theme lists.
    #[instrument(skip(config))]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.connect4().themes().clone(),
            config.mastermind().themes().clone(),
        )
    }

    /// Theme names for `kind`.
    pub fn themes(&self, kind: GameKind) -> &[String] {
        match kind {
            GameKind::Connect4 => &self.connect4,
            GameKind::Mastermind => &self.mastermind,
        }
    }

    /// Resolves a requested theme, case-insensitively.
    ///
    /// `None` selects [`DEFAULT_THEME`]. Unknown names are rejected, never
    /// replaced by the default.
    ///
    /// # Errors
    ///
    /// [`UnknownTheme`] listing the available names.
    #[instrument(skip(self))]
    pub fn resolve(&self, kind: GameKind, requested: Option<&str>) -> Result<String, UnknownTheme> {
        let name = requested.map(str::trim).unwrap_or(DEFAULT_THEME);
        let available = self.themes(kind);
        match available.iter().find(|theme| theme.eq_ignore_ascii_case(name)) {
            Some(theme) => {
                debug!(%theme, "Theme resolved");
                Ok(theme.clone())
            }
            None => {
                warn!(%kind, name, "Unknown theme requested");
                Err(UnknownTheme {
                    kind,
                    name: name.to_string(),
                    available: available.to_vec(),
                })
            }
        }
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

fn with_default(mut themes: Vec<String>) -> Vec<String> {
    if !themes.iter().any(|t| t.eq_ignore_ascii_case(DEFAULT_THEME)) {
        themes.insert(0, DEFAULT_THEME.to_string());
    }
    themes
}
