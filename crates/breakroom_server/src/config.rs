//! Server configuration.
//!
//! Loaded from a TOML file where every field has a default, then overridden
//! by `BREAKROOM_*` environment variables.

use breakroom_mastermind::BoardConfig;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding [`ServerConfig::host`].
pub const ENV_HOST: &str = "BREAKROOM_HOST";
/// Environment variable overriding [`ServerConfig::port`].
pub const ENV_PORT: &str = "BREAKROOM_PORT";
/// Environment variable overriding [`ServerConfig::database_path`].
pub const ENV_DATABASE_PATH: &str = "BREAKROOM_DATABASE_PATH";
/// Environment variable overriding [`ServerConfig::render_url`].
pub const ENV_RENDER_URL: &str = "BREAKROOM_RENDER_URL";

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database for game history.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Base URL of the board render service.
    #[serde(default = "default_render_url")]
    render_url: String,

    /// Upper bound on each renderer or notifier call, in milliseconds.
    #[serde(default = "default_collaborator_timeout_ms")]
    collaborator_timeout_ms: u64,

    /// Background workers handling finished games.
    #[serde(default = "default_workers")]
    workers: usize,

    /// Finished games waiting for a worker before submissions are refused.
    #[serde(default = "default_queue_capacity")]
    queue_capacity: usize,

    /// Connect Four settings.
    #[serde(default)]
    connect4: Connect4Settings,

    /// Mastermind settings.
    #[serde(default)]
    mastermind: MastermindSettings,
}

/// Connect Four board size and themes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Connect4Settings {
    /// Board rows.
    #[serde(default = "default_connect4_rows")]
    rows: usize,

    /// Board columns.
    #[serde(default = "default_connect4_cols")]
    cols: usize,

    /// Available theme names.
    #[serde(default = "default_connect4_themes")]
    themes: Vec<String>,
}

/// Mastermind board size, palette and themes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct MastermindSettings {
    /// Holes in the code.
    #[serde(default = "default_mastermind_holes")]
    holes: usize,

    /// Colors to choose from.
    #[serde(default = "default_mastermind_colors")]
    colors: u8,

    /// Guess rows.
    #[serde(default = "default_mastermind_guesses")]
    guesses: usize,

    /// Button labels for each color, by index.
    #[serde(default = "default_color_names")]
    color_names: Vec<String>,

    /// Available theme names.
    #[serde(default = "default_mastermind_themes")]
    themes: Vec<String>,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_database_path() -> String {
    "breakroom.db".to_string()
}

#[instrument]
fn default_render_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

#[instrument]
fn default_collaborator_timeout_ms() -> u64 {
    5_000
}

#[instrument]
fn default_workers() -> usize {
    2
}

#[instrument]
fn default_queue_capacity() -> usize {
    64
}

#[instrument]
fn default_connect4_rows() -> usize {
    breakroom_connect4::DEFAULT_ROWS
}

#[instrument]
fn default_connect4_cols() -> usize {
    breakroom_connect4::DEFAULT_COLS
}

#[instrument]
fn default_connect4_themes() -> Vec<String> {
    ["classic", "halloween", "winter"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[instrument]
fn default_mastermind_holes() -> usize {
    breakroom_mastermind::DEFAULT_HOLES
}

#[instrument]
fn default_mastermind_colors() -> u8 {
    breakroom_mastermind::DEFAULT_COLORS
}

#[instrument]
fn default_mastermind_guesses() -> usize {
    breakroom_mastermind::DEFAULT_GUESSES
}

#[instrument]
fn default_color_names() -> Vec<String> {
    ["Red", "Orange", "Yellow", "Green", "Blue", "Purple"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[instrument]
fn default_mastermind_themes() -> Vec<String> {
    ["classic", "candy"].into_iter().map(String::from).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            render_url: default_render_url(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            connect4: Connect4Settings::default(),
            mastermind: MastermindSettings::default(),
        }
    }
}

impl Default for Connect4Settings {
    fn default() -> Self {
        Self {
            rows: default_connect4_rows(),
            cols: default_connect4_cols(),
            themes: default_connect4_themes(),
        }
    }
}

impl Default for MastermindSettings {
    fn default() -> Self {
        Self {
            holes: default_mastermind_holes(),
            colors: default_mastermind_colors(),
            guesses: default_mastermind_guesses(),
            color_names: default_color_names(),
            themes: default_mastermind_themes(),
        }
    }
}

impl MastermindSettings {
    /// Board size for a new game.
    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            holes: self.holes,
            colors: self.colors,
            guesses: self.guesses,
        }
    }

    /// Button label for color `index`.
    pub fn color_name(&self, index: u8) -> String {
        self.color_names
            .get(usize::from(index))
            .cloned()
            .unwrap_or_else(|| format!("Color {}", u16::from(index) + 1))
    }
}

impl ServerConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML for this schema.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise starts from defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            warn!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies `BREAKROOM_*` overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the port override is not a number.
    #[instrument(skip(self, lookup))]
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            debug!(%host, "Host overridden");
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid {}='{}': {}", ENV_PORT, port, e)))?;
            debug!(port = self.port, "Port overridden");
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            debug!(%path, "Database path overridden");
            self.database_path = path;
        }
        if let Some(url) = lookup(ENV_RENDER_URL) {
            debug!(%url, "Render URL overridden");
            self.render_url = url;
        }
        Ok(self)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override is invalid.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Bound on a single collaborator call.
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
