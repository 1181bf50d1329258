//! Board rendering collaborator.
//!
//! The server never draws images itself. It describes the board and which
//! cells to highlight; a render service answers with an image URL.

use crate::error::RenderError;
use crate::session::GameKind;
use async_trait::async_trait;
use breakroom_connect4::Coord;
use breakroom_mastermind::{Color, GuessRow};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Frames per second of the recap animation.
pub const RECAP_FPS: u32 = 2;

/// Longest player name drawn on a banner, in characters.
pub const BANNER_NAME_CHARS: usize = 20;

/// What to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Game the board belongs to.
    pub game_id: String,
    /// Which game.
    pub kind: GameKind,
    /// Theme to draw with.
    pub theme: String,
    /// Position in the history, used to name the image.
    pub frame: usize,
    /// The board itself.
    pub board: BoardImage,
}

/// Board contents in renderer terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardImage {
    /// Connect Four grid, top row first.
    Connect4 {
        /// 0 empty, 1 or 2 for a player.
        grid: Vec<Vec<u8>>,
        /// Latest move, or every winning cell once won.
        highlight: Vec<Coord>,
    },
    /// Mastermind rows.
    Mastermind {
        /// Holes per row.
        holes: usize,
        /// Palette size.
        colors: u8,
        /// Guess rows with feedback.
        rows: Vec<GuessRow>,
        /// Revealed once the game is over.
        secret: Option<Vec<Color>>,
    },
}

/// Banner naming the players of a Connect Four game, shown above the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerRequest {
    /// Game the banner belongs to.
    pub game_id: String,
    /// Theme whose pieces sit next to the names.
    pub theme: String,
    /// Display names in piece order, cut to [`BANNER_NAME_CHARS`].
    pub players: Vec<String>,
}

impl BannerRequest {
    /// Creates a banner request, shortening long names.
    pub fn new(game_id: String, theme: String, players: &[&str]) -> Self {
        Self {
            game_id,
            theme,
            players: players
                .iter()
                .map(|name| name.chars().take(BANNER_NAME_CHARS).collect())
                .collect(),
        }
    }
}

/// Turns board descriptions into image URLs.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders one board.
    async fn render(&self, request: &RenderRequest) -> Result<String, RenderError>;

    /// Renders the player banner of a Connect Four game.
    async fn render_banner(&self, request: &BannerRequest) -> Result<String, RenderError>;

    /// Stitches rendered boards into an animated recap.
    async fn render_recap(&self, game_id: &str, frames: &[String]) -> Result<String, RenderError>;
}

/// Response body of the render service.
#[derive(Debug, Deserialize)]
struct RenderedImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct RecapRequest<'a> {
    game_id: &'a str,
    frames: &'a [String],
    fps: u32,
}

/// [`Renderer`] backed by an HTTP render service.
///
/// `POST {base}/render` takes a [`RenderRequest`], `POST {base}/banner` a
/// [`BannerRequest`] and `POST {base}/recap` the frame URLs. All answer
/// `{"url": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRenderer {
    /// Creates a renderer talking to `base_url`; every request gives up
    /// after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    #[instrument(skip(base_url), fields(base_url = %base_url))]
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RenderError> {
        info!("Creating HTTP renderer");
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, RenderError> {
        let url = self.endpoint(path);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Render service refused request");
            return Err(RenderError::new(format!("{} answered {}", url, status)));
        }
        let image: RenderedImage = response.json().await?;
        debug!(image_url = %image.url, "Image rendered");
        Ok(image.url)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    #[instrument(skip(self, request), fields(game_id = %request.game_id, frame = request.frame))]
    async fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        self.post("render", request).await
    }

    #[instrument(skip(self, request), fields(game_id = %request.game_id))]
    async fn render_banner(&self, request: &BannerRequest) -> Result<String, RenderError> {
        self.post("banner", request).await
    }

    #[instrument(skip(self, frames), fields(frames = frames.len()))]
    async fn render_recap(&self, game_id: &str, frames: &[String]) -> Result<String, RenderError> {
        self.post(
            "recap",
            &RecapRequest {
                game_id,
                frames,
                fps: RECAP_FPS,
            },
        )
        .await
    }
}
