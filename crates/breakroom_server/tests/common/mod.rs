//! Test doubles shared by the server integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use breakroom_mastermind::{Board, Color, MastermindGame};
use breakroom_server::{
    AnyGame, BannerRequest, Dispatcher, HistoryError, HistoryRecord, HistoryRecorder, InteractionPayload,
    JobQueue, JobWorkers, MemoryStore, NotifyError, Notifier, PayloadAction, PayloadUser,
    RenderError, RenderRequest, Renderer, ServerConfig, SessionRecord, SessionStore,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RESPONSE_URL: &str = "https://hooks.test/respond";

/// Renderer returning predictable URLs, optionally slow or failing.
#[derive(Default)]
pub struct StubRenderer {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
    pub requests: Mutex<Vec<RenderRequest>>,
    pub banners: Mutex<Vec<BannerRequest>>,
}

impl StubRenderer {
    pub fn last_request(&self) -> Option<RenderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn banners(&self) -> Vec<BannerRequest> {
        self.banners.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::new("render service down"));
        }
        Ok(format!(
            "https://img.test/{}/{}.png",
            request.game_id, request.frame
        ))
    }

    async fn render_banner(&self, request: &BannerRequest) -> Result<String, RenderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::new("render service down"));
        }
        self.banners.lock().unwrap().push(request.clone());
        Ok(format!("https://img.test/{}/banner.png", request.game_id))
    }

    async fn render_recap(&self, game_id: &str, frames: &[String]) -> Result<String, RenderError> {
        Ok(format!("https://img.test/{}/recap-{}.gif", game_id, frames.len()))
    }
}

/// Notifier that never answers.
#[derive(Default)]
pub struct HangingNotifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Notifier for HangingNotifier {
    async fn notify(&self, _channel: &str, _payload: &Value) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Notifier remembering every payload, optionally failing.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Value)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, channel: &str, payload: &Value) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::new("webhook refused"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.clone()));
        Ok(())
    }
}

/// History recorder keeping records in memory.
#[derive(Default)]
pub struct RecordingRecorder {
    pub records: Mutex<Vec<HistoryRecord>>,
}

#[async_trait]
impl HistoryRecorder for RecordingRecorder {
    async fn record_history(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A dispatcher wired to doubles.
pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<MemoryStore>,
    pub renderer: Arc<StubRenderer>,
    pub notifier: Arc<RecordingNotifier>,
    pub recorder: Arc<RecordingRecorder>,
    pub workers: JobWorkers,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let renderer = Arc::new(StubRenderer::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let recorder = Arc::new(RecordingRecorder::default());
        let (jobs, workers) = JobQueue::spawn(
            1,
            8,
            config.collaborator_timeout(),
            recorder.clone(),
            notifier.clone(),
            renderer.clone(),
        );
        let dispatcher = Dispatcher::new(
            store.clone(),
            renderer.clone(),
            notifier.clone(),
            jobs,
            &config,
        );
        Self {
            dispatcher: Arc::new(dispatcher),
            store,
            renderer,
            notifier,
            recorder,
            workers,
        }
    }

    /// Stores a Mastermind game for `owner` whose secret is colors 0, 1, 2, 3.
    pub async fn seed_mastermind(&self, game_id: &str, owner: &str) -> Vec<u8> {
        self.seed_mastermind_with_guesses(game_id, owner, 6).await
    }

    /// Same as [`Harness::seed_mastermind`] with `guesses` rows.
    pub async fn seed_mastermind_with_guesses(
        &self,
        game_id: &str,
        owner: &str,
        guesses: usize,
    ) -> Vec<u8> {
        let board = Board::with_secret(vec![Color(0), Color(1), Color(2), Color(3)], 6, guesses)
            .unwrap();
        let mut game = MastermindGame::with_board(game_id.into(), owner.into(), board);
        game.start();
        let mut record = SessionRecord::new(
            AnyGame::Mastermind(game),
            "classic".into(),
            "C1".into(),
            vec![(owner.into(), "alice".into())],
        );
        record.push_frame(format!("https://img.test/{}/1.png", game_id));
        let bytes = record.encode().unwrap();
        self.store.put(game_id, bytes.clone()).await.unwrap();
        bytes
    }

    /// Drops the dispatcher and waits for queued outcome jobs to finish.
    pub async fn drain(self) -> (Arc<RecordingNotifier>, Arc<RecordingRecorder>) {
        let Harness {
            dispatcher,
            notifier,
            recorder,
            workers,
            ..
        } = self;
        drop(dispatcher);
        tokio::time::timeout(Duration::from_secs(5), workers.join())
            .await
            .unwrap();
        (notifier, recorder)
    }
}

pub fn press(user: &str, action_id: &str, game_id: &str, value: &str) -> InteractionPayload {
    InteractionPayload {
        user: PayloadUser {
            id: user.into(),
            name: None,
        },
        actions: vec![PayloadAction {
            action_id: action_id.into(),
            block_id: game_id.into(),
            value: value.into(),
        }],
        response_url: RESPONSE_URL.into(),
    }
}

pub fn connect4_press(user: &str, game_id: &str, column: usize) -> InteractionPayload {
    press(
        user,
        &format!("connect4-move-{}", column),
        game_id,
        &column.to_string(),
    )
}

pub fn mastermind_press(user: &str, game_id: &str, value: i64) -> InteractionPayload {
    let suffix = match value {
        -1 => "undo".to_string(),
        -2 => "submit".to_string(),
        n => n.to_string(),
    };
    press(
        user,
        &format!("mastermind-move-{}", suffix),
        game_id,
        &value.to_string(),
    )
}

/// Every mrkdwn text in a message's blocks.
pub fn block_texts(message: &Value) -> Vec<String> {
    message["blocks"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"]["text"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
