//! Background work for finished games.
//!
//! When a game ends the dispatcher submits an [`OutcomeJob`] and returns.
//! A fixed pool of workers then renders the recap, records the history and
//! posts the recap to the channel. Each of those calls is bounded by the
//! collaborator timeout. Failures are logged and dropped.

use crate::history::{HistoryRecord, HistoryRecorder};
use crate::notify::Notifier;
use crate::render::Renderer;
use derive_more::{Display, Error};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A finished game waiting for its recap and history.
#[derive(Debug, Clone)]
pub struct OutcomeJob {
    /// History to persist; the recap URL is filled in by the worker.
    pub history: HistoryRecord,
    /// Rendered boards, in move order.
    pub frames: Vec<String>,
    /// Where to post the recap.
    pub response_url: String,
    /// Text posted alongside the recap.
    pub summary: String,
}

/// Job submission failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum JobError {
    /// Every slot in the queue is taken.
    #[display("Outcome queue is full")]
    QueueFull,
    /// The workers have shut down.
    #[display("Outcome queue is closed")]
    QueueClosed,
}

/// Sending half of the worker pool.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<OutcomeJob>,
}

/// Handles of the spawned workers.
#[derive(Debug)]
pub struct JobWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl JobWorkers {
    /// Waits for every worker to exit.
    ///
    /// Workers exit once every [`JobQueue`] clone is dropped and the queue
    /// is drained.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Outcome worker panicked");
            }
        }
    }
}

/// Collaborators a worker talks to.
#[derive(Clone)]
struct WorkerContext {
    recorder: Arc<dyn HistoryRecorder>,
    notifier: Arc<dyn Notifier>,
    renderer: Arc<dyn Renderer>,
    timeout: Duration,
}

impl JobQueue {
    /// Spawns `workers` workers sharing a queue of `capacity` jobs.
    ///
    /// A worker abandons any collaborator call that takes longer than
    /// `timeout` and moves on to the next step.
    ///
    /// Must be called inside a tokio runtime.
    #[instrument(skip(recorder, notifier, renderer))]
    pub fn spawn(
        workers: usize,
        capacity: usize,
        timeout: Duration,
        recorder: Arc<dyn HistoryRecorder>,
        notifier: Arc<dyn Notifier>,
        renderer: Arc<dyn Renderer>,
    ) -> (Self, JobWorkers) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let context = WorkerContext {
            recorder,
            notifier,
            renderer,
            timeout,
        };

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let context = context.clone();
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => context.run(worker, job).await,
                            None => break,
                        }
                    }
                    debug!(worker, "Outcome worker stopped");
                })
            })
            .collect();

        info!(workers, capacity, "Outcome workers started");
        (Self { sender }, JobWorkers { handles })
    }

    /// Queues a job without waiting.
    ///
    /// # Errors
    ///
    /// [`JobError::QueueFull`] when no slot is free, [`JobError::QueueClosed`]
    /// when the workers are gone.
    #[instrument(skip(self, job), fields(game_id = %job.history.game_id))]
    pub fn submit(&self, job: OutcomeJob) -> Result<(), JobError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => JobError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => JobError::QueueClosed,
        })?;
        debug!("Outcome job queued");
        Ok(())
    }
}

impl WorkerContext {
    #[instrument(skip(self, job), fields(game_id = %job.history.game_id))]
    async fn run(&self, worker: usize, job: OutcomeJob) {
        let OutcomeJob {
            mut history,
            frames,
            response_url,
            summary,
        } = job;

        if !frames.is_empty() {
            let recap = self
                .bounded("renderer", self.renderer.render_recap(&history.game_id, &frames))
                .await;
            match recap {
                Some(Ok(url)) => history.recap_url = Some(url),
                Some(Err(e)) => warn!(error = %e, "Recap render failed"),
                None => {}
            }
        }

        let recorded = self
            .bounded("history", self.recorder.record_history(&history))
            .await;
        if let Some(Err(e)) = recorded {
            warn!(error = %e, "History not recorded");
        }

        let mut payload = json!({
            "response_type": "in_channel",
            "replace_original": false,
            "text": summary,
        });
        if let Some(url) = &history.recap_url {
            payload["blocks"] = json!([
                {"type": "section", "text": {"type": "mrkdwn", "text": summary}},
                {
                    "type": "image",
                    "image_url": url,
                    "title": {"type": "plain_text", "text": "Game Recap"},
                    "alt_text": "Game Recap",
                },
            ]);
        }
        let posted = self
            .bounded("notifier", self.notifier.notify(&response_url, &payload))
            .await;
        match posted {
            Some(Ok(())) => info!(worker, recap = history.recap_url.is_some(), "Outcome posted"),
            Some(Err(e)) => warn!(error = %e, "Outcome not posted"),
            None => {}
        }
    }

    /// `None` once `timeout` elapses; the call is dropped.
    async fn bounded<T>(
        &self,
        collaborator: &'static str,
        call: impl Future<Output = T>,
    ) -> Option<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(value) => Some(value),
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(collaborator, timeout_ms, "Collaborator timed out in outcome worker");
                None
            }
        }
    }
}
