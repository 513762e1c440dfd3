//! Submit-and-poll driver.
//!
//! [`Poller::run`] submits a video and, when the server defers the job,
//! polls its status every [`PollConfig::interval`] for at most
//! [`PollConfig::max_attempts`] attempts. Progress is published on two
//! watch channels: the coarse [`PollerState`] and a cosmetic percentage.
//!
//! Only one run should be live per poller. [`PollSession`] enforces that by
//! cancelling the previous run whenever a new one starts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use soraclean_core::video_url::validate_video_url;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, Artifact, ClientError, StatusReport, SubmitReply};
use crate::progress::{ProgressTicker, DEFAULT_TICK};
use crate::state::PollerState;

/// Default delay before each status request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of status requests before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Polling cadence.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Period of the cosmetic progress ticker.
    pub progress_tick: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            progress_tick: DEFAULT_TICK,
        }
    }
}

/// Why a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The video URL was rejected locally.
    InvalidUrl,
    /// The session is missing or expired; the user must log in again.
    Unauthorized,
    /// The user has no credits and must buy a plan.
    PurchaseRequired,
    /// The server or provider reported a failure.
    Server,
    /// The task finished in the failed state.
    Processing,
}

/// Final result of [`Poller::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded(Artifact),
    Failed {
        kind: FailureKind,
        message: String,
    },
    /// The attempt budget ran out before the task finished. The job may
    /// still complete; the task id lets the user check later.
    TimedOut {
        task_id: String,
        dashboard_url: Option<String>,
    },
    Cancelled,
}

impl PollOutcome {
    fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        PollOutcome::Failed {
            kind,
            message: message.into(),
        }
    }

    /// The observable state matching this outcome.
    pub fn final_state(&self) -> PollerState {
        match self {
            PollOutcome::Succeeded(_) => PollerState::Succeeded,
            PollOutcome::Failed { message, .. } => PollerState::Failed {
                message: message.clone(),
            },
            PollOutcome::TimedOut { task_id, .. } => PollerState::TimedOut {
                task_id: task_id.clone(),
            },
            PollOutcome::Cancelled => PollerState::Cancelled,
        }
    }
}

/// Drives submissions against one [`ApiClient`].
pub struct Poller {
    client: ApiClient,
    config: PollConfig,
    state: watch::Sender<PollerState>,
    progress: Arc<watch::Sender<u8>>,
    /// Incremented by every run. Only the newest run may publish state.
    generation: AtomicU64,
}

impl Poller {
    pub fn new(client: ApiClient, config: PollConfig) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        let (progress, _) = watch::channel(0u8);
        Self {
            client,
            config,
            state,
            progress: Arc::new(progress),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    /// Subscribe to the cosmetic progress percentage.
    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> PollerState {
        self.state.borrow().clone()
    }

    /// Submit `video_url` and follow it to a terminal outcome.
    pub async fn run(&self, video_url: &str, cancel: CancellationToken) -> PollOutcome {
        let generation = self.next_generation();
        self.run_as(generation, video_url, cancel).await
    }

    /// Claim the right to publish state. Earlier runs go quiet.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn run_as(
        &self,
        generation: u64,
        video_url: &str,
        cancel: CancellationToken,
    ) -> PollOutcome {
        let outcome = self.drive(generation, video_url, &cancel).await;

        match &outcome {
            PollOutcome::Succeeded(artifact) => {
                tracing::info!(bytes = artifact.bytes.len(), "Video ready");
            }
            PollOutcome::Failed { kind, message } => {
                tracing::warn!(?kind, %message, "Processing failed");
            }
            PollOutcome::TimedOut { task_id, .. } => {
                tracing::warn!(%task_id, "Gave up polling, task may still finish");
            }
            PollOutcome::Cancelled => tracing::info!("Run cancelled"),
        }

        self.publish(generation, outcome.final_state());
        outcome
    }

    async fn drive(
        &self,
        generation: u64,
        video_url: &str,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let video_url = match validate_video_url(video_url) {
            Ok(url) => url,
            Err(e) => return PollOutcome::failed(FailureKind::InvalidUrl, e.to_string()),
        };

        self.publish(generation, PollerState::Submitting);
        let ticker = ProgressTicker::start(Arc::clone(&self.progress), self.config.progress_tick);

        let reply = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            reply = self.client.submit(video_url) => reply,
        };
        ticker.finish();

        match reply {
            Ok(SubmitReply::Completed(artifact)) => PollOutcome::Succeeded(artifact),
            Ok(SubmitReply::Accepted {
                task_id,
                dashboard_url,
            }) => {
                tracing::info!(%task_id, "Task accepted, polling for result");
                self.poll(generation, task_id, dashboard_url, cancel).await
            }
            Err(ClientError::Unauthorized(message)) => {
                PollOutcome::failed(FailureKind::Unauthorized, message)
            }
            Err(ClientError::PurchaseRequired(message)) => {
                PollOutcome::failed(FailureKind::PurchaseRequired, message)
            }
            Err(e) => PollOutcome::failed(FailureKind::Server, e.to_string()),
        }
    }

    async fn poll(
        &self,
        generation: u64,
        task_id: String,
        dashboard_url: Option<String>,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let max_attempts = self.config.max_attempts;

        // Accepted tasks show as processing before the first status check.
        self.publish(
            generation,
            PollerState::Processing {
                task_id: task_id.clone(),
                attempt: 0,
                max_attempts,
            },
        );

        for attempt in 1..=max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            self.publish(
                generation,
                PollerState::Processing {
                    task_id: task_id.clone(),
                    attempt,
                    max_attempts,
                },
            );

            let report = tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                report = self.client.poll_status(&task_id) => report,
            };

            match report {
                Ok(StatusReport::Completed { video_url }) => {
                    let download = tokio::select! {
                        _ = cancel.cancelled() => return PollOutcome::Cancelled,
                        download = self.client.download(&video_url) => download,
                    };
                    return match download {
                        Ok(artifact) => PollOutcome::Succeeded(artifact),
                        Err(e) => PollOutcome::failed(FailureKind::Server, e.to_string()),
                    };
                }
                Ok(StatusReport::Failed { message }) => {
                    return PollOutcome::failed(FailureKind::Processing, message);
                }
                Ok(StatusReport::Pending | StatusReport::Processing) => {
                    tracing::debug!(%task_id, attempt, "Task still running");
                }
                Err(e) => {
                    // Transport hiccups use up an attempt but do not end the run.
                    tracing::warn!(%task_id, attempt, error = %e, "Status check failed");
                }
            }
        }

        PollOutcome::TimedOut {
            task_id,
            dashboard_url,
        }
    }

    fn publish(&self, generation: u64, next: PollerState) {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || *current == next {
                return false;
            }
            tracing::debug!(from = current.label(), to = next.label(), "Poller state");
            *current = next;
            true
        });
    }
}

/// Owns the single live run of a [`Poller`].
///
/// Starting a new run cancels the previous one. Dropping the session
/// cancels whatever is still running.
pub struct PollSession {
    poller: Arc<Poller>,
    current: Option<CancellationToken>,
}

impl PollSession {
    pub fn new(poller: Arc<Poller>) -> Self {
        Self {
            poller,
            current: None,
        }
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    /// Cancel any live run and start a new one for `video_url`.
    pub fn start(&mut self, video_url: impl Into<String>) -> JoinHandle<PollOutcome> {
        self.cancel();

        let cancel = CancellationToken::new();
        self.current = Some(cancel.clone());

        // Claimed before spawning so runs publish in the order they were started.
        let generation = self.poller.next_generation();
        let poller = Arc::clone(&self.poller);
        let video_url = video_url.into();
        tokio::spawn(async move { poller.run_as(generation, &video_url, cancel).await })
    }

    /// Cancel the live run, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
