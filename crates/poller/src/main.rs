//! `soraclean-poller` -- command-line client for SoraClean.
//!
//! Submits a Sora share URL, follows the task until it finishes and writes
//! the cleaned video to disk.
//!
//! ```text
//! soraclean-poller https://sora.chatgpt.com/p/s_abc123
//! ```
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default                | Description                        |
//! |--------------------------|----------|------------------------|------------------------------------|
//! | `SORACLEAN_API_URL`      | yes      | --                     | API base URL, e.g. `http://localhost:3000` |
//! | `SORACLEAN_ACCESS_TOKEN` | yes      | --                     | Session token sent as `Bearer`     |
//! | `POLL_INTERVAL_SECS`     | no       | `2`                    | Seconds before each status check   |
//! | `POLL_MAX_ATTEMPTS`      | no       | `60`                   | Status checks before giving up     |
//! | `OUTPUT_PATH`            | no       | `clean_sora_video.mp4` | Where the video is written         |

use std::sync::Arc;
use std::time::Duration;

use soraclean_core::processing::DOWNLOAD_FILENAME;
use soraclean_poller::client::ApiClient;
use soraclean_poller::poller::{
    FailureKind, PollConfig, PollOutcome, PollSession, Poller, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_POLL_INTERVAL,
};
use soraclean_poller::state::PollerState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when the attempt budget ran out.
const EXIT_TIMED_OUT: i32 = 3;

/// Exit code after Ctrl-C.
const EXIT_CANCELLED: i32 = 130;

fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soraclean_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let video_url = std::env::args().nth(1).unwrap_or_else(|| {
        tracing::error!("Usage: soraclean-poller <sora-share-url>");
        std::process::exit(2);
    });

    let api_url = required_env("SORACLEAN_API_URL");
    let access_token = required_env("SORACLEAN_ACCESS_TOKEN");

    let interval = std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL);

    let max_attempts: u32 = std::env::var("POLL_MAX_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_ATTEMPTS);

    let output_path =
        std::env::var("OUTPUT_PATH").unwrap_or_else(|_| DOWNLOAD_FILENAME.to_string());

    tracing::info!(
        api_url = %api_url,
        interval_secs = interval.as_secs(),
        max_attempts,
        "Starting soraclean-poller",
    );

    let config = PollConfig {
        interval,
        max_attempts,
        ..PollConfig::default()
    };
    let poller = Arc::new(Poller::new(ApiClient::new(api_url, access_token), config));

    let mut states = poller.subscribe();
    let mut progress = poller.subscribe_progress();
    let reporter = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    match &*states.borrow_and_update() {
                        PollerState::Processing { task_id, attempt, max_attempts } => {
                            tracing::info!(%task_id, attempt, max_attempts, "Processing");
                        }
                        other => tracing::info!(state = other.label(), "State changed"),
                    }
                }
                changed = progress.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let percent = *progress.borrow_and_update();
                    tracing::debug!(percent, "Progress");
                }
            }
        }
    });

    let mut session = PollSession::new(Arc::clone(&poller));
    let mut run = session.start(video_url);

    let finished = tokio::select! {
        joined = &mut run => Some(joined.unwrap_or(PollOutcome::Cancelled)),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            tracing::info!("Interrupted, cancelling");
            session.cancel();
            run.await.unwrap_or(PollOutcome::Cancelled)
        }
    };
    reporter.abort();

    let code = match outcome {
        PollOutcome::Succeeded(artifact) => {
            match tokio::fs::write(&output_path, &artifact.bytes).await {
                Ok(()) => {
                    tracing::info!(
                        path = %output_path,
                        bytes = artifact.bytes.len(),
                        "Cleaned video saved",
                    );
                    0
                }
                Err(e) => {
                    tracing::error!(path = %output_path, error = %e, "Failed to write video");
                    1
                }
            }
        }
        PollOutcome::Failed { kind, message } => {
            match kind {
                FailureKind::Unauthorized => {
                    tracing::error!(%message, "Session expired, log in again and refresh the token");
                }
                FailureKind::PurchaseRequired => {
                    tracing::error!(%message, "No credits left, purchase a plan to continue");
                }
                _ => tracing::error!(%message, "Processing failed"),
            }
            1
        }
        PollOutcome::TimedOut {
            task_id,
            dashboard_url,
        } => {
            tracing::warn!(
                %task_id,
                dashboard_url = dashboard_url.as_deref().unwrap_or("-"),
                "Still processing after the polling window, check back later with this task id",
            );
            EXIT_TIMED_OUT
        }
        PollOutcome::Cancelled => EXIT_CANCELLED,
    };

    std::process::exit(code);
}
