//! Handler for watermark-removal submissions.
//!
//! Flow: validate the URL, check credits, open a history entry, reserve a
//! credit, then hand the job to the
//! [`JobSubmitter`](soraclean_kie::submit::JobSubmitter).
//! A direct result is streamed back immediately; a deferred one returns
//! `202` with the task id to poll.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use soraclean_core::processing::{poll_path, DEMO_MODE_MESSAGE, DIRECT_DOWNLOAD_FILENAME};
use soraclean_core::task::OwnerContext;
use soraclean_core::types::DbId;
use soraclean_core::video_url::validate_video_url;
use soraclean_db::models::history::CreateHistoryEntry;
use soraclean_db::models::subscription::UserSubscription;
use soraclean_kie::submit::{Submission, SubmitError};

use crate::error::{AppError, AppResult};
use crate::handlers::callback::record_outcome;
use crate::handlers::tasks::artifact_response;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /remove-watermark`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveWatermarkRequest {
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Body of the `202 Accepted` response for a deferred job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAccepted {
    pub success: bool,
    pub message: &'static str,
    pub task_id: String,
    pub poll_url: String,
    pub estimated_time: &'static str,
    pub credits_remaining: i32,
    pub dashboard_url: String,
}

/// Attempts at reserving a credit before giving up. Each retry re-reads the
/// spendable subscription in case a concurrent request emptied the first.
const RESERVE_ATTEMPTS: usize = 3;

/// POST /remove-watermark
///
/// The credit is reserved before any provider call and refunded if no job
/// comes out of it, so concurrent submissions cannot overspend.
pub async fn remove_watermark(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RemoveWatermarkRequest>,
) -> AppResult<Response> {
    let video_url = validate_video_url(input.video_url.as_deref().unwrap_or_default())?;

    let subscription = state
        .ledger
        .spendable_subscription(user.user_id)
        .await?
        .ok_or(AppError::InsufficientCredits)?;

    tracing::info!(
        user_id = %user.user_id,
        email = user.email.as_deref().unwrap_or_default(),
        credits_remaining = subscription.credits_remaining,
        "Processing submission",
    );

    let history_id = open_history(&state, user.user_id, subscription.id, video_url).await;

    if !state.config.provider.processing_enabled() {
        tracing::warn!(user_id = %user.user_id, "Demo mode enabled, submission refused");
        record_failure(&state, history_id, DEMO_MODE_MESSAGE).await;
        return Err(AppError::DemoMode);
    }

    let reserved = match reserve_credit(&state, user.user_id, subscription.id).await {
        Ok(reserved) => reserved,
        Err(e) => {
            let message = match &e {
                AppError::InsufficientCredits => "No credits remaining",
                _ => "Failed to deduct credit",
            };
            record_failure(&state, history_id, message).await;
            return Err(e);
        }
    };

    let owner = OwnerContext {
        user_id: user.user_id,
        subscription_id: Some(reserved.id),
        history_id,
    };

    let submission = match state.submitter.submit(video_url, Some(owner.clone())).await {
        Ok(submission) => submission,
        Err(e) => {
            refund(&state, reserved.id).await;
            record_failure(&state, history_id, &e.to_string()).await;
            return Err(match e {
                SubmitError::InvalidUrl(msg) => AppError::BadRequest(msg),
                SubmitError::InsufficientBalance(msg) => AppError::ProviderBalance(msg),
                SubmitError::Provider(msg) => AppError::Processing(msg),
            });
        }
    };

    match submission {
        Submission::Direct { result_url } => {
            let upstream = match state.kie.fetch_artifact(&result_url).await {
                Ok(upstream) => upstream,
                Err(e) => {
                    tracing::error!(error = %e, "Direct result fetch failed");
                    refund(&state, reserved.id).await;
                    record_failure(&state, history_id, &e.to_string()).await;
                    return Err(AppError::Processing(e.to_string()));
                }
            };
            if let Some(history_id) = history_id {
                if let Err(e) = state
                    .ledger
                    .mark_history_completed(history_id, &result_url)
                    .await
                {
                    tracing::error!(%history_id, error = %e, "Failed to mark history completed");
                }
            }
            artifact_response(upstream, DIRECT_DOWNLOAD_FILENAME)
        }
        Submission::Deferred {
            task_id,
            estimated_time,
            settled,
        } => {
            if let Some(history_id) = history_id {
                if let Err(e) = state.ledger.attach_task_id(history_id, &task_id).await {
                    tracing::error!(%history_id, task_id = %task_id, error = %e, "Failed to attach task id");
                }
            }
            if let Some(outcome) = settled {
                record_outcome(&state, &task_id, &owner, &outcome).await;
            }

            tracing::info!(
                user_id = %user.user_id,
                task_id = %task_id,
                credits_remaining = reserved.credits_remaining,
                "Task accepted",
            );

            let body = TaskAccepted {
                success: true,
                message: "Task created successfully! Processing your video...",
                poll_url: poll_path(&task_id),
                task_id,
                estimated_time,
                credits_remaining: reserved.credits_remaining,
                dashboard_url: state.config.provider.dashboard_url.clone(),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

// ---- private helpers ----

/// Open a history entry. A failure here does not block processing.
async fn open_history(
    state: &AppState,
    user_id: DbId,
    subscription_id: DbId,
    video_url: &str,
) -> Option<DbId> {
    let entry = CreateHistoryEntry {
        user_id,
        subscription_id: Some(subscription_id),
        video_url: video_url.to_string(),
    };
    match state.ledger.create_history(&entry).await {
        Ok(history) => Some(history.id),
        Err(e) => {
            tracing::error!(%user_id, error = %e, "Failed to create history entry");
            None
        }
    }
}

/// Mark the history entry failed, if there is one. Errors are logged only.
async fn record_failure(state: &AppState, history_id: Option<DbId>, message: &str) {
    let Some(history_id) = history_id else {
        return;
    };
    if let Err(e) = state.ledger.mark_history_failed(history_id, message).await {
        tracing::error!(%history_id, error = %e, "Failed to mark history failed");
    }
}

/// Take one credit, starting with `subscription_id`.
///
/// An empty subscription means a concurrent request got there first; the
/// user's next spendable subscription is tried instead.
async fn reserve_credit(
    state: &AppState,
    user_id: DbId,
    subscription_id: DbId,
) -> AppResult<UserSubscription> {
    let mut candidate = subscription_id;
    for _ in 0..RESERVE_ATTEMPTS {
        match state.ledger.deduct_credit(candidate).await {
            Ok(updated) => return Ok(updated),
            Err(sqlx::Error::RowNotFound) => {
                tracing::info!(%user_id, subscription_id = %candidate, "Subscription emptied concurrently");
                candidate = state
                    .ledger
                    .spendable_subscription(user_id)
                    .await?
                    .ok_or(AppError::InsufficientCredits)?
                    .id;
            }
            Err(e) => {
                tracing::error!(subscription_id = %candidate, error = %e, "Failed to deduct credit");
                return Err(AppError::InternalError(format!("Failed to deduct credit: {e}")));
            }
        }
    }
    Err(AppError::InsufficientCredits)
}

/// Return a reserved credit. Errors are logged only.
async fn refund(state: &AppState, subscription_id: DbId) {
    match state.ledger.refund_credit(subscription_id).await {
        Ok(()) => tracing::info!(%subscription_id, "Reserved credit refunded"),
        Err(e) => tracing::error!(%subscription_id, error = %e, "Failed to refund credit"),
    }
}
