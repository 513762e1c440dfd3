//! Handler for the provider's completion webhook.
//!
//! The endpoint is unauthenticated and its payload untrusted. Only the
//! registry write decides anything; history bookkeeping is best-effort and
//! never changes the acknowledgment.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use soraclean_core::registry::Completion;
use soraclean_core::task::{OwnerContext, TaskOutcome};
use soraclean_kie::callback::{parse_callback, CallbackEvent};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Acknowledgment returned to the provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAck {
    pub received: bool,
    pub task_id: String,
}

/// POST /callback
pub async fn receive_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<CallbackAck>> {
    let parsed = parse_callback(&body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected callback");
        AppError::BadRequest(e.to_string())
    })?;
    let task_id = parsed.task_id;

    match parsed.event {
        CallbackEvent::InProgress { state: job_state } => {
            tracing::debug!(task_id = %task_id, state = ?job_state, "Progress callback acknowledged");
        }
        CallbackEvent::Terminal(outcome) => {
            tracing::info!(
                task_id = %task_id,
                success = matches!(outcome, TaskOutcome::Success { .. }),
                "Callback received",
            );
            match state.registry.complete(&task_id, outcome.clone()).await {
                Completion::Applied { owner: Some(owner) } => {
                    record_outcome(&state, &task_id, &owner, &outcome).await;
                }
                Completion::Applied { owner: None } => {
                    tracing::info!(task_id = %task_id, "Outcome recorded for unregistered task");
                }
                Completion::AlreadyTerminal { .. } => {}
            }
        }
    }

    Ok(Json(CallbackAck {
        received: true,
        task_id,
    }))
}

/// Close the owner's history entry. Errors are logged only.
pub(crate) async fn record_outcome(
    state: &AppState,
    task_id: &str,
    owner: &OwnerContext,
    outcome: &TaskOutcome,
) {
    let Some(history_id) = owner.history_id else {
        return;
    };

    let result = match outcome {
        TaskOutcome::Success { result_url } => {
            state
                .ledger
                .mark_history_completed(history_id, result_url)
                .await
        }
        TaskOutcome::Failure { message } => {
            state.ledger.mark_history_failed(history_id, message).await
        }
    };

    if let Err(e) = result {
        tracing::error!(
            task_id,
            %history_id,
            user_id = %owner.user_id,
            error = %e,
            "Failed to update history with task outcome",
        );
    }
}
