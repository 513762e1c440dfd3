//! Handlers for task status polling and the artifact download proxy.
//!
//! The browser never talks to the provider's storage directly: finished
//! artifacts are streamed through [`download_video`].

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use serde::Serialize;
use soraclean_core::error::CoreError;
use soraclean_core::processing::{
    attachment_disposition, download_path, DEFAULT_VIDEO_CONTENT_TYPE, DOWNLOAD_FILENAME,
};
use soraclean_core::task::TaskState;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Body of `GET /task/{task_id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            message: None,
            video_url: None,
            original_url: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /task/{task_id}
///
/// An unknown id is reported as `pending` with a 404: the callback may
/// simply not have arrived yet, so pollers keep going.
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Response {
    let Some(task) = state.registry.get(&task_id).await else {
        let body = TaskStatusResponse {
            message: Some("Task not completed yet".to_string()),
            ..TaskStatusResponse::status("pending")
        };
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    match task.state {
        TaskState::Pending => Json(TaskStatusResponse::status("processing")).into_response(),
        TaskState::Succeeded { result_url } => Json(TaskStatusResponse {
            video_url: Some(download_path(&task_id)),
            original_url: Some(result_url),
            ..TaskStatusResponse::status("completed")
        })
        .into_response(),
        TaskState::Failed { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TaskStatusResponse {
                error: Some(message),
                ..TaskStatusResponse::status("failed")
            }),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Download proxy
// ---------------------------------------------------------------------------

/// GET /download/{task_id}
///
/// Streams the artifact of a successful task. Any other state is a 404.
pub async fn download_video(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    // Snapshot only; the registry lock is released before the fetch.
    let result_url = state
        .registry
        .get(&task_id)
        .await
        .and_then(|task| task.result_url().map(str::to_string))
        .ok_or_else(|| CoreError::NotFound {
            entity: "Video",
            id: task_id.clone(),
        })?;

    tracing::info!(task_id = %task_id, "Proxying video download");

    let upstream = state.kie.fetch_artifact(&result_url).await.map_err(|e| {
        tracing::error!(task_id = %task_id, error = %e, "Artifact fetch failed");
        AppError::Download(e.to_string())
    })?;

    artifact_response(upstream, DOWNLOAD_FILENAME)
}

/// Relay an upstream artifact as an attachment, streaming the body.
///
/// Keeps the upstream `Content-Type` (default `video/mp4`) and
/// `Content-Length`.
pub(crate) fn artifact_response(upstream: reqwest::Response, filename: &str) -> AppResult<Response> {
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_VIDEO_CONTENT_TYPE)
        .to_string();
    let content_length = upstream.content_length();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_DISPOSITION, attachment_disposition(filename));
    if let Some(len) = content_length {
        builder = builder.header(CONTENT_LENGTH, len);
    }

    let stream = upstream
        .bytes_stream()
        .inspect_err(|e| tracing::warn!(error = %e, "Upstream artifact stream interrupted"));

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(format!("Failed to build download response: {e}")))
}
