//! HTTP client for the SoraClean API.
//!
//! Wraps the three calls the poller needs: submitting a video, reading a
//! task's status and downloading the finished artifact. Responses are mapped
//! into typed results here so the polling loop never looks at raw JSON.

use std::time::Duration;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use soraclean_core::processing::poll_path;

/// Fallback message when an error response carries no usable detail.
const GENERIC_FAILURE_MESSAGE: &str = "Failed to process video";

/// Fallback message for a failed task with no error detail.
const TASK_FAILURE_MESSAGE: &str = "Processing failed";

/// Fallback message for a rejected session.
const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to continue";

/// Per-request timeout. Downloads of large videos can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The session token is missing or expired.
    #[error("{0}")]
    Unauthorized(String),

    /// The user has no credits left.
    #[error("{0}")]
    PurchaseRequired(String),

    /// Any other non-success answer from the server.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// A downloaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Filename suggested by `Content-Disposition`, if any.
    pub filename: Option<String>,
}

/// Result of `POST /remove-watermark`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    /// The server finished the job synchronously and returned the video.
    Completed(Artifact),
    /// The job runs remotely and must be polled.
    Accepted {
        task_id: String,
        dashboard_url: Option<String>,
    },
}

/// Result of `GET /task/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    /// The server has not heard about the task yet.
    Pending,
    Processing,
    Completed { video_url: String },
    Failed { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptedBody {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    dashboard_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    needs_purchase: bool,
}

/// Authenticated client for one SoraClean API base URL.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a video for watermark removal.
    pub async fn submit(&self, video_url: &str) -> Result<SubmitReply, ClientError> {
        let response = self
            .client
            .post(format!("{}/remove-watermark", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "videoUrl": video_url }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(SubmitReply::Completed(read_artifact(response).await?)),
            StatusCode::ACCEPTED => {
                let body: AcceptedBody = response.json().await?;
                match body.task_id.filter(|id| !id.is_empty()) {
                    Some(task_id) => Ok(SubmitReply::Accepted {
                        task_id,
                        dashboard_url: body.dashboard_url,
                    }),
                    None => Err(ClientError::UnexpectedResponse(
                        "accepted response without taskId".to_string(),
                    )),
                }
            }
            status if status.is_success() => Err(ClientError::UnexpectedResponse(format!(
                "status {status}"
            ))),
            _ => Err(error_from_response(response).await),
        }
    }

    /// Read a task's status.
    ///
    /// A 404 answer for an unknown task is a normal `pending` report, and a
    /// failed task comes back with a 500; both are decoded from the body.
    pub async fn poll_status(&self, task_id: &str) -> Result<StatusReport, ClientError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, poll_path(task_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: StatusBody = serde_json::from_str(&text).map_err(|_| {
            ClientError::UnexpectedResponse(format!("status {status} with body {text}"))
        })?;

        match body.status.as_str() {
            "pending" => Ok(StatusReport::Pending),
            "processing" => Ok(StatusReport::Processing),
            "completed" => match body.video_url.filter(|url| !url.is_empty()) {
                Some(video_url) => Ok(StatusReport::Completed { video_url }),
                None => Err(ClientError::UnexpectedResponse(
                    "completed task without videoUrl".to_string(),
                )),
            },
            "failed" => Ok(StatusReport::Failed {
                message: body
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| TASK_FAILURE_MESSAGE.to_string()),
            }),
            other => Err(ClientError::UnexpectedResponse(format!(
                "unknown task status {other}"
            ))),
        }
    }

    /// Download an artifact. `video_url` may be a server path such as
    /// `/download/T1` or an absolute URL.
    ///
    /// The session token is only sent to the API's own origin.
    pub async fn download(&self, video_url: &str) -> Result<Artifact, ClientError> {
        let url = if video_url.starts_with("http://") || video_url.starts_with("https://") {
            video_url.to_string()
        } else {
            format!("{}{}", self.base_url, video_url)
        };

        let mut request = self.client.get(&url);
        if self.is_api_origin(&url) {
            request = request.bearer_auth(&self.access_token);
        } else {
            tracing::debug!(%url, "Downloading from a foreign origin without credentials");
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        read_artifact(response).await
    }
}

impl ApiClient {
    fn is_api_origin(&self, url: &str) -> bool {
        match (Url::parse(&self.base_url), Url::parse(url)) {
            (Ok(base), Ok(target)) => base.origin() == target.origin(),
            _ => false,
        }
    }
}

async fn read_artifact(response: reqwest::Response) -> Result<Artifact, ClientError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let filename = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition);
    let bytes = response.bytes().await?.to_vec();

    Ok(Artifact {
        bytes,
        content_type,
        filename,
    })
}

/// Map a non-success response to a [`ClientError`].
async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED {
        return ClientError::Unauthorized(
            body.error
                .unwrap_or_else(|| LOGIN_REQUIRED_MESSAGE.to_string()),
        );
    }

    if status == StatusCode::FORBIDDEN && body.needs_purchase {
        return ClientError::PurchaseRequired(
            body.message
                .or(body.error)
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
        );
    }

    let message = match (body.error, body.details) {
        (Some(error), Some(details)) => format!("{error}: {details}"),
        (Some(error), None) => error,
        (None, Some(details)) => details,
        (None, None) => GENERIC_FAILURE_MESSAGE.to_string(),
    };
    ClientError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Extract `filename="..."` from a content-disposition value.
fn filename_from_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}
