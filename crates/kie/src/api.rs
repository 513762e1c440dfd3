//! REST API client for the Kie AI endpoints.
//!
//! Wraps the two job-creation endpoints (the synchronous playground and the
//! asynchronous jobs API) plus plain artifact downloads using [`reqwest`].

use serde::Deserialize;

/// Model identifier for the watermark remover.
pub const MODEL: &str = "sora-watermark-remover";

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://api.kie.ai";

/// Where account owners top up their provider balance.
pub const DASHBOARD_URL: &str = "https://kie.ai/dashboard";

/// Provider business code for a successful request.
pub const CODE_OK: i64 = 200;

/// Provider business code for an exhausted account balance.
pub const CODE_INSUFFICIENT_BALANCE: i64 = 402;

/// HTTP client for the Kie AI API.
pub struct KieApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

/// Response of `POST /api/playground/run`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundResponse {
    #[serde(default)]
    pub result_urls: Vec<String>,
}

/// Response envelope of `POST /api/v1/jobs/createTask`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub message: Option<String>,
    pub data: Option<CreateTaskData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskData {
    pub task_id: Option<String>,
}

/// Errors from the Kie AI REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum KieApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Kie AI API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider account has no balance left.
    #[error("Insufficient credits. Please add credits to your Kie AI account at {}", DASHBOARD_URL)]
    InsufficientBalance,

    /// The provider answered with a non-200 business code.
    #[error("{message}")]
    Rejected { code: Option<i64>, message: String },

    /// The provider accepted the request but did not hand out a task id.
    #[error("Failed to create task")]
    MissingTaskId,

    /// The playground answered but produced no result.
    #[error("Playground returned no result")]
    NoResult,
}

impl KieApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `https://api.kie.ai`.
    /// * `api_key` - Sent as a bearer token on every provider call.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_key)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Run the model synchronously.
    ///
    /// Returns the first result URL. Any response without one is an error so
    /// the caller can fall back to [`create_task`](Self::create_task).
    pub async fn run_playground(&self, video_url: &str) -> Result<String, KieApiError> {
        let body = serde_json::json!({
            "model": MODEL,
            "input": { "video_url": video_url },
        });

        let response = self
            .client
            .post(format!("{}/api/playground/run", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: PlaygroundResponse = Self::parse_response(response).await?;
        parsed
            .result_urls
            .into_iter()
            .find(|url| !url.is_empty())
            .ok_or(KieApiError::NoResult)
    }

    /// Create an asynchronous job whose outcome is posted to `callback_url`.
    ///
    /// Returns the provider-assigned task id.
    pub async fn create_task(
        &self,
        video_url: &str,
        callback_url: &str,
    ) -> Result<String, KieApiError> {
        let body = serde_json::json!({
            "model": MODEL,
            "callBackUrl": callback_url,
            "input": { "video_url": video_url },
        });

        let response = self
            .client
            .post(format!("{}/api/v1/jobs/createTask", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        // The business code lives in the body, which the provider also sends
        // with some error statuses, so the body is read before the status.
        let status = response.status();
        let text = response.text().await?;
        let parsed = match serde_json::from_str::<CreateTaskResponse>(&text) {
            Ok(parsed) => parsed,
            Err(_) if status.as_u16() == 402 => return Err(KieApiError::InsufficientBalance),
            Err(_) => {
                return Err(KieApiError::ApiError {
                    status: status.as_u16(),
                    body: text,
                })
            }
        };

        Self::interpret_create_task(parsed)
    }

    /// Start downloading a result artifact. The body is left unread so the
    /// caller can stream it.
    pub async fn fetch_artifact(&self, url: &str) -> Result<reqwest::Response, KieApiError> {
        let response = self.client.get(url).send().await?;
        Self::ensure_success(response).await
    }

    // ---- private helpers ----

    fn interpret_create_task(parsed: CreateTaskResponse) -> Result<String, KieApiError> {
        match parsed.code {
            Some(CODE_OK) => {}
            Some(CODE_INSUFFICIENT_BALANCE) => return Err(KieApiError::InsufficientBalance),
            code => {
                let message = parsed
                    .msg
                    .or(parsed.message)
                    .unwrap_or_else(|| "Failed to create task".to_string());
                return Err(KieApiError::Rejected { code, message });
            }
        }

        parsed
            .data
            .and_then(|data| data.task_id)
            .filter(|id| !id.is_empty())
            .ok_or(KieApiError::MissingTaskId)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`KieApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, KieApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(KieApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, KieApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
