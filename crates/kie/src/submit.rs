//! Remote job submission with sync-to-async fallback.
//!
//! [`JobSubmitter::submit`] first asks the playground endpoint for an
//! immediate result. Any failure there falls back to the jobs API, whose
//! task id is registered in the [`TaskRegistry`] before it is handed back,
//! so a client can never poll for an id the server does not know.

use std::sync::Arc;

use soraclean_core::error::CoreError;
use soraclean_core::processing::ESTIMATED_PROCESSING_TIME;
use soraclean_core::registry::{Registration, RegistryError, TaskRegistry};
use soraclean_core::task::{OwnerContext, TaskOutcome};
use soraclean_core::video_url::validate_video_url;

use crate::api::{KieApi, KieApiError};

/// How a submission was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The provider finished in the same exchange.
    Direct { result_url: String },
    /// The provider queued the job; completion arrives via callback.
    Deferred {
        task_id: String,
        estimated_time: &'static str,
        /// Set when the callback landed before registration; the owner's
        /// history must be closed by the caller.
        settled: Option<TaskOutcome>,
    },
}

/// Errors from [`JobSubmitter::submit`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error("{0}")]
    InsufficientBalance(String),

    #[error("{0}")]
    Provider(String),
}

/// Creates remote jobs and registers the deferred ones.
pub struct JobSubmitter {
    api: Arc<KieApi>,
    registry: Arc<TaskRegistry>,
    callback_url: String,
}

impl JobSubmitter {
    pub fn new(api: Arc<KieApi>, registry: Arc<TaskRegistry>, callback_url: String) -> Self {
        Self {
            api,
            registry,
            callback_url,
        }
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Submit `video_url` for watermark removal on behalf of `owner`.
    pub async fn submit(
        &self,
        video_url: &str,
        owner: Option<OwnerContext>,
    ) -> Result<Submission, SubmitError> {
        let video_url = validate_video_url(video_url).map_err(|e| match e {
            CoreError::Validation(msg) => SubmitError::InvalidUrl(msg),
            other => SubmitError::InvalidUrl(other.to_string()),
        })?;

        match self.api.run_playground(video_url).await {
            Ok(result_url) => {
                tracing::info!(video_url, "Playground returned a direct result");
                return Ok(Submission::Direct { result_url });
            }
            Err(e) => {
                tracing::info!(error = %e, "Playground unavailable, falling back to jobs API");
            }
        }

        let task_id = self
            .api
            .create_task(video_url, &self.callback_url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Job creation failed");
                match e {
                    KieApiError::InsufficientBalance => SubmitError::InsufficientBalance(e.to_string()),
                    other => SubmitError::Provider(other.to_string()),
                }
            })?;

        let settled = match self.registry.register(&task_id, owner).await {
            Ok(Registration::Registered) => {
                tracing::info!(task_id = %task_id, "Task created, awaiting callback");
                None
            }
            Ok(Registration::AlreadyTerminal(state)) => {
                tracing::info!(
                    task_id = %task_id,
                    state = state.label(),
                    "Callback arrived before registration",
                );
                state.outcome()
            }
            Err(RegistryError::AlreadyRegistered(_)) => {
                tracing::warn!(task_id = %task_id, "Provider reused a pending task id");
                None
            }
        };

        Ok(Submission::Deferred {
            task_id,
            estimated_time: ESTIMATED_PROCESSING_TIME,
            settled,
        })
    }
}
