//! Remote processing task model.

use crate::types::{DbId, Timestamp};

/// Identity and billing linkage of whoever submitted a task.
///
/// The provider's callback carries no session, so this is the only way the
/// callback handler can attribute a finished job to a user and a history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    pub user_id: DbId,
    pub subscription_id: Option<DbId>,
    pub history_id: Option<DbId>,
}

/// Lifecycle state of a task.
///
/// `Pending` is the only non-terminal state. The result location and the
/// error detail live inside the terminal variants so neither can be present
/// in the wrong state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Succeeded { result_url: String },
    Failed { message: String },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Succeeded { .. } => "completed-success",
            TaskState::Failed { .. } => "completed-failure",
        }
    }

    /// The recorded outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<TaskOutcome> {
        match self {
            TaskState::Pending => None,
            TaskState::Succeeded { result_url } => Some(TaskOutcome::Success {
                result_url: result_url.clone(),
            }),
            TaskState::Failed { message } => Some(TaskOutcome::Failure {
                message: message.clone(),
            }),
        }
    }
}

/// Terminal result reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success { result_url: String },
    Failure { message: String },
}

impl From<TaskOutcome> for TaskState {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Success { result_url } => TaskState::Succeeded { result_url },
            TaskOutcome::Failure { message } => TaskState::Failed { message },
        }
    }
}

/// One remote watermark-removal job.
#[derive(Debug, Clone)]
pub struct Task {
    pub task_id: String,
    pub state: TaskState,
    pub created_at: Timestamp,
    /// Set when the task reached a terminal state.
    pub completed_at: Option<Timestamp>,
    pub owner: Option<OwnerContext>,
}

impl Task {
    /// The artifact location, if the task succeeded.
    pub fn result_url(&self) -> Option<&str> {
        match &self.state {
            TaskState::Succeeded { result_url } => Some(result_url),
            _ => None,
        }
    }
}
