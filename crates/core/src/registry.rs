//! Process-lifetime registry of remote processing tasks.
//!
//! [`TaskRegistry`] is the single source of truth for in-flight and finished
//! provider jobs. It is written by the job submitter (registration) and the
//! callback handler (completion), and read by the status and download
//! endpoints.
//!
//! Every operation takes the lock exactly once and never awaits anything
//! else while holding it, so callers can perform network I/O freely between
//! registry calls. State is local to this process; running several
//! instances behind a load balancer would need a shared store instead.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::task::{OwnerContext, Task, TaskOutcome, TaskState};
use crate::types::Timestamp;

/// Errors returned by [`TaskRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The provider handed out an id that is already tracked.
    #[error("Task {0} is already registered")]
    AlreadyRegistered(String),
}

/// Result of [`TaskRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new `Pending` entry was created.
    Registered,
    /// The callback arrived first. The owner was attached to the existing
    /// entry, whose outcome stands.
    AlreadyTerminal(TaskState),
}

/// Result of [`TaskRegistry::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The outcome was recorded. Carries the owner captured at registration
    /// time (`None` when the callback arrived for an unregistered task).
    Applied { owner: Option<OwnerContext> },
    /// The task was already terminal; the first outcome was kept.
    AlreadyTerminal { existing: TaskState },
}

/// Concurrent in-memory map from task id to [`Task`].
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, Task>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Start tracking a freshly created task in the `Pending` state.
    ///
    /// Must complete before the task id is disclosed to any client. If the
    /// callback already landed, the entry keeps its outcome and gains `owner`
    /// so the caller can settle the owner's bookkeeping itself. A second
    /// registration of a pending task is an error.
    pub async fn register(
        &self,
        task_id: &str,
        owner: Option<OwnerContext>,
    ) -> Result<Registration, RegistryError> {
        let mut tasks = self.tasks.write().await;
        match tasks.entry(task_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let task = entry.get_mut();
                if !task.state.is_terminal() {
                    return Err(RegistryError::AlreadyRegistered(task_id.to_string()));
                }
                if task.owner.is_none() {
                    task.owner = owner;
                }
                Ok(Registration::AlreadyTerminal(task.state.clone()))
            }
            Entry::Vacant(slot) => {
                slot.insert(Task {
                    task_id: task_id.to_string(),
                    state: TaskState::Pending,
                    created_at: Utc::now(),
                    completed_at: None,
                    owner,
                });
                Ok(Registration::Registered)
            }
        }
    }

    /// Record the terminal outcome of a task.
    ///
    /// First write wins: a task that is already terminal keeps its outcome.
    /// An unknown id is inserted directly in the terminal state.
    pub async fn complete(&self, task_id: &str, outcome: TaskOutcome) -> Completion {
        let now = Utc::now();
        let completion = {
            let mut tasks = self.tasks.write().await;
            match tasks.entry(task_id.to_string()) {
                Entry::Occupied(mut entry) => {
                    let task = entry.get_mut();
                    if task.state.is_terminal() {
                        Completion::AlreadyTerminal {
                            existing: task.state.clone(),
                        }
                    } else {
                        task.state = outcome.into();
                        task.completed_at = Some(now);
                        Completion::Applied {
                            owner: task.owner.clone(),
                        }
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(Task {
                        task_id: task_id.to_string(),
                        state: outcome.into(),
                        created_at: now,
                        completed_at: Some(now),
                        owner: None,
                    });
                    Completion::Applied { owner: None }
                }
            }
        };

        match &completion {
            Completion::Applied { owner } => {
                tracing::debug!(task_id, attributed = owner.is_some(), "Task completed");
            }
            Completion::AlreadyTerminal { existing } => {
                tracing::warn!(
                    task_id,
                    existing = existing.label(),
                    "Duplicate completion ignored, keeping first outcome",
                );
            }
        }

        completion
    }

    /// Snapshot of a task, if known.
    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Drop every task registered before `cutoff`. Returns the number removed.
    pub async fn evict_older_than(&self, cutoff: Timestamp) -> usize {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| task.created_at >= cutoff);
        before - tasks.len()
    }

    /// Number of tracked tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
