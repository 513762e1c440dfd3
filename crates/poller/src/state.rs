//! Observable poller state.

/// Where a [`Poller`](crate::poller::Poller) run currently stands.
///
/// ```text
/// Idle -> Submitting -> Processing -> Succeeded | Failed | TimedOut
///                  \-> Succeeded | Failed          (sync result / rejection)
/// any non-terminal -> Cancelled
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Submitting,
    Processing {
        task_id: String,
        attempt: u32,
        max_attempts: u32,
    },
    Succeeded,
    Failed {
        message: String,
    },
    /// The polling budget ran out. The job may still finish server-side.
    TimedOut {
        task_id: String,
    },
    Cancelled,
}

impl PollerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollerState::Succeeded
                | PollerState::Failed { .. }
                | PollerState::TimedOut { .. }
                | PollerState::Cancelled
        )
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            PollerState::Idle => "idle",
            PollerState::Submitting => "submitting",
            PollerState::Processing { .. } => "processing",
            PollerState::Succeeded => "succeeded",
            PollerState::Failed { .. } => "failed",
            PollerState::TimedOut { .. } => "timed-out",
            PollerState::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!PollerState::Idle.is_terminal());
        assert!(!PollerState::Submitting.is_terminal());
        assert!(!PollerState::Processing {
            task_id: "T1".into(),
            attempt: 1,
            max_attempts: 60
        }
        .is_terminal());
        assert!(PollerState::Succeeded.is_terminal());
        assert!(PollerState::TimedOut { task_id: "T1".into() }.is_terminal());
        assert!(PollerState::Cancelled.is_terminal());
    }

    #[test]
    fn timed_out_is_not_failed() {
        let state = PollerState::TimedOut { task_id: "T1".into() };
        assert_eq!(state.label(), "timed-out");
        assert!(!matches!(state, PollerState::Failed { .. }));
    }
}
