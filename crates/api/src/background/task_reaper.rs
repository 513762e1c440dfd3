//! Periodic eviction of old entries from the task registry.
//!
//! Tasks are only ever read by pollers for a few minutes after submission.
//! This job bounds memory by dropping anything registered longer ago than
//! the retention period.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use soraclean_core::registry::TaskRegistry;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the registry retention loop until `cancel` is triggered.
pub async fn run(
    registry: Arc<TaskRegistry>,
    retention: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_secs = retention.as_secs(),
        interval_secs = interval.as_secs(),
        "Task reaper started"
    );

    let retention = chrono::Duration::from_std(retention).ok();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Task reaper stopping");
                break;
            }
            _ = ticker.tick() => {
                // An unrepresentable retention period never evicts.
                let Some(cutoff) = retention.and_then(|r| Utc::now().checked_sub_signed(r)) else {
                    continue;
                };
                let evicted = registry.evict_older_than(cutoff).await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    tracing::info!(evicted, remaining, "Task reaper: evicted old tasks");
                } else {
                    tracing::debug!("Task reaper: nothing to evict");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_evicts_and_stops_on_cancel() {
        let registry = Arc::new(TaskRegistry::new());
        registry.register("old", None).await.unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::ZERO,
            Duration::from_millis(10),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(registry.is_empty().await);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reaper should stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn spawned_sweep_keeps_fresh_tasks() {
        let registry = Arc::new(TaskRegistry::new());
        registry.register("fresh", None).await.unwrap();
        registry.register("also-fresh", None).await.unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::from_secs(3600),
            Duration::from_millis(10),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.len().await, 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
