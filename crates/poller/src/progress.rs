//! Cosmetic progress indicator.
//!
//! The percentage is not derived from the task: it creeps up by a random
//! 0-5 points per tick, stalls at 90 and jumps to 100 when the server
//! answers. It only exists so a user sees movement while waiting.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Highest value reached before the server answers.
pub const PROGRESS_CEILING: u8 = 90;

/// Largest random step per tick.
const MAX_STEP: u8 = 5;

/// Default tick period.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// A running progress ticker. Stops when finished or dropped.
pub struct ProgressTicker {
    progress: Arc<watch::Sender<u8>>,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Reset `progress` to 0 and start ticking every `tick`.
    pub fn start(progress: Arc<watch::Sender<u8>>, tick: Duration) -> Self {
        progress.send_replace(0);
        let ticking = Arc::clone(&progress);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let step: u8 = rand::rng().random_range(0..=MAX_STEP);
                ticking.send_modify(|p| *p = p.saturating_add(step).min(PROGRESS_CEILING));
            }
        });
        Self { progress, handle }
    }

    /// Stop ticking and report completion.
    pub fn finish(self) {
        self.handle.abort();
        self.progress.send_replace(100);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
