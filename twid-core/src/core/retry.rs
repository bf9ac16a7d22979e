use std::path::Path;
use std::time::Duration;

use super::downloader::{DownloadExecutor, Transport};
use super::events::{EventEmitter, ProgressEvent};
use crate::models::media::{FailedDownload, MediaRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn delay_before(&self, pass: u32) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let base = self.backoff.as_millis() as u64 * (pass as u64 - 1);
        let jitter = rand::random::<u64>() % (base / 2 + 1);
        Duration::from_millis(base + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Downloads `records`, then re-downloads only the previous pass's failures
/// until nothing fails or `max_attempts` passes have run. Returns what is
/// still failed at the end.
pub async fn run_with_retry<T, E>(
    executor: &DownloadExecutor<T, E>,
    records: Vec<MediaRecord>,
    root: &Path,
    policy: RetryPolicy,
) -> Vec<FailedDownload>
where
    T: Transport,
    E: EventEmitter,
{
    let attempts = policy.max_attempts.max(1);
    let mut pending = records;
    let mut failed = Vec::new();

    for pass in 1..=attempts {
        if pass > 1 {
            tokio::time::sleep(policy.delay_before(pass)).await;
        }

        let count = pending.len();
        failed = executor.download(pending, root).await;
        tracing::info!(
            "[{}] pass {}/{}: {} records, {} failed",
            executor.user(),
            pass,
            attempts,
            count,
            failed.len()
        );
        executor.emit(ProgressEvent::PassFinished {
            user: executor.user().to_string(),
            pass,
            failed: failed.len(),
        });

        if failed.is_empty() || executor.is_cancelled() {
            break;
        }
        pending = failed.iter().map(|f| f.record.clone()).collect();
    }

    failed
}
