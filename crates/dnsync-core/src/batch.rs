//! Rate-limited batch invoker
//!
//! The remote enforces a request budget per window that only resets a fixed
//! time after the last request of a burst, and exceeding it degrades service
//! without a usable error signal. Pacing is therefore proactive:
//!
//! ```text
//! items ─┬─ batch 1 (concurrent) ─ join ─ cooldown ─┐
//!        │                                          │
//!        └──────────────────────────────────────────┴─ batch 2 ─ join ─ ...
//! ```
//!
//! The end of the last batch is shared by every clone of an invoker, so
//! consecutive invocations (force-mode delete then create, denylist then
//! rewrites, one profile then the next) are paced against each other too.
//!
//! Concurrency inside a batch is further capped by the request channel's
//! permit pool.

use futures::future::try_join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::RateLimitConfig;

/// Executes per-item remote operations in paced, concurrent batches
#[derive(Debug, Clone)]
pub struct BatchInvoker {
    /// Requests issued per window
    batch_size: usize,

    /// Pause between consecutive batches
    cooldown: Duration,

    /// When the most recent batch completed, shared by all clones
    last_batch_end: Arc<Mutex<Option<Instant>>>,
}

impl BatchInvoker {
    /// Create a new invoker
    ///
    /// A `batch_size` of 0 is treated as 1.
    pub fn new(batch_size: usize, cooldown: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            cooldown,
            last_batch_end: Arc::new(Mutex::new(None)),
        }
    }

    /// Create an invoker from the pacing configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.batch_size, config.cooldown())
    }

    /// Requests issued per window
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Pause between consecutive batches
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Number of batches needed for `items` operations
    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }

    /// Run `operation` once per item.
    ///
    /// Batches run one after another; items within a batch run concurrently.
    /// A batch never starts before `cooldown` has elapsed since the previous
    /// batch of this invoker (or of any clone) completed, including batches
    /// issued by earlier calls. Invocations sharing the pacing state run one
    /// at a time.
    ///
    /// The first error aborts the invocation: operations of the failing batch
    /// still in flight are dropped, later batches never start, and operations
    /// that already succeeded are not rolled back.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<R>)`: One result per item, in input order
    /// - `Err(Error)`: The first error raised by an operation
    pub async fn call_api<T, R, F, Fut>(&self, items: Vec<T>, operation: F) -> crate::Result<Vec<R>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = crate::Result<R>>,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total = items.len();
        let batches = self.batch_count(total);
        let mut results = Vec::with_capacity(total);
        let mut remaining = items.into_iter().peekable();
        let mut batch_number = 0;

        let mut last_batch_end = self.last_batch_end.lock().await;

        while remaining.peek().is_some() {
            batch_number += 1;
            self.wait_for_window(*last_batch_end, results.len(), total).await;

            let batch: Vec<Fut> = remaining
                .by_ref()
                .take(self.batch_size)
                .map(&operation)
                .collect();

            debug!(
                "Issuing batch {}/{} ({} requests)",
                batch_number,
                batches,
                batch.len()
            );
            let outcome = try_join_all(batch).await;
            *last_batch_end = Some(Instant::now());
            results.extend(outcome?);
        }

        Ok(results)
    }

    /// Sleep until the cooldown since the previous batch has elapsed
    async fn wait_for_window(&self, last_batch_end: Option<Instant>, done: usize, total: usize) {
        let Some(end) = last_batch_end else {
            return;
        };
        let wait = self.cooldown.saturating_sub(end.elapsed());
        if wait.is_zero() {
            return;
        }

        info!(
            "Processed {}/{} requests, waiting {}s for the rate limit window to reset",
            done,
            total,
            wait.as_secs()
        );
        tokio::time::sleep(wait).await;
    }
}

impl Default for BatchInvoker {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
