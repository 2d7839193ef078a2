use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use super::{BlockRecord, BlockStore, ChainSource, FetchError, StoreError};

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shortest wait between two poll cycles.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Doubles the wait after each consecutive failed cycle, up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(MIN_POLL_INTERVAL);
        Self {
            base,
            max: max.max(base),
            failures: 0,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Record the outcome of a cycle and return how long to wait before the next.
    pub fn next_delay(&mut self, success: bool) -> Duration {
        if success {
            self.failures = 0;
            return self.base;
        }
        self.failures = self.failures.saturating_add(1);
        let factor = 1u32.checked_shl(self.failures.min(16)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Keeps the block store in step with the explorer.
pub struct ChainPoller {
    source: Arc<dyn ChainSource>,
    store: Arc<BlockStore>,
    window: usize,
}

impl ChainPoller {
    pub fn new(source: Arc<dyn ChainSource>, store: Arc<BlockStore>, window: usize) -> Self {
        Self {
            source,
            store,
            window: window.max(1),
        }
    }

    /// Fetch the tip and the `window` blocks ending at it, replacing the store.
    ///
    /// Individual block failures are skipped; whatever was fetched is saved in
    /// ascending height order. Returns the number of records stored.
    pub async fn backfill(&self) -> Result<usize, PollError> {
        let tip = self.source.chain_height().await?;
        let mut records: Vec<BlockRecord> = Vec::with_capacity(self.window);
        for offset in 0..self.window as u64 {
            let Some(height) = tip.checked_sub(offset) else {
                break;
            };
            match self.source.block(height).await {
                Ok(record) => records.push(record),
                Err(e) => debug!("POLL - backfill skipped block #{}: {}", height, e),
            }
        }
        records.sort_by_key(|r| r.height);
        records.dedup_by_key(|r| r.height);
        self.store.save(&records)?;
        info!(
            "POLL - backfilled {} of {} blocks up to #{}",
            records.len(),
            self.window,
            tip
        );
        Ok(records.len())
    }

    /// Fetch the current tip block and append it to the store window.
    pub async fn refresh(&self) -> Result<BlockRecord, PollError> {
        let tip = self.source.chain_height().await?;
        let record = self.source.block(tip).await?;
        self.store.push_bounded(record.clone(), self.window)?;
        debug!("POLL - stored block #{} ({})", record.height, record.time);
        Ok(record)
    }

    /// Refresh forever, sleeping `interval` between cycles (longer after failures).
    pub async fn run(&self, mut backoff: Backoff) {
        loop {
            let ok = match self.refresh().await {
                Ok(_) => true,
                Err(e) => {
                    warn!("POLL - refresh skipped: {}", e);
                    false
                }
            };
            let delay = backoff.next_delay(ok);
            if !ok {
                debug!(
                    "POLL - {} consecutive failures, next attempt in {}s",
                    backoff.failures(),
                    delay.as_secs()
                );
            }
            sleep(delay).await;
        }
    }
}
