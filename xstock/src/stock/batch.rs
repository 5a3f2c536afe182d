//! Batch building over many securities.
//!
//! Each security is an independent task; a failure only removes that
//! security from the result and is reported next to the built stocks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::{BuildError, BuildStep, Stock, StockAggregator, StockList};
use crate::data::SecurityIdentity;

/// A security that could not be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub secucode: String,
    /// Failing step; absent when the task itself died
    pub step: Option<BuildStep>,
    pub reason: String,
}

impl From<BuildError> for BatchFailure {
    fn from(err: BuildError) -> Self {
        Self {
            secucode: err.secucode.clone(),
            step: Some(err.step),
            reason: err.source.to_string(),
        }
    }
}

/// Built stocks plus the securities that failed, both in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub stocks: StockList,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.stocks.len() + self.failures.len()
    }
}

impl StockAggregator {
    /// Build every security, at most `concurrency` at a time.
    pub async fn build_all(
        self: &Arc<Self>,
        identities: Vec<SecurityIdentity>,
        concurrency: usize,
    ) -> BatchOutcome {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut join_set: JoinSet<(usize, Result<Stock, BuildError>)> = JoinSet::new();

        for (index, identity) in identities.iter().cloned().enumerate() {
            let aggregator = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, aggregator.build(&identity).await)
            });
        }

        let mut slots: Vec<Option<Result<Stock, BatchFailure>>> =
            (0..identities.len()).map(|_| None).collect();

        while let Some(task_result) = join_set.join_next().await {
            match task_result {
                Ok((index, result)) => {
                    slots[index] = Some(result.map_err(|e| {
                        warn!(secucode = %e.secucode, step = %e.step, error = %e.source, "Stock build failed");
                        BatchFailure::from(e)
                    }));
                }
                Err(join_error) => {
                    // The slot stays empty and is reported below.
                    warn!(error = %join_error, "Stock build task failed");
                }
            }
        }

        let mut outcome = BatchOutcome::default();
        let mut stocks = Vec::with_capacity(identities.len());
        for (identity, slot) in identities.into_iter().zip(slots) {
            match slot {
                Some(Ok(stock)) => stocks.push(stock),
                Some(Err(failure)) => outcome.failures.push(failure),
                None => outcome.failures.push(BatchFailure {
                    secucode: identity.secucode,
                    step: None,
                    reason: "build task panicked or was cancelled".to_string(),
                }),
            }
        }
        outcome.stocks = StockList::from(stocks);

        info!(
            built = outcome.stocks.len(),
            failed = outcome.failures.len(),
            concurrency,
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch build complete"
        );

        outcome
    }
}
