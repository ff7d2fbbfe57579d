//! Bounded-parallel batch conversion.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

use super::error::ConversionError;
use super::executor::ConversionEngine;
use super::types::{ConversionRequest, ConversionResult};

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Per-request outcomes of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<Result<ConversionResult, ConversionError>>,
    pub summary: BatchSummary,
}

/// Runs many requests through one engine with a cap on concurrency.
pub struct BatchConverter {
    engine: Arc<ConversionEngine>,
    semaphore: Arc<Semaphore>,
    max_parallel: usize,
}

impl BatchConverter {
    /// Creates a batch runner allowing `max_parallel` conversions in flight.
    pub fn new(engine: Arc<ConversionEngine>, max_parallel: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            engine,
            semaphore: Arc::new(Semaphore::new(max_parallel)),
            max_parallel,
        }
    }

    /// Maximum number of conversions in flight.
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Converts every request. A failing request never stops the others.
    pub async fn run(&self, requests: Vec<ConversionRequest>) -> BatchReport {
        let total = requests.len();
        info!(
            "Starting batch of {} conversions ({} in parallel)",
            total, self.max_parallel
        );

        let conversions = requests.into_iter().map(|request| {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&self.semaphore);
            async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                engine.convert(request).await
            }
        });
        let results = join_all(conversions).await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let summary = BatchSummary {
            total,
            succeeded,
            failed: total - succeeded,
        };

        info!(
            "Batch finished: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        BatchReport { results, summary }
    }
}
