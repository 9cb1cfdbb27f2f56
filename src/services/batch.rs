//! Batch extraction coordinator.

use std::sync::Arc;

use tracing::info;

use super::pipeline::{ExtractionPipeline, ItemReport};

/// Aggregate result of a batch run. The per-item reports always agree
/// with the counts.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub success: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// Caller-facing summary line.
    pub fn summary(&self) -> String {
        format!(
            "batch complete, success:{}, failed:{}",
            self.success, self.failed
        )
    }
}

/// Runs the single-item pipeline over a set of items, isolating per-item
/// failures.
pub struct BatchCoordinator {
    pipeline: Arc<ExtractionPipeline>,
}

impl BatchCoordinator {
    pub fn new(pipeline: Arc<ExtractionPipeline>) -> Self {
        Self { pipeline }
    }

    /// Extract every item in turn. One item's failure never aborts the
    /// rest; each item commits its own detail record.
    pub async fn run(&self, ids: &[i64]) -> BatchReport {
        let mut report = BatchReport::default();

        for &id in ids {
            let item = self.pipeline.run_one(id).await;
            if item.outcome.is_success() {
                report.success += 1;
            } else {
                report.failed += 1;
            }
            report.items.push(item);
        }

        info!(
            total = ids.len(),
            success = report.success,
            failed = report.failed,
            "batch extraction finished"
        );
        report
    }
}
