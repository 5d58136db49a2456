use tokio::sync::mpsc;

use super::error::{Error, Result};
use super::stats::{AggregatedStats, WorkerStats};

/// Folds exactly `expected` worker reports into one `AggregatedStats`.
#[derive(Debug)]
pub struct Aggregator {
    expected: usize,
    totals: AggregatedStats,
}

impl Aggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            totals: AggregatedStats::default(),
        }
    }

    /// Fold a report. Returns `true` once every expected report has been folded.
    /// Reports past that point are ignored.
    pub fn fold(&mut self, report: WorkerStats) -> bool {
        if self.is_complete() {
            tracing::warn!(
                expected = self.expected,
                "ignoring worker report received after aggregation completed"
            );
            return true;
        }

        self.totals.fold(&report);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.totals.reported_workers >= self.expected
    }

    pub fn received(&self) -> usize {
        self.totals.reported_workers
    }

    pub fn finish(self) -> AggregatedStats {
        self.totals
    }

    /// Drain `rx` until the expected number of reports arrived.
    ///
    /// Terminates on the count, not on channel close. If every sender is dropped early
    /// the missing reports are surfaced as an error.
    pub async fn collect(
        mut self,
        rx: &mut mpsc::UnboundedReceiver<WorkerStats>,
    ) -> Result<AggregatedStats> {
        while !self.is_complete() {
            match rx.recv().await {
                Some(report) => {
                    self.fold(report);
                }
                None => {
                    return Err(Error::MissingReports {
                        expected: self.expected,
                        received: self.received(),
                    });
                }
            }
        }

        Ok(self.finish())
    }
}
