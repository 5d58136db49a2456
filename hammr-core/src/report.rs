use std::time::Duration;

use super::stats::AggregatedStats;

/// Final result of a run, handed to the reporter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub stats: AggregatedStats,
    pub concurrency: usize,
    /// Configured run duration.
    pub duration: Duration,
    /// Wall-clock time from the shared start instant until the last report arrived.
    pub elapsed: Duration,
    /// `true` if the run ended through `stop()` rather than the deadline.
    pub stopped_early: bool,
}

impl RunReport {
    /// Requests completed per second of wall-clock run time.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.stats.total_requests as f64 / secs
    }
}

/// What to do with the final result (print it, export it, ...).
pub trait Reporter: Send + Sync {
    fn report(&self, report: &RunReport) -> std::io::Result<()>;
}
