use std::time::Duration;

use super::handler::RequestOutcome;

/// Sentinel minimum for a summary that has not seen a request yet.
pub(crate) const MIN_LATENCY_SENTINEL: Duration = Duration::MAX;

/// Running summary of one worker. Owned by that worker until it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub total_duration: Duration,
    pub min_latency: Duration,
    pub max_latency: Duration,
    pub requests: u64,
    pub errors: u64,
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self {
            total_duration: Duration::ZERO,
            min_latency: MIN_LATENCY_SENTINEL,
            max_latency: Duration::ZERO,
            requests: 0,
            errors: 0,
        }
    }
}

impl WorkerStats {
    pub fn record(&mut self, outcome: &RequestOutcome) {
        let latency = outcome.latency();

        self.requests = self.requests.saturating_add(1);
        if !outcome.success {
            self.errors = self.errors.saturating_add(1);
        }
        self.total_duration = self.total_duration.saturating_add(latency);
        self.min_latency = self.min_latency.min(latency);
        self.max_latency = self.max_latency.max(latency);
    }

    #[must_use]
    pub fn min_latency(&self) -> Option<Duration> {
        (self.requests > 0).then_some(self.min_latency)
    }

    #[must_use]
    pub fn max_latency(&self) -> Option<Duration> {
        (self.requests > 0).then_some(self.max_latency)
    }
}

/// Run-wide summary folded from every worker's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatedStats {
    pub total_duration: Duration,
    pub min_latency: Duration,
    pub max_latency: Duration,
    pub total_requests: u64,
    pub total_errors: u64,
    pub reported_workers: usize,
}

impl Default for AggregatedStats {
    fn default() -> Self {
        Self {
            total_duration: Duration::ZERO,
            min_latency: MIN_LATENCY_SENTINEL,
            max_latency: Duration::ZERO,
            total_requests: 0,
            total_errors: 0,
            reported_workers: 0,
        }
    }
}

impl AggregatedStats {
    /// Fold one worker report in. Sums and min/max only, so the result does not
    /// depend on arrival order.
    pub fn fold(&mut self, w: &WorkerStats) {
        self.total_requests = self.total_requests.saturating_add(w.requests);
        self.total_errors = self.total_errors.saturating_add(w.errors);
        self.total_duration = self.total_duration.saturating_add(w.total_duration);

        // Idle workers still carry the sentinel; keep it out of the global minimum.
        if w.requests > 0 {
            self.min_latency = self.min_latency.min(w.min_latency);
            self.max_latency = self.max_latency.max(w.max_latency);
        }

        self.reported_workers = self.reported_workers.saturating_add(1);
    }

    #[must_use]
    pub fn min_latency(&self) -> Option<Duration> {
        (self.total_requests > 0).then_some(self.min_latency)
    }

    #[must_use]
    pub fn max_latency(&self) -> Option<Duration> {
        (self.total_requests > 0).then_some(self.max_latency)
    }

    /// Mean per-request latency.
    #[must_use]
    pub fn mean_latency(&self) -> Option<Duration> {
        if self.total_requests == 0 {
            return None;
        }
        let nanos = self.total_duration.as_nanos() / u128::from(self.total_requests);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    #[must_use]
    pub fn successful_requests(&self) -> u64 {
        self.total_requests.saturating_sub(self.total_errors)
    }

    /// Share of failed requests in `0.0..=1.0`.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_errors as f64 / self.total_requests as f64
    }
}
