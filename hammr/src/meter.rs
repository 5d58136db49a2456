use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hammr_core::{BoxError, Handler, HandlerConfig, RequestOutcome, async_trait};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MeterSnapshot {
    pub requests: u64,
    pub errors: u64,
}

impl MeterSnapshot {
    #[must_use]
    pub(crate) fn since(self, earlier: Self) -> Self {
        Self {
            requests: self.requests.saturating_sub(earlier.requests),
            errors: self.errors.saturating_sub(earlier.errors),
        }
    }
}

/// Running request/error counters shared by every worker.
///
/// Only feeds the live progress view; the final numbers come from the aggregated
/// worker reports.
#[derive(Debug, Default)]
pub(crate) struct Meter {
    requests: AtomicU64,
    errors: AtomicU64,
}

impl Meter {
    fn record(&self, success: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Counts outcomes of the wrapped handler into a [`Meter`].
pub(crate) struct MeteredHandler {
    inner: Arc<dyn Handler>,
    meter: Arc<Meter>,
}

impl MeteredHandler {
    pub(crate) fn new(inner: Arc<dyn Handler>, meter: Arc<Meter>) -> Self {
        Self { inner, meter }
    }
}

#[async_trait]
impl Handler for MeteredHandler {
    async fn init(&self, config: &HandlerConfig) -> Result<(), BoxError> {
        self.inner.init(config).await
    }

    async fn do_request(&self) -> RequestOutcome {
        let outcome = self.inner.do_request().await;
        self.meter.record(outcome.success);
        outcome
    }
}
