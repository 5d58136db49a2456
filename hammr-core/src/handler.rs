use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::HandlerConfig;
use super::error::BoxError;

/// Result of a single unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub start: Instant,
    pub end: Instant,
    pub success: bool,
}

impl RequestOutcome {
    #[must_use]
    pub fn success(start: Instant, end: Instant) -> Self {
        Self {
            start,
            end,
            success: true,
        }
    }

    #[must_use]
    pub fn failure(start: Instant, end: Instant) -> Self {
        Self {
            start,
            end,
            success: false,
        }
    }

    /// Elapsed time between `start` and `end`. Clamped to zero if the pair is inverted.
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }
}

/// A pluggable unit-of-work provider.
///
/// One instance is shared by every worker of a run, so `do_request` must be safe to
/// call concurrently. The harness never interrupts an in-flight `do_request`.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Called exactly once before any worker starts. An error aborts the run.
    async fn init(&self, config: &HandlerConfig) -> Result<(), BoxError>;

    /// Perform one unit of work and report its timing and outcome.
    async fn do_request(&self) -> RequestOutcome;
}

/// Handlers available to a requester, keyed by identifier.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
