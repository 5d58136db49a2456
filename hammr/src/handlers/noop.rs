use std::time::Instant;

use hammr_core::{BoxError, Handler, HandlerConfig, RequestOutcome, async_trait};

/// Completes every request immediately. Measures harness overhead.
pub(crate) struct NoopHandler;

#[async_trait]
impl Handler for NoopHandler {
    async fn init(&self, _config: &HandlerConfig) -> Result<(), BoxError> {
        Ok(())
    }

    async fn do_request(&self) -> RequestOutcome {
        let now = Instant::now();
        RequestOutcome::success(now, now)
    }
}
