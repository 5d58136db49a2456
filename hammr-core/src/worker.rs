use futures_util::FutureExt as _;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::handler::{Handler, RequestOutcome};
use super::signal::StopSignal;
use super::stats::WorkerStats;

/// Everything a worker shares with its siblings.
#[derive(Clone)]
pub struct WorkerContext {
    pub handler: Arc<dyn Handler>,
    pub stop: Arc<StopSignal>,
    /// Common start instant; the deadline is `started + duration`.
    pub started: Instant,
    pub duration: Duration,
}

/// Run one virtual client until the stop signal or the deadline, whichever comes first.
///
/// Tight loop: no sleeps, no retries. A failed request is one error and the next
/// iteration starts immediately.
pub async fn run_worker(id: usize, ctx: &WorkerContext) -> WorkerStats {
    let mut stats = WorkerStats::default();

    loop {
        if ctx.stop.is_triggered() {
            tracing::debug!(worker = id, requests = stats.requests, "worker stopped");
            break;
        }
        if ctx.started.elapsed() >= ctx.duration {
            tracing::debug!(worker = id, requests = stats.requests, "worker reached deadline");
            break;
        }

        let outcome = call_handler(id, ctx.handler.as_ref()).await;
        stats.record(&outcome);

        // Yields only once the task's scheduler budget is spent, so a handler that
        // never awaits still lets a stop through.
        tokio::task::consume_budget().await;
    }

    stats
}

/// A panicking `do_request` becomes one failed request timed by the worker itself.
async fn call_handler(id: usize, handler: &dyn Handler) -> RequestOutcome {
    let fallback_start = Instant::now();
    match AssertUnwindSafe(handler.do_request()).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            tracing::warn!(
                worker = id,
                panic = panic_message(panic.as_ref()),
                "handler panicked; counted as a failed request"
            );
            RequestOutcome::failure(fallback_start, Instant::now())
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Spawn a worker task that sends exactly one report on `tx` when it stops.
pub fn spawn_worker(
    id: usize,
    ctx: WorkerContext,
    tx: mpsc::UnboundedSender<WorkerStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stats = run_worker(id, &ctx).await;
        if tx.send(stats).is_err() {
            tracing::debug!(worker = id, "aggregator gone; report dropped");
        }
    })
}
