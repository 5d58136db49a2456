use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use hammr_core::{Handler, Requester, RunConfig, StopHandle};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cli::Cli;
use crate::config::load_handler_config;
use crate::exit_codes::ExitCode;
use crate::handlers;
use crate::meter::{Meter, MeteredHandler};
use crate::output::{self, ProgressFn, ProgressUpdate, RunHeader};
use crate::run_error::RunError;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);
const STOP_RETRY: Duration = Duration::from_millis(20);

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let handler_config = load_handler_config(cli.config.as_deref())
        .await
        .map_err(RunError::InvalidInput)?;

    let out = output::formatter(cli.output, !cli.no_progress);
    let progress = out.progress();
    let meter = progress.as_ref().map(|_| Arc::new(Meter::default()));

    let mut requester = Requester::new();
    requester.set_run_config(RunConfig {
        duration: cli.duration,
        concurrency: cli.concurrent,
    });
    requester.set_handler_config(handler_config);

    let registry = handlers::builtin_registry();
    for name in registry.names() {
        let Some(handler) = registry.get(name) else {
            continue;
        };
        let handler: Arc<dyn Handler> = match &meter {
            Some(meter) => Arc::new(MeteredHandler::new(handler, meter.clone())),
            None => handler,
        };
        requester.add_handler(name, handler);
    }
    requester
        .select_handler(&cli.handler)
        .map_err(RunError::from_core)?;
    requester.set_reporter(out.clone().into_reporter());

    out.print_header(&RunHeader {
        handler: &cli.handler,
        concurrency: cli.concurrent,
        duration: cli.duration,
    });

    let interrupt = spawn_interrupt_listener(requester.stop_handle());
    let ticker = progress.zip(meter).map(|(progress, meter)| {
        tokio::spawn(tick_progress(
            progress,
            meter,
            requester.stop_handle(),
            cli.duration,
        ))
    });

    let result = requester.start_selected().await;

    interrupt.abort();
    if let Some(ticker) = ticker {
        ticker.abort();
    }

    result.map_err(|err| match err {
        hammr_core::Error::Io(io) => {
            RunError::RuntimeError(anyhow::Error::new(io).context("failed to write report"))
        }
        other => RunError::from_core(other),
    })?;

    Ok(ExitCode::Success)
}

/// First Ctrl-C asks the run to stop and the partial result is still reported.
/// A second one exits at once without a report.
fn spawn_interrupt_listener(stop: StopHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interrupted = false;
        let mut stop_pending = false;
        loop {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res.context("failed to listen for Ctrl-C") {
                        tracing::warn!("{err:#}");
                        return;
                    }
                    if interrupted {
                        eprintln!("error: interrupted again; exiting without a report");
                        std::process::exit(ExitCode::Interrupted.as_i32());
                    }
                    interrupted = true;
                    tracing::warn!(
                        "interrupted; waiting for workers to report (Ctrl-C again to exit now)"
                    );
                    stop_pending = !request_stop(&stop);
                }
                () = tokio::time::sleep(STOP_RETRY), if stop_pending => {
                    stop_pending = !request_stop(&stop);
                }
            }
        }
    })
}

/// Returns `false` while the run has not started yet, so the stop must be retried.
fn request_stop(stop: &StopHandle) -> bool {
    match stop.stop() {
        Ok(()) => true,
        Err(hammr_core::Error::NotStarted) => false,
        Err(err) => {
            tracing::debug!("stop ignored: {err}");
            true
        }
    }
}

async fn tick_progress(
    progress: ProgressFn,
    meter: Arc<Meter>,
    stop: StopHandle,
    duration: Duration,
) {
    let started = Instant::now();
    let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    let mut stopping = false;
    let mut last = meter.snapshot();
    let mut last_at = started;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = stop.stopped(), if !stopping => stopping = true,
        }
        let now = Instant::now();
        let totals = meter.snapshot();
        (progress)(ProgressUpdate {
            elapsed: now.duration_since(started),
            interval: now.duration_since(last_at),
            duration,
            totals,
            delta: totals.since(last),
            stopping,
        });
        last = totals;
        last_at = now;
    }
}
