use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::aggregator::Aggregator;
use super::config::{HandlerConfig, RunConfig};
use super::error::{Error, Result};
use super::handler::{Handler, HandlerRegistry};
use super::report::{Reporter, RunReport};
use super::signal::StopSignal;
use super::worker::{WorkerContext, spawn_worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Created,
    Configured,
    Running,
    Stopped,
}

#[derive(Debug)]
struct Lifecycle {
    state: Mutex<RunState>,
    stop: Arc<StopSignal>,
}

impl Lifecycle {
    fn stop(&self) -> Result<()> {
        let state = *self.state.lock();
        match state {
            RunState::Created | RunState::Configured => Err(Error::NotStarted),
            RunState::Running => {
                if self.stop.trigger() {
                    tracing::info!("stop requested; waiting for workers to report");
                }
                Ok(())
            }
            RunState::Stopped => {
                tracing::debug!("stop on a finished run ignored");
                Ok(())
            }
        }
    }
}

/// Cloneable handle for stopping a run from another task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    lifecycle: Arc<Lifecycle>,
}

impl StopHandle {
    /// Same semantics as [`Requester::stop`].
    pub fn stop(&self) -> Result<()> {
        self.lifecycle.stop()
    }

    /// Resolves once a stop was accepted for this run.
    pub async fn stopped(&self) {
        self.lifecycle.stop.wait().await;
    }
}

/// Owns one load run: `Created -> Configured -> Running -> Stopped`.
///
/// Single use. Once a run finished (or failed to initialize) a new requester is needed.
pub struct Requester {
    config: RunConfig,
    handler_config: HandlerConfig,
    registry: HandlerRegistry,
    selected: Option<String>,
    reporter: Option<Arc<dyn Reporter>>,
    lifecycle: Arc<Lifecycle>,
}

impl Default for Requester {
    fn default() -> Self {
        Self::new()
    }
}

impl Requester {
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            handler_config: HandlerConfig::default(),
            registry: HandlerRegistry::default(),
            selected: None,
            reporter: None,
            lifecycle: Arc::new(Lifecycle {
                state: Mutex::new(RunState::Created),
                stop: Arc::new(StopSignal::new()),
            }),
        }
    }

    pub fn state(&self) -> RunState {
        *self.lifecycle.state.lock()
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.config.duration = duration;
        self.mark_configured();
    }

    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.config.concurrency = concurrency;
        self.mark_configured();
    }

    pub fn set_run_config(&mut self, config: RunConfig) {
        self.config = config;
        self.mark_configured();
    }

    pub fn set_handler_config(&mut self, config: HandlerConfig) {
        self.handler_config = config;
        self.mark_configured();
    }

    pub fn add_handler(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.registry.insert(name, handler);
        self.mark_configured();
    }

    pub fn set_reporter(&mut self, reporter: Arc<dyn Reporter>) {
        self.reporter = Some(reporter);
        self.mark_configured();
    }

    /// Select the handler for the next `start`, failing right away if it is unknown.
    pub fn select_handler(&mut self, name: &str) -> Result<()> {
        self.lookup(name)?;
        self.selected = Some(name.to_string());
        self.mark_configured();
        Ok(())
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            lifecycle: self.lifecycle.clone(),
        }
    }

    /// Request a cooperative stop of the running workers.
    ///
    /// Errors with [`Error::NotStarted`] before `start`; a no-op once the run is over.
    pub fn stop(&self) -> Result<()> {
        self.lifecycle.stop()
    }

    /// Start with the handler chosen by [`Requester::select_handler`].
    pub async fn start_selected(&self) -> Result<RunReport> {
        let name = self.selected.clone().ok_or(Error::NoHandlerSelected)?;
        self.start(&name).await
    }

    /// Run the load: init the handler, spawn `concurrency` workers, aggregate their
    /// reports and hand the result to the reporter.
    ///
    /// Blocks until every worker reported, either at the deadline or after `stop`.
    pub async fn start(&self, handler_name: &str) -> Result<RunReport> {
        let handler = self.lookup(handler_name)?;
        let RunConfig {
            duration,
            concurrency,
        } = self.config;
        if concurrency == 0 {
            return Err(Error::InvalidConcurrency);
        }

        self.enter_running()?;

        tracing::info!(handler = handler_name, "initializing handler");
        if let Err(source) = handler.init(&self.handler_config).await {
            self.enter_stopped();
            return Err(Error::HandlerInit {
                name: handler_name.to_string(),
                source,
            });
        }

        let result = self.run(handler, concurrency, duration).await;
        self.enter_stopped();
        let report = result?;

        tracing::info!(
            handler = handler_name,
            requests = report.stats.total_requests,
            errors = report.stats.total_errors,
            elapsed_ms = report.elapsed.as_millis() as u64,
            stopped_early = report.stopped_early,
            "run finished"
        );

        if let Some(reporter) = &self.reporter {
            reporter.report(&report)?;
        }

        Ok(report)
    }

    async fn run(
        &self,
        handler: Arc<dyn Handler>,
        concurrency: usize,
        duration: Duration,
    ) -> Result<RunReport> {
        let stop = self.lifecycle.stop.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let started = Instant::now();
        let ctx = WorkerContext {
            handler,
            stop: stop.clone(),
            started,
            duration,
        };

        tracing::info!(
            concurrency,
            duration_ms = duration.as_millis() as u64,
            "starting workers"
        );
        let handles: Vec<_> = (0..concurrency)
            .map(|id| spawn_worker(id, ctx.clone(), tx.clone()))
            .collect();
        // Workers hold the only senders from here on.
        drop(tx);
        drop(ctx);

        let collected = Aggregator::new(concurrency).collect(&mut rx).await;
        let elapsed = started.elapsed();

        for h in handles {
            if let Err(err) = h.await {
                tracing::error!("worker task failed: {err}");
            }
        }

        let stats = collected?;
        Ok(RunReport {
            stats,
            concurrency,
            duration,
            elapsed,
            stopped_early: stop.is_triggered(),
        })
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Handler>> {
        self.registry.get(name).ok_or_else(|| Error::UnknownHandler {
            name: name.to_string(),
            available: self.available(),
        })
    }

    fn available(&self) -> String {
        let names: Vec<&str> = self.registry.names().collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    }

    fn mark_configured(&mut self) {
        let mut state = self.lifecycle.state.lock();
        if *state == RunState::Created {
            *state = RunState::Configured;
        }
    }

    fn enter_running(&self) -> Result<()> {
        let mut state = self.lifecycle.state.lock();
        match *state {
            RunState::Created | RunState::Configured => {
                *state = RunState::Running;
                Ok(())
            }
            RunState::Running => Err(Error::AlreadyStarted),
            RunState::Stopped => Err(Error::AlreadyFinished),
        }
    }

    fn enter_stopped(&self) {
        *self.lifecycle.state.lock() = RunState::Stopped;
    }
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("selected", &self.selected)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
