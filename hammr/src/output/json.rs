use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use hammr_core::{Reporter, RunReport};

use super::{OutputFormatter, ProgressFn, RunHeader};

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _header: &RunHeader<'_>) {}

    fn progress(&self) -> Option<ProgressFn> {
        None
    }

    fn into_reporter(self: Arc<Self>) -> Arc<dyn Reporter> {
        self
    }
}

impl Reporter for JsonOutput {
    fn report(&self, report: &RunReport) -> std::io::Result<()> {
        let line = build_summary_line(report);
        let mut out = std::io::stdout().lock();
        serde_json::to_writer(&mut out, &line)?;
        writeln!(out)
    }
}

/// Latencies are whole microseconds; `None` when no request completed.
#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub concurrency: usize,
    pub duration_secs: f64,
    pub elapsed_secs: f64,
    pub stopped_early: bool,
    pub workers_reported: usize,

    pub total_requests: u64,
    pub total_errors: u64,
    pub requests_per_sec: f64,

    pub latency_mean_us: Option<u64>,
    pub latency_min_us: Option<u64>,
    pub latency_max_us: Option<u64>,
}

fn micros(d: Option<Duration>) -> Option<u64> {
    d.map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

fn build_summary_line(report: &RunReport) -> JsonSummaryLine {
    let stats = &report.stats;
    JsonSummaryLine {
        kind: "summary",
        concurrency: report.concurrency,
        duration_secs: report.duration.as_secs_f64(),
        elapsed_secs: report.elapsed.as_secs_f64(),
        stopped_early: report.stopped_early,
        workers_reported: stats.reported_workers,

        total_requests: stats.total_requests,
        total_errors: stats.total_errors,
        requests_per_sec: report.throughput(),

        latency_mean_us: micros(stats.mean_latency()),
        latency_min_us: micros(stats.min_latency()),
        latency_max_us: micros(stats.max_latency()),
    }
}
