use std::sync::Arc;
use std::time::Duration;

use hammr_core::Reporter;

use crate::cli::OutputFormat;
use crate::meter::MeterSnapshot;

mod human;
mod json;

/// What the run is about to do, printed before the first request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunHeader<'a> {
    pub handler: &'a str,
    pub concurrency: usize,
    pub duration: Duration,
}

/// Live view of a running test, fed by the progress ticker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressUpdate {
    pub elapsed: Duration,
    pub interval: Duration,
    pub duration: Duration,
    pub totals: MeterSnapshot,
    pub delta: MeterSnapshot,
    /// A stop was requested and workers are finishing their last request.
    pub stopping: bool,
}

pub(crate) type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

pub(crate) trait OutputFormatter: Reporter {
    fn print_header(&self, header: &RunHeader<'_>);
    fn progress(&self) -> Option<ProgressFn>;
    fn into_reporter(self: Arc<Self>) -> Arc<dyn Reporter>;
}

pub(crate) fn formatter(format: OutputFormat, show_progress: bool) -> Arc<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Arc::new(human::HumanReadableOutput::new(show_progress)),
        OutputFormat::Json => Arc::new(json::JsonOutput),
    }
}
