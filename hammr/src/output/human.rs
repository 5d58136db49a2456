use std::io::Write as _;
use std::sync::Arc;

use hammr_core::{Reporter, RunReport};

mod format;
mod progress;
mod summary;

use format::{format_elapsed, format_rate};
use progress::HumanProgress;
use summary::render;

use super::{OutputFormatter, ProgressFn, ProgressUpdate, RunHeader};

pub(crate) struct HumanReadableOutput {
    progress: Option<Arc<HumanProgress>>,
}

impl HumanReadableOutput {
    pub(crate) fn new(show_progress: bool) -> Self {
        Self {
            progress: show_progress.then(|| Arc::new(HumanProgress::new())),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, header: &RunHeader<'_>) {
        println!(
            "handler: {} workers={} duration={}",
            header.handler,
            header.concurrency,
            humantime::format_duration(header.duration)
        );
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone()?;

        Some(Arc::new(move |u| {
            progress.update(u.duration, u.elapsed, progress_message(&u));
        }))
    }

    fn into_reporter(self: Arc<Self>) -> Arc<dyn Reporter> {
        self
    }
}

fn progress_message(u: &ProgressUpdate) -> String {
    let dt = u.interval.as_secs_f64().max(1e-9);
    let rps = (u.delta.requests as f64) / dt;
    let mut message = format!(
        "elapsed={} rps={} requests={} errors={}/{}",
        format_elapsed(u.elapsed),
        format_rate(rps),
        u.totals.requests,
        u.delta.errors,
        u.totals.errors
    );
    if u.stopping {
        message.push_str(" stopping, waiting for workers");
    }
    message
}

impl Reporter for HumanReadableOutput {
    fn report(&self, report: &RunReport) -> std::io::Result<()> {
        if let Some(p) = &self.progress {
            p.finish();
        }
        let mut out = std::io::stdout().lock();
        out.write_all(render(report).as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::MeterSnapshot;
    use std::time::Duration;

    fn update(stopping: bool) -> ProgressUpdate {
        ProgressUpdate {
            elapsed: Duration::from_secs(2),
            interval: Duration::from_millis(200),
            duration: Duration::from_secs(10),
            totals: MeterSnapshot {
                requests: 120,
                errors: 3,
            },
            delta: MeterSnapshot {
                requests: 20,
                errors: 1,
            },
            stopping,
        }
    }

    #[test]
    fn progress_message_shows_running_totals() {
        let message = progress_message(&update(false));
        assert!(message.contains("requests=120"), "{message}");
        assert!(message.contains("errors=1/3"), "{message}");
        assert!(!message.contains("stopping"), "{message}");
    }

    #[test]
    fn progress_message_marks_a_pending_stop() {
        let message = progress_message(&update(true));
        assert!(message.ends_with("stopping, waiting for workers"), "{message}");
    }
}
