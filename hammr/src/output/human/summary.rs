use std::fmt::Write as _;

use hammr_core::RunReport;

use super::format::{format_elapsed, format_latency_opt, format_rate};

pub(crate) fn render(report: &RunReport) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    out.push_str("summary\n");
    writeln!(
        &mut out,
        "  requests: {} in {} (failed {})",
        stats.total_requests,
        format_elapsed(report.elapsed),
        stats.total_errors
    )
    .ok();
    writeln!(
        &mut out,
        "  throughput: {} req/s",
        format_rate(report.throughput())
    )
    .ok();
    writeln!(
        &mut out,
        "  latency: avg={} min={} max={}",
        format_latency_opt(stats.mean_latency()),
        format_latency_opt(stats.min_latency()),
        format_latency_opt(stats.max_latency())
    )
    .ok();
    writeln!(
        &mut out,
        "  errors: {} ({:.2}%)",
        stats.total_errors,
        stats.error_rate() * 100.0
    )
    .ok();
    writeln!(
        &mut out,
        "  workers: {}/{} reported",
        stats.reported_workers, report.concurrency
    )
    .ok();
    if report.stopped_early {
        out.push_str("  interrupted before the configured duration\n");
    }

    out
}
