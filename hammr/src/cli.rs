use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10, 10s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 10, 10s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10, 10s, 250ms, 1m)"))?;

    // A bare number is seconds.
    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            let secs = value
                .checked_mul(60)
                .and_then(|v| v.checked_mul(60))
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!(
            "invalid duration '{s}' (expected e.g. 10, 10s, 250ms, 1m)"
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit one JSON summary line to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "hammr",
    author,
    version,
    about = "Closed-loop load generator with pluggable request handlers",
    long_about = "hammr keeps N concurrent workers issuing requests back-to-back through the selected handler until the duration elapses or the run is interrupted (Ctrl-C), then prints aggregated latency and error statistics.\n\nHandler targets are read from a YAML file (`--config`, or ./conf.yaml when present).",
    after_help = "Examples:\n  hammr -a http -c 50 -d 30s\n  hammr -a signernode -c 8 -d 1m --config nodes.yaml\n  hammr -a noop -c 4 -d 500ms --output json"
)]
pub struct Cli {
    /// Number of concurrent workers
    #[arg(short = 'c', long = "concurrent", default_value_t = hammr_core::DEFAULT_CONCURRENCY)]
    pub concurrent: usize,

    /// Run duration (bare number = seconds; e.g. 10, 250ms, 1m)
    #[arg(short = 'd', long, value_parser = parse_duration, default_value = "10")]
    pub duration: Duration,

    /// Request handler to drive (noop, http, signernode)
    #[arg(short = 'a', long = "handler", default_value = "http")]
    pub handler: String,

    /// YAML handler configuration (defaults to ./conf.yaml when present)
    #[arg(long, value_name = "PATH", env = "HAMMR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Disable the live progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}
