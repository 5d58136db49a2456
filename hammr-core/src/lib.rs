#![forbid(unsafe_code)]

mod aggregator;
mod config;
mod error;
mod handler;
mod picker;
mod report;
mod requester;
mod signal;
mod stats;
mod worker;

pub use aggregator::Aggregator;
pub use config::{
    DEFAULT_CONCURRENCY, DEFAULT_DURATION, HandlerConfig, PermissionlessConfig, RunConfig,
    TargetConfig,
};
pub use error::{BoxError, Error, Result};
pub use handler::{Handler, HandlerRegistry, RequestOutcome};
pub use picker::EndpointPicker;
pub use report::{Reporter, RunReport};
pub use requester::{Requester, RunState, StopHandle};
pub use signal::StopSignal;
pub use stats::{AggregatedStats, WorkerStats};
pub use worker::{WorkerContext, run_worker, spawn_worker};

pub use async_trait::async_trait;
