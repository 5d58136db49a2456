use std::sync::Arc;

use hammr_core::HandlerRegistry;

mod http;
mod noop;
mod sign;

pub(crate) use http::HttpHandler;
pub(crate) use noop::NoopHandler;
pub(crate) use sign::SignerNodeHandler;

/// Upper bound for one request so a hung node cannot hold a worker past the run.
pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Every handler the CLI can select with `-a`.
pub(crate) fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::default();
    registry.insert("noop", Arc::new(NoopHandler));
    registry.insert("http", Arc::new(HttpHandler::default()));
    registry.insert("signernode", Arc::new(SignerNodeHandler::default()));
    registry
}
