use std::sync::OnceLock;
use std::time::Instant;

use hammr_core::{BoxError, EndpointPicker, Handler, HandlerConfig, RequestOutcome, async_trait};
use hammr_http::{HttpClient, HttpRequest, normalize_base_url};

use super::REQUEST_TIMEOUT;

/// GETs a random validator node per request. Success is a response below 400.
#[derive(Default)]
pub(crate) struct HttpHandler {
    client: HttpClient,
    targets: OnceLock<EndpointPicker<String>>,
}

#[async_trait]
impl Handler for HttpHandler {
    async fn init(&self, config: &HandlerConfig) -> Result<(), BoxError> {
        let urls: Vec<String> = config
            .conf
            .validator_nodes
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| normalize_base_url(n))
            .collect();
        if urls.is_empty() {
            return Err(
                anyhow::anyhow!("no validator nodes configured (conf.validatorNodes)").into(),
            );
        }

        let picker = EndpointPicker::new(urls)?;
        tracing::info!(nodes = picker.len(), "http handler ready");
        self.targets
            .set(picker)
            .map_err(|_| anyhow::anyhow!("http handler initialized twice"))?;
        Ok(())
    }

    async fn do_request(&self) -> RequestOutcome {
        let start = Instant::now();
        let Some(targets) = self.targets.get() else {
            return RequestOutcome::failure(start, Instant::now());
        };
        let (_, url) = targets.choose();

        let res = self
            .client
            .request(HttpRequest::get(url.as_str()).timeout(REQUEST_TIMEOUT))
            .await;
        let end = Instant::now();

        match res {
            Ok(res) if res.is_success() => RequestOutcome::success(start, end),
            Ok(res) => {
                tracing::debug!(%url, status = res.status, "request rejected");
                RequestOutcome::failure(start, end)
            }
            Err(err) => {
                tracing::debug!(%url, kind = %err.transport_error_kind(), "request failed: {err}");
                RequestOutcome::failure(start, end)
            }
        }
    }
}
