use std::sync::OnceLock;
use std::time::Instant;

use bytes::Bytes;
use hammr_core::{
    BoxError, EndpointPicker, Handler, HandlerConfig, PermissionlessConfig, RequestOutcome,
    async_trait,
};
use hammr_http::{HttpClient, HttpRequest, normalize_base_url};
use serde::Serialize;

use super::REQUEST_TIMEOUT;

const SIGN_PATH: &str = "/sign";
const SIGN_CONTENT: &str = "Hello";
const SMART_CONTRACT_ADDRESS: &str = "intkey";

const SCHEMES: &[&str] = &["TBLS256", "TRSA1024", "TRSA2048"];
const SCHEME_MODES: &[&str] = &["", "Optimistic", "Pessimistic"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningParams {
    n: u32,
    t: u32,
    scheme: String,
    one_time_key: bool,
    random_group: bool,
    relay_to_ledger: bool,
}

impl SigningParams {
    fn from_config(cfg: &PermissionlessConfig) -> anyhow::Result<Option<Self>> {
        if !cfg.is_enabled() {
            return Ok(None);
        }
        if cfg.t == 0 || cfg.t > cfg.n {
            anyhow::bail!(
                "invalid permissionless threshold: t={} must be within 1..={}",
                cfg.t,
                cfg.n
            );
        }
        if !is_known_scheme(&cfg.scheme) {
            anyhow::bail!(
                "unknown signature scheme `{}` (expected one of {}, optionally suffixed Optimistic or Pessimistic)",
                cfg.scheme,
                SCHEMES.join(", ")
            );
        }

        Ok(Some(Self {
            n: cfg.n,
            t: cfg.t,
            scheme: cfg.scheme.clone(),
            one_time_key: cfg.one_time_key,
            random_group: cfg.random_group,
            relay_to_ledger: cfg.relay_to_ledger,
        }))
    }
}

fn is_known_scheme(scheme: &str) -> bool {
    SCHEMES.iter().any(|base| {
        scheme
            .strip_prefix(base)
            .is_some_and(|mode| SCHEME_MODES.contains(&mode))
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    uuid: String,
    content: &'a str,
    smart_contract_address: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    key_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signing_params: Option<&'a SigningParams>,
}

struct SignerTargets {
    urls: EndpointPicker<String>,
    token: Option<String>,
    key: String,
    params: Option<SigningParams>,
}

impl SignerTargets {
    fn body(&self) -> serde_json::Result<Bytes> {
        let req = SignRequest {
            uuid: uuid::Uuid::new_v4().to_string(),
            content: SIGN_CONTENT,
            smart_contract_address: SMART_CONTRACT_ADDRESS,
            key_id: &self.key,
            signing_params: self.params.as_ref(),
        };
        serde_json::to_vec(&req).map(Bytes::from)
    }
}

/// POSTs a fresh sign request to a random signer node per request.
#[derive(Default)]
pub(crate) struct SignerNodeHandler {
    client: HttpClient,
    targets: OnceLock<SignerTargets>,
}

#[async_trait]
impl Handler for SignerNodeHandler {
    async fn init(&self, config: &HandlerConfig) -> Result<(), BoxError> {
        let conf = &config.conf;
        let urls: Vec<String> = conf
            .signer_nodes
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| format!("{}{SIGN_PATH}", normalize_base_url(n)))
            .collect();
        if urls.is_empty() {
            return Err(
                anyhow::anyhow!("no signer nodes configured (conf.signerNodes)").into(),
            );
        }
        let params = SigningParams::from_config(&conf.permissionless)?;

        let targets = SignerTargets {
            urls: EndpointPicker::new(urls)?,
            token: (!conf.token.is_empty()).then(|| conf.token.clone()),
            key: conf.key.clone(),
            params,
        };
        tracing::info!(
            nodes = targets.urls.len(),
            permissionless = targets.params.is_some(),
            "signer node handler ready"
        );
        self.targets
            .set(targets)
            .map_err(|_| anyhow::anyhow!("signer node handler initialized twice"))?;
        Ok(())
    }

    async fn do_request(&self) -> RequestOutcome {
        let start = Instant::now();
        let Some(targets) = self.targets.get() else {
            return RequestOutcome::failure(start, Instant::now());
        };

        let body = match targets.body() {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!("failed to encode sign request: {err}");
                return RequestOutcome::failure(start, Instant::now());
            }
        };
        let (_, url) = targets.urls.choose();
        let mut req = HttpRequest::post(url.as_str(), body)
            .header("content-type", "application/json")
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = &targets.token {
            req = req.bearer(token);
        }

        // Timed from the send; building the body is not part of the latency.
        let start = Instant::now();
        let res = self.client.request(req).await;
        let end = Instant::now();

        match res {
            Ok(res) if res.is_success() => RequestOutcome::success(start, end),
            Ok(res) => {
                tracing::debug!(%url, status = res.status, "sign request rejected");
                RequestOutcome::failure(start, end)
            }
            Err(err) => {
                tracing::debug!(
                    %url,
                    kind = %err.transport_error_kind(),
                    "sign request failed: {err}"
                );
                RequestOutcome::failure(start, end)
            }
        }
    }
}
