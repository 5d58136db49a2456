use serde::Deserialize;
use std::time::Duration;

use super::error::Result;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Shape of a single run. Immutable once the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub duration: Duration,
    pub concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Configuration payload handed to `Handler::init`.
///
/// The harness never inspects it. Every field is optional in the YAML source and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HandlerConfig {
    #[serde(default)]
    pub conf: TargetConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetConfig {
    pub validator_nodes: Vec<String>,
    pub signer_nodes: Vec<String>,

    /// Name (or path) of the signing key used by signer-node requests.
    pub key: String,

    /// Access token sent along with requests, if non-empty.
    pub token: String,

    pub permissionless: PermissionlessConfig,
}

/// Parameters for permissionless threshold signing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionlessConfig {
    /// Participant count.
    pub n: u32,
    /// Signature threshold.
    pub t: u32,
    pub scheme: String,
    pub one_time_key: bool,
    pub random_group: bool,
    /// Also relay the signed content to a secondary ledger.
    pub relay_to_ledger: bool,
}

impl PermissionlessConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.n > 0
    }
}

impl HandlerConfig {
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        // An empty document deserializes to `null`, which serde_yaml refuses for a struct.
        if src.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(src)?)
    }
}
