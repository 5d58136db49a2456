use anyhow::Context as _;
use std::path::{Path, PathBuf};

use hammr_core::HandlerConfig;

/// Picked up from the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "conf.yaml";

/// An explicit path must exist. Without one, `conf.yaml` is optional.
pub(crate) async fn load_handler_config(explicit: Option<&Path>) -> anyhow::Result<HandlerConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            let exists = tokio::fs::try_exists(&p)
                .await
                .with_context(|| format!("failed to check for {DEFAULT_CONFIG_FILE}"))?;
            if !exists {
                tracing::debug!("no {DEFAULT_CONFIG_FILE} found; using defaults");
                return Ok(HandlerConfig::default());
            }
            p
        }
    };

    let src = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = HandlerConfig::from_yaml_str(&src)
        .with_context(|| format!("invalid config: {}", path.display()))?;

    tracing::info!(path = %path.display(), "loaded handler config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn explicit_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "conf:\n  validatorNodes: [\"a:1\", \"b:2\"]\n  signerNodes: [\"c:3\"]"
        )
        .unwrap();

        let cfg = load_handler_config(Some(file.path())).await.unwrap();
        assert_eq!(cfg.conf.validator_nodes, ["a:1", "b:2"]);
        assert_eq!(cfg.conf.signer_nodes, ["c:3"]);
    }

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_handler_config(Some(&dir.path().join("missing.yaml")))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "conf: [unterminated").unwrap();

        let err = load_handler_config(Some(file.path())).await.unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"));
    }
}
