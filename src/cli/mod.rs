//! Command handlers for the `cronpulse` binary.

pub(crate) mod exec;
pub(crate) mod ping;

use std::path::Path;

use anyhow::{Context, Result};

use cronpulse::MonitorConfig;

/// Resolve configuration: file (explicit or default), then environment, then
/// the `--base-url` flag.
pub(crate) fn load_config(
    path: Option<&Path>,
    base_url: Option<String>,
) -> Result<MonitorConfig> {
    let mut config = match path {
        Some(path) => {
            let mut config = MonitorConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?;
            config.apply_env_overrides()?;
            config
        }
        None => MonitorConfig::load().with_context(|| "Failed to load configuration")?,
    };

    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://from-file", "timeout_secs": 5}"#).unwrap();

        let config = load_config(Some(&path), Some("http://from-flag".to_string())).unwrap();
        assert_eq!(config.base_url, "http://from-flag");
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.json")), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
