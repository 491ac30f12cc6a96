use anyhow::{Context, Result, anyhow};
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::models::RunnerConfig;

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<RunnerConfig> {
    let cfg: RunnerConfig =
        serde_json::from_str(s).context("Failed to parse JSON config string into RunnerConfig")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<RunnerConfig> {
    let cfg: RunnerConfig =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<RunnerConfig> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<RunnerConfig> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: RunnerConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the config model (for external validation or tooling).
pub fn generate_schema() -> Schema {
    schema_for!(RunnerConfig)
}

/// Write the JSON Schema for the config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Field-level validation (ranges, non-empty strings) plus cross-field sanity checks.
/// An enabled interactive mode without a server URL is allowed: the session logs and
/// returns immediately.
pub fn validate_config(cfg: &RunnerConfig) -> Result<()> {
    cfg.validate()
        .map_err(|errors| anyhow!("Invalid configuration: {errors}"))?;

    if cfg.interactive.enabled && cfg.interactive.endpoint().is_none() {
        warn!("Interactive mode is enabled but no server_url is configured");
    }
    if cfg.waits.poll_interval_ms > cfg.waits.element_timeout_ms {
        warn!(
            poll_interval_ms = cfg.waits.poll_interval_ms,
            element_timeout_ms = cfg.waits.element_timeout_ms,
            "Wait poll interval exceeds the element timeout"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = load_from_str("{}").unwrap();
        assert_eq!(cfg.waits.element_timeout_ms, 3000);
        assert_eq!(cfg.waits.wait_action_ms, 1000);
        assert_eq!(cfg.interactive.exit_command, "exit");
        assert_eq!(cfg.interactive.poll_interval_ms, 1000);
        assert!(!cfg.interactive.enabled);
        assert!(!cfg.strict_type_names);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(load_from_str(r#"{"interactive":{"exit_command":""}}"#).is_err());
        assert!(load_from_str(r#"{"waits":{"poll_interval_ms":0}}"#).is_err());
    }

    #[test]
    fn blank_server_url_is_no_endpoint() {
        let cfg =
            load_from_str(r#"{"interactive":{"enabled":true,"server_url":"  "}}"#).unwrap();
        assert_eq!(cfg.interactive.endpoint(), None);
    }

    #[test]
    fn schema_serializes() {
        let mut out = Vec::new();
        write_schema_to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("element_timeout_ms"));
    }
}
