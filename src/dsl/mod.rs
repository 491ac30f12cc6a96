//! DSL module: suite model, decoding, and file loaders.
//!
//! Example:
//! use uidsl::dsl::load_suite_from_path;
//!
//! let suite = load_suite_from_path("suites/login.yaml")?;

use std::path::Path;

use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use tracing::debug;

pub mod decode;
pub mod model;

pub use decode::{decode_suite, normalize, parse_value};
pub use model::{Step, TestCase, TestSuite, WaitTime};

/// Decode a suite document. The file name is used as the default suite name and the
/// path as the default source label.
pub fn load_suite_from_str(text: &str, path: &Path) -> Result<TestSuite> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("suite")
        .to_string();
    let label = path.display().to_string();
    let suite = decode_suite(text, &name)
        .with_context(|| format!("Failed to decode suite document {label}"))?
        .with_defaults(&name, &label);
    debug!(
        target: "uidsl::dsl",
        suite = %suite.name,
        cases = suite.test_cases.len(),
        "Loaded suite from {label}"
    );
    Ok(suite)
}

/// Load a suite document synchronously.
pub fn load_suite_from_path<P: AsRef<Path>>(path: P) -> Result<TestSuite> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suite file {}", path.display()))?;
    load_suite_from_str(&text, path)
}

/// Load a suite document asynchronously (Tokio).
pub async fn load_suite_from_path_async<P: AsRef<Path>>(path: P) -> Result<TestSuite> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read suite file {}", path.display()))?;
    load_suite_from_str(&text, path)
}

/// JSON Schema of the DSL document.
pub fn generate_suite_schema() -> Schema {
    schema_for!(TestSuite)
}
