//! Error taxonomy for step execution and DSL decoding.
//!
//! Step-level errors abort the enclosing test case only; the suite runner turns them into
//! a failed case and keeps going. Decode errors reject a single document or payload.

use std::time::Duration;

use thiserror::Error;

use crate::surface::SurfaceError;

/// A step is missing a field its action requires.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("step is missing required field '{field}' for action '{action}'")]
    MissingField { action: String, field: &'static str },
}

/// Target resolution failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("alias '{0}' is not registered")]
    AliasNotFound(String),

    #[error("action '{0}' requires a selector or an alias")]
    MissingTarget(String),

    /// Only raised when strict type names are enabled.
    #[error("unknown widget type '{0}'")]
    UnknownTypeName(String),
}

/// A wait exceeded its deadline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("timed out after {}ms waiting for {what}", .timeout.as_millis())]
pub struct TimeoutError {
    pub what: String,
    pub timeout: Duration,
}

/// Any failure raised while executing a single step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("index [{index}] is out of range ({found} match(es) for '{query}')")]
    IndexOutOfRange {
        query: String,
        index: usize,
        found: usize,
    },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// A step error re-wrapped with the step's position and target context.
#[derive(Debug, Error)]
#[error("step {step} ({context}) failed: {source}")]
pub struct StepFailure {
    /// One-based step number within the test case.
    pub step: usize,
    /// Action tag and selector/alias, e.g. `click label:Account`.
    pub context: String,
    pub source: StepError,
}

/// A DSL document or interactive payload could not be turned into a suite.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML payload: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported payload shape: {0}")]
    Shape(String),
}
