#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! uidsl: a runner for declarative step-DSL UI test suites.
//!
//! The crate drives suites of test cases (JSON or YAML documents) against a running
//! application exposed through the [`surface::UiSurface`] trait. Most implementation details
//! live under the internal modules:
//! - `config`: Runner configuration models, loader, and schema helpers.
//! - `dsl`: Suite/case/step models and document + payload decoding.
//! - `selector`: Selector parsing, alias table, and element matching.
//! - `executor`: Wait primitive, step execution, and the suite runner.
//! - `report`: Structured log protocol, log sinks, and the progress reporter.
//! - `surface`: UI automation surface, app bootstrap hook, in-memory snapshot surface.
//! - `sources`: Remote suite sources, the interactive session, and the payload queue server.
//!
//! Use `uidsl::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, loader, schema helpers).
pub mod config;
/// Public module: suite model and DSL decoding.
pub mod dsl;
/// Public module: error taxonomy shared by the executor and decoders.
pub mod error;
/// Public module: execution engine (waits, steps, suite runner).
pub mod executor;
/// Public module: progress reporting and the structured log protocol.
pub mod report;
/// Public module: selector micro-language.
pub mod selector;
/// Public module: interactive suite sources and the queue server.
pub mod sources;
/// Public module: UI automation surface abstractions.
pub mod surface;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a plain level name (trace|debug|info|warn|error).
pub fn parse_level(raw: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match raw.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(tracing::Level::INFO);
    init_tracing_with_level(level);
}

/// Initialize tracing with an explicit maximum level. Diagnostics go to stderr so that
/// progress lines written to stdout stay machine-readable.
pub fn init_tracing_with_level(level: tracing::Level) {
    // Ignore the error if the global subscriber was already set.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use uidsl::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing helpers
    pub use std::time::Duration;
    pub use tokio::time::sleep;

    pub use crate as uidsl;

    // Frequently used items
    pub use crate::config::RunnerConfig;
    pub use crate::dsl::{Step, TestCase, TestSuite};
    pub use crate::executor::{StepExecutor, SuiteResult, SuiteRunner, TestSession};
    pub use crate::report::{LogSink, Reporter, StdoutSink};
    pub use crate::selector::ElementQuery;
    pub use crate::surface::{AppBootstrap, UiSurface};
    pub use crate::{config, dsl, executor, report, selector, sources, surface};
}
