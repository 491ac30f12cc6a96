use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Root configuration for the runner.
///
/// Deserialized from a JSON file; every field has a default so `{}` is a valid config.
/// CLI flags override individual fields after loading.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default)]
pub struct RunnerConfig {
    /// Timeouts and polling cadence for waits.
    #[serde(default)]
    #[validate]
    pub waits: WaitConfig,

    /// Remote interactive mode.
    #[serde(default)]
    #[validate]
    pub interactive: InteractiveConfig,

    /// Treat an unknown `type:` name as an error instead of an empty match.
    #[serde(default)]
    pub strict_type_names: bool,
}

/// Wait defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct WaitConfig {
    /// Timeout for element-presence waits when a step has no `waitTime` (default: 3000).
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    /// Delay of the `wait` action when a step has no `waitTime` (default: 1000).
    #[serde(default = "default_wait_action_ms")]
    pub wait_action_ms: u64,

    /// Interval between polls of a wait condition (default: 50).
    #[serde(default = "default_wait_poll_ms")]
    #[validate(minimum = 1)]
    pub poll_interval_ms: u64,
}

impl WaitConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn wait_action(&self) -> Duration {
        Duration::from_millis(self.wait_action_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: default_element_timeout_ms(),
            wait_action_ms: default_wait_action_ms(),
            poll_interval_ms: default_wait_poll_ms(),
        }
    }
}

/// Interactive session settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct InteractiveConfig {
    /// Poll the server for suites after the static suite has run.
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint polled with GET (e.g. "http://127.0.0.1:9000/next").
    #[serde(default)]
    pub server_url: Option<String>,

    /// Response body that ends the session, compared case-insensitively (default: "exit").
    #[serde(default = "default_exit_command")]
    #[validate(min_length = 1)]
    pub exit_command: String,

    /// Sleep between polls when no suite is ready (default: 1000).
    #[serde(default = "default_interactive_poll_ms")]
    #[validate(minimum = 1)]
    pub poll_interval_ms: u64,

    /// Per-request timeout (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    #[validate(minimum = 1)]
    pub request_timeout_ms: u64,

    /// Give up after this many consecutive transport errors. Unset retries forever.
    #[serde(default)]
    pub max_consecutive_errors: Option<u32>,
}

impl InteractiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The configured endpoint, if non-blank.
    pub fn endpoint(&self) -> Option<&str> {
        self.server_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_url: None,
            exit_command: default_exit_command(),
            poll_interval_ms: default_interactive_poll_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_consecutive_errors: None,
        }
    }
}

fn default_element_timeout_ms() -> u64 {
    3000
}

fn default_wait_action_ms() -> u64 {
    1000
}

fn default_wait_poll_ms() -> u64 {
    50
}

fn default_exit_command() -> String {
    "exit".to_string()
}

fn default_interactive_poll_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}
