use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named, ordered collection of test cases. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    #[serde(default)]
    pub name: String,

    /// Source label (typically the file the suite came from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    /// Fill in a missing name and source label, and stamp the source label on every case
    /// that lacks its own.
    pub fn with_defaults(mut self, name: &str, source: &str) -> Self {
        if self.name.trim().is_empty() {
            self.name = name.to_string();
        }
        let source = self.source.get_or_insert_with(|| source.to_string()).clone();
        for case in &mut self.test_cases {
            if case.source_file.is_none() {
                case.source_file = Some(source.clone());
            }
        }
        self
    }
}

/// A single test case. Descriptions are used for reporting and need not be unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One DSL step. Only `action` is always meaningful; the rest depends on the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Action tag (e.g. `click`, `type`, `assert_text`). Missing deserializes as empty.
    #[serde(default)]
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_string"
    )]
    pub value: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_string"
    )]
    pub expected: Option<String>,

    /// Milliseconds; an integer or a numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<WaitTime>,
}

impl Step {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn wait_ms(mut self, ms: u64) -> Self {
        self.wait_time = Some(WaitTime::Millis(ms));
        self
    }

    /// The step's wait time, or `default` when absent or not numeric.
    pub fn wait_time_or(&self, default: Duration) -> Duration {
        self.wait_time
            .as_ref()
            .and_then(WaitTime::as_millis)
            .map(Duration::from_millis)
            .unwrap_or(default)
    }
}

/// Raw `waitTime` value as written in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum WaitTime {
    Millis(u64),
    Text(String),
    Other(Value),
}

impl WaitTime {
    /// Milliseconds, if the value is a non-negative integer or a numeric string.
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Self::Millis(ms) => Some(*ms),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<u64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f as u64)
                })
            }
            Self::Other(Value::Number(n)) => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64),
            Self::Other(_) => None,
        }
    }
}

/// Accept strings, numbers, and booleans for free-text step fields (YAML authors often
/// write `value: 42`).
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar value, got {other}"
            )));
        }
    })
}
