//! Decoding of DSL documents and interactive payloads.
//!
//! Text is decoded as JSON when it starts with `{` or `[`, otherwise as YAML; either way the
//! result is normalized to a `serde_json::Value` and then shaped into a `TestSuite`:
//! - an object with `testCases` is a full suite (`testCases` must be a list);
//! - an object with `steps` and no `testCases` is a single bare test case;
//! - a bare list is a list of steps forming a single test case.
//!
//! Anything else is a `DecodeError::Shape`.

use serde_json::{Map, Value};
use tracing::trace;

use super::model::{Step, TestCase, TestSuite};
use crate::error::DecodeError;

/// Parse raw text into a JSON-compatible value.
pub fn parse_value(text: &str) -> Result<Value, DecodeError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        trace!(target: "uidsl::dsl", "Decoding payload as JSON");
        Ok(serde_json::from_str(trimmed)?)
    } else {
        trace!(target: "uidsl::dsl", "Decoding payload as YAML");
        Ok(serde_yaml::from_str(trimmed)?)
    }
}

/// Shape a decoded value into a suite. `default_name` names bare cases/suites that carry
/// no name of their own.
pub fn normalize(value: Value, default_name: &str) -> Result<TestSuite, DecodeError> {
    match value {
        Value::Array(items) => {
            let steps: Vec<Step> = serde_json::from_value(Value::Array(items))?;
            Ok(TestSuite {
                name: default_name.to_string(),
                source: None,
                test_cases: vec![TestCase {
                    description: default_name.to_string(),
                    source_file: None,
                    steps,
                }],
            })
        }
        Value::Object(map) if map.contains_key("testCases") => {
            if !map.get("testCases").is_some_and(Value::is_array) {
                return Err(DecodeError::Shape("'testCases' must be a list".into()));
            }
            Ok(serde_json::from_value(Value::Object(map))?)
        }
        Value::Object(map) if map.contains_key("steps") => bare_case(map, default_name),
        Value::Object(_) => Err(DecodeError::Shape(
            "expected an object with 'testCases' or 'steps'".into(),
        )),
        other => Err(DecodeError::Shape(format!(
            "expected an object or a list of steps, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decode text straight into a suite.
pub fn decode_suite(text: &str, default_name: &str) -> Result<TestSuite, DecodeError> {
    normalize(parse_value(text)?, default_name)
}

fn bare_case(map: Map<String, Value>, default_name: &str) -> Result<TestSuite, DecodeError> {
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_name)
        .to_string();
    let mut case: TestCase = serde_json::from_value(Value::Object(map))?;
    if case.description.trim().is_empty() {
        case.description = name.clone();
    }
    Ok(TestSuite {
        name,
        source: None,
        test_cases: vec![case],
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
