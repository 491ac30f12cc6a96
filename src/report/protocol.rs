//! Structured log protocol.
//!
//! Every structured message is a single line: [`EVENT_PREFIX`] followed by a JSON object
//! `{"type": <tag>, "payload": {...}}`. A host process can pick these lines out of the
//! console stream without caring how the human-readable lines are formatted.
//!
//! Decoding never fails loudly: a line that lacks the prefix, is not JSON, or lacks a string
//! `type` / object `payload` is simply not structured.

use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Literal prefix marking a structured line.
pub const EVENT_PREFIX: &str = "@@UIDSL_EVENT@@";

/// A decoded structured line with an arbitrary payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredLine {
    pub kind: String,
    pub payload: Map<String, Value>,
}

/// Encode an event tag and payload as one structured line.
pub fn encode(kind: &str, payload: &Value) -> String {
    let body = json!({ "type": kind, "payload": payload });
    format!("{EVENT_PREFIX}{body}")
}

/// Decode a line; `None` means "ordinary free text".
pub fn decode(line: &str) -> Option<StructuredLine> {
    let rest = line.strip_prefix(EVENT_PREFIX)?;
    let Value::Object(mut object) = serde_json::from_str::<Value>(rest.trim()).ok()? else {
        return None;
    };
    let Some(Value::String(kind)) = object.remove("type") else {
        return None;
    };
    let Some(Value::Object(payload)) = object.remove("payload") else {
        return None;
    };
    Some(StructuredLine { kind, payload })
}

/// Outcome of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// The closed set of progress events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProtocolEvent {
    SourceFile {
        path: String,
    },
    TestCaseStart {
        description: String,
        #[serde(default, rename = "sourceFile")]
        source_file: Option<String>,
    },
    TestCaseResult {
        description: String,
        status: CaseStatus,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default, rename = "sourceFile")]
        source_file: Option<String>,
    },
    Summary {
        passed: usize,
        failed: usize,
        #[serde(default, rename = "failedTests")]
        failed_tests: Vec<String>,
    },
}

impl ProtocolEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceFile { .. } => "source_file",
            Self::TestCaseStart { .. } => "test_case_start",
            Self::TestCaseResult { .. } => "test_case_result",
            Self::Summary { .. } => "summary",
        }
    }

    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        match self {
            Self::SourceFile { path } => {
                payload.insert("path".into(), json!(path));
            }
            Self::TestCaseStart {
                description,
                source_file,
            } => {
                payload.insert("description".into(), json!(description));
                if let Some(source) = source_file {
                    payload.insert("sourceFile".into(), json!(source));
                }
            }
            Self::TestCaseResult {
                description,
                status,
                reason,
                source_file,
            } => {
                payload.insert("description".into(), json!(description));
                payload.insert("status".into(), json!(status.as_str()));
                if let Some(reason) = reason {
                    payload.insert("reason".into(), json!(reason));
                }
                if let Some(source) = source_file {
                    payload.insert("sourceFile".into(), json!(source));
                }
            }
            Self::Summary {
                passed,
                failed,
                failed_tests,
            } => {
                payload.insert("passed".into(), json!(passed));
                payload.insert("failed".into(), json!(failed));
                if !failed_tests.is_empty() {
                    payload.insert("failedTests".into(), json!(failed_tests));
                }
            }
        }
        Value::Object(payload)
    }

    pub fn to_line(&self) -> String {
        encode(self.kind(), &self.payload())
    }

    /// Decode a line into a known event. Unknown tags and malformed payloads yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let structured = decode(line)?;
        serde_json::from_value(json!({
            "type": structured.kind,
            "payload": structured.payload,
        }))
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_round_trip() {
        let payload = json!({"a": 1, "nested": {"list": [true, null, "x"]}, "s": "line\nbreak"});
        let line = encode("custom", &payload);
        assert!(!line.contains('\n'));
        let decoded = decode(&line).unwrap();
        assert_eq!(decoded.kind, "custom");
        assert_eq!(Value::Object(decoded.payload), payload);
    }

    #[test]
    fn non_structured_lines_decode_to_none() {
        assert_eq!(decode("plain log output"), None);
        assert_eq!(decode(&format!("{EVENT_PREFIX}not json")), None);
        assert_eq!(decode(&format!("{EVENT_PREFIX}[1,2]")), None);
        assert_eq!(decode(&format!(r#"{EVENT_PREFIX}{{"type":1,"payload":{{}}}}"#)), None);
        assert_eq!(decode(&format!(r#"{EVENT_PREFIX}{{"type":"x","payload":[]}}"#)), None);
        assert_eq!(decode(&format!(r#"  {EVENT_PREFIX}{{"type":"x","payload":{{}}}}"#)), None);
    }

    #[test]
    fn typed_events_round_trip() {
        let events = [
            ProtocolEvent::SourceFile {
                path: "suites/a.yaml".into(),
            },
            ProtocolEvent::TestCaseStart {
                description: "logs in".into(),
                source_file: None,
            },
            ProtocolEvent::TestCaseResult {
                description: "logs in".into(),
                status: CaseStatus::Failed,
                reason: Some("boom".into()),
                source_file: Some("suites/a.yaml".into()),
            },
            ProtocolEvent::Summary {
                passed: 2,
                failed: 1,
                failed_tests: vec!["logs in".into()],
            },
        ];
        for event in events {
            assert_eq!(ProtocolEvent::from_line(&event.to_line()), Some(event));
        }
    }

    #[test]
    fn summary_payload_shape() {
        let line = ProtocolEvent::Summary {
            passed: 3,
            failed: 0,
            failed_tests: vec![],
        }
        .to_line();
        let decoded = decode(&line).unwrap();
        assert_eq!(decoded.kind, "summary");
        assert_eq!(Value::Object(decoded.payload), json!({"passed": 3, "failed": 0}));
    }
}
