use std::sync::Arc;

use super::protocol::{CaseStatus, ProtocolEvent};
use super::sink::LogSink;

/// Emits test progress to a sink: every structured event is paired with human-readable
/// console lines.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn LogSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Write a free-text line.
    pub fn line(&self, line: &str) {
        self.sink.write_line(line);
    }

    fn event(&self, event: &ProtocolEvent) {
        self.sink.write_line(&event.to_line());
    }

    pub fn source_file(&self, path: &str) {
        self.event(&ProtocolEvent::SourceFile {
            path: path.to_string(),
        });
        self.line("");
        self.line(&format!("=== Source: {path} ==="));
    }

    pub fn case_start(&self, description: &str, source_file: Option<&str>) {
        self.event(&ProtocolEvent::TestCaseStart {
            description: description.to_string(),
            source_file: source_file.map(str::to_string),
        });
        self.line(&format!("▶ {description}"));
    }

    pub fn case_passed(&self, description: &str, source_file: Option<&str>) {
        self.event(&ProtocolEvent::TestCaseResult {
            description: description.to_string(),
            status: CaseStatus::Passed,
            reason: None,
            source_file: source_file.map(str::to_string),
        });
        self.line(&format!("  ✓ PASSED: {description}"));
    }

    pub fn case_failed(&self, description: &str, reason: &str, source_file: Option<&str>) {
        self.event(&ProtocolEvent::TestCaseResult {
            description: description.to_string(),
            status: CaseStatus::Failed,
            reason: Some(reason.to_string()),
            source_file: source_file.map(str::to_string),
        });
        self.line(&format!("  ✗ FAILED: {description}"));
        self.line(&format!("    reason: {reason}"));
    }

    pub fn step_skipped(&self, step: usize, action: &str) {
        self.line(&format!("    ! step {step}: unknown action '{action}', skipped"));
    }

    pub fn summary(&self, passed: usize, failed: usize, failed_tests: &[String]) {
        self.event(&ProtocolEvent::Summary {
            passed,
            failed,
            failed_tests: failed_tests.to_vec(),
        });
        self.line("");
        self.line("=== Test Summary ===");
        self.line(&format!("Passed: {passed}"));
        self.line(&format!("Failed: {failed}"));
        if !failed_tests.is_empty() {
            self.line("Failed tests:");
            for name in failed_tests {
                self.line(&format!("  - {name}"));
            }
        }
    }
}
