use tracing::{debug, info, warn};

use super::actions::{StepExecutor, StepOutcome};
use super::session::TestSession;
use crate::dsl::{TestCase, TestSuite};
use crate::error::StepFailure;
use crate::report::Reporter;

/// Aggregate outcome of one or more suite runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteResult {
    pub passed: usize,
    pub failed: usize,
    /// Descriptions of failed cases, deduplicated, in first-failure order.
    pub failed_tests: Vec<String>,
}

impl SuiteResult {
    pub fn record_pass(&mut self) {
        self.passed += 1;
    }

    pub fn record_failure(&mut self, description: &str) {
        self.failed += 1;
        if !self.failed_tests.iter().any(|d| d == description) {
            self.failed_tests.push(description.to_string());
        }
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: SuiteResult) {
        self.passed += other.passed;
        self.failed += other.failed;
        for description in other.failed_tests {
            if !self.failed_tests.contains(&description) {
                self.failed_tests.push(description);
            }
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs suites case by case, single pass, no retries.
///
/// A failing step aborts its test case; a failing case never aborts the suite. The runner
/// never raises on accumulated failures; callers inspect the returned `SuiteResult`.
pub struct SuiteRunner {
    executor: StepExecutor,
    reporter: Reporter,
    current_source: Option<String>,
}

impl SuiteRunner {
    pub fn new(executor: StepExecutor, reporter: Reporter) -> Self {
        Self {
            executor,
            reporter,
            current_source: None,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Let the UI settle between suites.
    pub async fn settle(&self) {
        self.executor.settle().await;
    }

    pub async fn run(&mut self, suite: &TestSuite, session: &mut TestSession) -> SuiteResult {
        info!(
            target: "uidsl::runner",
            suite = %suite.name,
            cases = suite.test_cases.len(),
            "Starting suite"
        );
        let mut result = SuiteResult::default();

        for case in &suite.test_cases {
            let source = case.source_file.as_deref().or(suite.source.as_deref());
            self.track_source(source);

            self.reporter.case_start(&case.description, source);
            match self.run_case(case, session).await {
                Ok(()) => {
                    self.reporter.case_passed(&case.description, source);
                    result.record_pass();
                }
                Err(failure) => {
                    warn!(
                        target: "uidsl::runner",
                        case = %case.description,
                        error = %failure,
                        "Test case failed"
                    );
                    self.reporter
                        .case_failed(&case.description, &failure.to_string(), source);
                    result.record_failure(&case.description);
                }
            }
        }

        self.reporter
            .summary(result.passed, result.failed, &result.failed_tests);
        info!(
            target: "uidsl::runner",
            suite = %suite.name,
            passed = result.passed,
            failed = result.failed,
            "Suite completed"
        );
        result
    }

    fn track_source(&mut self, source: Option<&str>) {
        let Some(source) = source else {
            return;
        };
        if self.current_source.as_deref() != Some(source) {
            self.reporter.source_file(source);
            self.current_source = Some(source.to_string());
        }
    }

    async fn run_case(
        &mut self,
        case: &TestCase,
        session: &mut TestSession,
    ) -> Result<(), StepFailure> {
        for (index, step) in case.steps.iter().enumerate() {
            let outcome = self.executor.execute(session, index, step).await?;
            if let StepOutcome::Skipped(tag) = outcome {
                self.reporter.step_skipped(index + 1, &tag);
            }
        }
        debug!(target: "uidsl::runner", case = %case.description, steps = case.steps.len(), "Case finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::dsl::Step;
    use crate::report::{CaseStatus, MemorySink, ProtocolEvent};
    use crate::surface::{ElementKind, ElementNode, Interaction, SnapshotSurface};
    use std::sync::Arc;

    struct Harness {
        surface: Arc<SnapshotSurface>,
        sink: Arc<MemorySink>,
        runner: SuiteRunner,
    }

    fn harness(roots: Vec<ElementNode>) -> Harness {
        let mut cfg = RunnerConfig::default();
        cfg.waits.element_timeout_ms = 30;
        cfg.waits.poll_interval_ms = 2;
        let surface = Arc::new(SnapshotSurface::new(roots));
        let sink = Arc::new(MemorySink::new());
        let runner = SuiteRunner::new(
            StepExecutor::new(surface.clone(), &cfg),
            Reporter::new(sink.clone()),
        );
        Harness {
            surface,
            sink,
            runner,
        }
    }

    fn case(description: &str, steps: Vec<Step>) -> TestCase {
        TestCase {
            description: description.into(),
            source_file: None,
            steps,
        }
    }

    #[tokio::test]
    async fn failing_step_aborts_only_its_case() {
        let mut h = harness(vec![
            ElementNode::text("Home").with_key("home"),
            ElementNode::new(ElementKind::Button).with_key("next"),
        ]);
        let suite = TestSuite {
            name: "three".into(),
            source: None,
            test_cases: vec![
                case("first", vec![Step::new("assert_visible").selector("Home")]),
                case(
                    "second",
                    vec![
                        Step::new("assert_visible").selector("Home"),
                        Step::new("assert_text").selector("key:home").expected("Away"),
                        Step::new("click").selector("key:next"),
                    ],
                ),
                case("third", vec![Step::new("click").selector("key:next")]),
            ],
        };
        let mut session = TestSession::new();
        let result = h.runner.run(&suite, &mut session).await;

        assert_eq!(
            result,
            SuiteResult {
                passed: 2,
                failed: 1,
                failed_tests: vec!["second".into()],
            }
        );
        // Only the third case's click ran; the second case stopped at its failing step.
        assert_eq!(h.surface.interactions(), vec![Interaction::Tap(2)]);

        let events = h.sink.events();
        assert!(events.contains(&ProtocolEvent::TestCaseResult {
            description: "second".into(),
            status: CaseStatus::Failed,
            reason: Some(
                "step 2 (assert_text key:home) failed: assertion failed: expected text of \
                 'key:home' to contain 'Away', found 'Home'"
                    .into()
            ),
            source_file: None,
        }));
        assert_eq!(
            events.last(),
            Some(&ProtocolEvent::Summary {
                passed: 2,
                failed: 1,
                failed_tests: vec!["second".into()],
            })
        );
    }

    #[tokio::test]
    async fn source_file_emitted_only_on_change() {
        let mut h = harness(vec![]);
        let mut a1 = case("a1", vec![]);
        a1.source_file = Some("a.yaml".into());
        let mut a2 = case("a2", vec![]);
        a2.source_file = Some("a.yaml".into());
        let mut b1 = case("b1", vec![]);
        b1.source_file = Some("b.yaml".into());
        let suite = TestSuite {
            name: "files".into(),
            source: None,
            test_cases: vec![a1, a2, b1],
        };
        let mut session = TestSession::new();
        h.runner.run(&suite, &mut session).await;

        let sources: Vec<_> = h
            .sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProtocolEvent::SourceFile { path } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(sources, ["a.yaml", "b.yaml"]);
        assert!(h.sink.lines().iter().any(|l| l == "=== Source: b.yaml ==="));
    }

    #[tokio::test]
    async fn aliases_persist_across_cases() {
        let mut h = harness(vec![ElementNode::new(ElementKind::TextInput).with_label("Account")]);
        let suite = TestSuite {
            name: "alias".into(),
            source: None,
            test_cases: vec![
                case(
                    "register",
                    vec![Step::new("assert_visible").selector("label:Account").alias("acct")],
                ),
                case("reuse", vec![Step::new("type").selector("alias:acct").value("me")]),
            ],
        };
        let mut session = TestSession::new();
        let result = h.runner.run(&suite, &mut session).await;
        assert!(result.is_success());
        assert_eq!(session.aliases.len(), 1);
    }

    #[tokio::test]
    async fn unknown_action_does_not_fail_case() {
        let mut h = harness(vec![]);
        let suite = TestSuite {
            name: "skip".into(),
            source: None,
            test_cases: vec![case("skips", vec![Step::new("swipe_left")])],
        };
        let result = h.runner.run(&suite, &mut TestSession::new()).await;
        assert_eq!(result.passed, 1);
        assert!(h.sink.lines().iter().any(|l| l.contains("unknown action 'swipe_left'")));
    }

    #[test]
    fn merge_deduplicates_failed_descriptions() {
        let mut total = SuiteResult::default();
        let mut run = SuiteResult::default();
        run.record_failure("flaky");
        run.record_failure("flaky");
        run.record_pass();
        total.merge(run.clone());
        total.merge(run);
        assert_eq!(total.failed, 4);
        assert_eq!(total.passed, 2);
        assert_eq!(total.failed_tests, ["flaky"]);
        assert_eq!(total.total(), 6);
    }
}
