//! Interactive session controller.
//!
//! Polls a `SuiteSource` for suite payloads while the application stays up, runs each one
//! through the `SuiteRunner`, and accumulates the results.
//!
//! Loop (sequential, never more than one request outstanding):
//! - `Empty` -> sleep for the poll interval, poll again.
//! - `Status(code)` -> log, sleep, poll again.
//! - `Body` equal to the exit command (trimmed, case-insensitive) -> stop.
//! - Any other body -> decode; a malformed payload is logged, then sleep and poll again.
//!   A decoded suite gets default name/source labels, runs with a fresh alias scope, and the
//!   UI settles before the next poll.
//! - Transport error -> log, sleep, poll again (or stop after `max_consecutive_errors`).
//!
//! On exit the source (and its HTTP client) is dropped and the alias table cleared.

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::http::HttpSource;
use super::{Fetch, SuiteSource};
use crate::config::InteractiveConfig;
use crate::dsl::{TestSuite, decode_suite};
use crate::error::DecodeError;
use crate::executor::{SuiteResult, SuiteRunner, TestSession};

/// Drives suites pulled from a remote source.
pub struct InteractiveSession<S: SuiteSource> {
    config: InteractiveConfig,
    source: S,
    received: usize,
}

impl<S: SuiteSource> InteractiveSession<S> {
    pub fn new(config: InteractiveConfig, source: S) -> Self {
        Self {
            config,
            source,
            received: 0,
        }
    }

    /// Decode a payload body into a suite, filling in default labels.
    fn decode(&mut self, body: &str) -> Result<TestSuite, DecodeError> {
        let ordinal = self.received + 1;
        let default_name = format!("Interactive Suite {ordinal}");
        let suite = decode_suite(body, &default_name)?;
        self.received = ordinal;
        let default_source = format!("{}#{ordinal}", self.source.name());
        Ok(suite.with_defaults(&default_name, &default_source))
    }

    /// Run until the exit command arrives or the source fails for good.
    pub async fn run(mut self, runner: &mut SuiteRunner, session: &mut TestSession) -> SuiteResult {
        let mut total = SuiteResult::default();
        let mut consecutive_errors = 0u32;
        let interval = self.config.poll_interval();
        info!(
            target: "uidsl::interactive",
            source = %self.source.name(),
            poll_ms = self.config.poll_interval_ms,
            "Interactive session started"
        );

        loop {
            let fetch = match self.source.fetch().await {
                Ok(fetch) => {
                    consecutive_errors = 0;
                    fetch
                }
                Err(err) => {
                    consecutive_errors += 1;
                    if self
                        .config
                        .max_consecutive_errors
                        .is_some_and(|max| consecutive_errors >= max)
                    {
                        error!(
                            target: "uidsl::interactive",
                            error = %format!("{err:#}"),
                            consecutive_errors,
                            "Giving up on interactive source"
                        );
                        break;
                    }
                    warn!(target: "uidsl::interactive", error = %format!("{err:#}"), "Poll failed; retrying");
                    sleep(interval).await;
                    continue;
                }
            };

            let body = match fetch {
                Fetch::Empty => {
                    debug!(target: "uidsl::interactive", "No suite ready");
                    sleep(interval).await;
                    continue;
                }
                Fetch::Status(code) => {
                    warn!(target: "uidsl::interactive", status = code, "Unexpected response status");
                    sleep(interval).await;
                    continue;
                }
                Fetch::Body(body) => body,
            };

            let trimmed = body.trim();
            if trimmed.eq_ignore_ascii_case(self.config.exit_command.trim()) {
                info!(target: "uidsl::interactive", "Exit command received");
                break;
            }

            let suite = match self.decode(trimmed) {
                Ok(suite) => suite,
                Err(err) => {
                    warn!(target: "uidsl::interactive", error = %err, "Ignoring malformed payload");
                    runner
                        .reporter()
                        .line(&format!("! Ignoring malformed interactive payload: {err}"));
                    sleep(interval).await;
                    continue;
                }
            };

            info!(
                target: "uidsl::interactive",
                suite = %suite.name,
                cases = suite.test_cases.len(),
                "Running interactive suite"
            );
            session.reset();
            total.merge(runner.run(&suite, session).await);
            runner.settle().await;
        }

        drop(self.source);
        session.reset();
        info!(
            target: "uidsl::interactive",
            passed = total.passed,
            failed = total.failed,
            "Interactive session ended"
        );
        total
    }
}

/// Run the interactive session over HTTP when enabled.
///
/// Returns an empty result immediately when the session is disabled or no server URL is
/// configured.
pub async fn run_interactive(
    config: &InteractiveConfig,
    runner: &mut SuiteRunner,
    session: &mut TestSession,
) -> SuiteResult {
    if !config.enabled {
        return SuiteResult::default();
    }
    let Some(url) = config.endpoint() else {
        warn!(target: "uidsl::interactive", "Interactive mode enabled without a server URL; skipping");
        return SuiteResult::default();
    };
    let source = match HttpSource::new(url, config.request_timeout()) {
        Ok(source) => source,
        Err(err) => {
            error!(target: "uidsl::interactive", error = %format!("{err:#}"), "Cannot start interactive session");
            session.reset();
            return SuiteResult::default();
        }
    };
    InteractiveSession::new(config.clone(), source)
        .run(runner, session)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::executor::StepExecutor;
    use crate::report::{MemorySink, ProtocolEvent, Reporter};
    use crate::selector::ElementQuery;
    use crate::sources::queue_server::{self, PayloadQueue, QueueMode, QueueServerConfig};
    use crate::surface::{ElementNode, SnapshotSurface};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    /// Replays a fixed script of fetches, then answers with the exit command.
    struct Scripted {
        script: VecDeque<anyhow::Result<Fetch>>,
        polls: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Scripted {
        fn new(script: Vec<anyhow::Result<Fetch>>) -> Self {
            Self {
                script: script.into(),
                polls: Arc::default(),
            }
        }
    }

    #[async_trait::async_trait]
    impl SuiteSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&mut self) -> anyhow::Result<Fetch> {
            self.polls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.script
                .pop_front()
                .unwrap_or_else(|| Ok(Fetch::Body("EXIT".into())))
        }
    }

    fn fast_config() -> InteractiveConfig {
        InteractiveConfig {
            enabled: true,
            poll_interval_ms: 1,
            ..InteractiveConfig::default()
        }
    }

    fn runner(roots: Vec<ElementNode>) -> (SuiteRunner, Arc<MemorySink>) {
        let mut cfg = RunnerConfig::default();
        cfg.waits.element_timeout_ms = 30;
        cfg.waits.wait_action_ms = 1;
        cfg.waits.poll_interval_ms = 2;
        let sink = Arc::new(MemorySink::new());
        let runner = SuiteRunner::new(
            StepExecutor::new(Arc::new(SnapshotSurface::new(roots)), &cfg),
            Reporter::new(sink.clone()),
        );
        (runner, sink)
    }

    #[tokio::test]
    async fn disabled_or_missing_url_returns_empty_result() {
        let (mut runner, sink) = runner(vec![]);
        let mut session = TestSession::new();
        let disabled = InteractiveConfig::default();
        assert_eq!(
            run_interactive(&disabled, &mut runner, &mut session).await,
            SuiteResult::default()
        );
        let no_url = InteractiveConfig {
            server_url: Some("   ".into()),
            ..fast_config()
        };
        assert_eq!(
            run_interactive(&no_url, &mut runner, &mut session).await,
            SuiteResult::default()
        );
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn skips_empty_status_and_malformed_payloads() {
        let (mut runner, sink) = runner(vec![ElementNode::text("Hello")]);
        let mut session = TestSession::new();
        let source = Scripted::new(vec![
            Ok(Fetch::Empty),
            Ok(Fetch::Status(500)),
            Err(anyhow::anyhow!("connection reset")),
            Ok(Fetch::Body(r#"{"name": "no cases here"}"#.into())),
            Ok(Fetch::Body(r#"[{"action":"wait","waitTime":"1"}]"#.into())),
            Ok(Fetch::Body(
                r#"{"name":"hello","steps":[{"action":"assert_visible","selector":"Hello"}]}"#
                    .into(),
            )),
        ]);
        let polls = source.polls.clone();

        let result = InteractiveSession::new(fast_config(), source)
            .run(&mut runner, &mut session)
            .await;

        assert_eq!(result.passed, 2);
        assert_eq!(result.failed, 0);
        assert_eq!(polls.load(std::sync::atomic::Ordering::SeqCst), 7);
        assert!(sink.lines().iter().any(|l| l.contains("malformed interactive payload")));

        let sources: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProtocolEvent::SourceFile { path } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(sources, ["scripted#1", "scripted#2"]);
    }

    #[tokio::test]
    async fn each_payload_gets_a_fresh_alias_scope() {
        let (mut runner, _sink) = runner(vec![ElementNode::text("Hello")]);
        let mut session = TestSession::new();
        session
            .aliases
            .register("stale", ElementQuery::exact_text("Hello"));
        let source = Scripted::new(vec![
            Ok(Fetch::Body(
                r#"[{"action":"assert_visible","selector":"Hello","alias":"greeting"}]"#.into(),
            )),
            Ok(Fetch::Body(
                r#"[{"action":"assert_visible","selector":"alias:greeting"}]"#.into(),
            )),
        ]);
        let result = InteractiveSession::new(fast_config(), source)
            .run(&mut runner, &mut session)
            .await;
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failed_tests, ["Interactive Suite 2"]);
        assert!(session.aliases.is_empty());
    }

    #[tokio::test]
    async fn malformed_payloads_wait_between_polls() {
        let (mut runner, _sink) = runner(vec![]);
        let config = InteractiveConfig {
            poll_interval_ms: 20,
            ..fast_config()
        };
        let page = "<!DOCTYPE html><html><body>not a suite</body></html>";
        let source = Scripted::new((0..3).map(|_| Ok(Fetch::Body(page.into()))).collect());
        let polls = source.polls.clone();

        let started = std::time::Instant::now();
        let result = InteractiveSession::new(config, source)
            .run(&mut runner, &mut TestSession::new())
            .await;

        assert!(started.elapsed() >= std::time::Duration::from_millis(60));
        assert_eq!(polls.load(std::sync::atomic::Ordering::SeqCst), 4);
        assert_eq!(result, SuiteResult::default());
    }

    #[tokio::test]
    async fn gives_up_after_consecutive_errors() {
        let (mut runner, _sink) = runner(vec![]);
        let config = InteractiveConfig {
            max_consecutive_errors: Some(2),
            ..fast_config()
        };
        let source = Scripted::new(vec![
            Err(anyhow::anyhow!("down")),
            Err(anyhow::anyhow!("still down")),
            Ok(Fetch::Body("[]".into())),
        ]);
        let polls = source.polls.clone();
        let result = InteractiveSession::new(config, source)
            .run(&mut runner, &mut TestSession::new())
            .await;
        assert_eq!(result, SuiteResult::default());
        assert_eq!(polls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn end_to_end_against_queue_server() {
        let queue = PayloadQueue::default();
        queue.push(r#"[{"action":"wait","waitTime":1}]"#);
        queue.push("not: [a, suite");
        queue.push(
            "name: yaml suite\ntestCases:\n  - description: sees hello\n    steps:\n      - action: assert_visible\n        selector: Hello\n  - description: sees goodbye\n    steps:\n      - action: assert_visible\n        selector: Goodbye\n",
        );
        let app = queue_server::router(
            queue.clone(),
            QueueServerConfig {
                mode: QueueMode::ExitWhenEmpty,
                ..QueueServerConfig::default()
            },
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(queue_server::serve(listener, app, shutdown.clone()));

        let (mut runner, sink) = runner(vec![ElementNode::text("Hello")]);
        let config = InteractiveConfig {
            server_url: Some(format!("http://{addr}/next")),
            ..fast_config()
        };
        let result = run_interactive(&config, &mut runner, &mut TestSession::new()).await;

        assert_eq!(result.passed, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failed_tests, ["sees goodbye"]);
        assert!(queue.is_empty());
        let summaries = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, ProtocolEvent::Summary { .. }))
            .count();
        assert_eq!(summaries, 2);

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }
}
