#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module.

This module wires together:
- `wait`: the cooperative wait-until-true primitive with timeout
- `actions`: the closed action set and the `StepExecutor` that runs one step
- `session`: per-run mutable state (alias table)
- `runner`: the `SuiteRunner` that iterates cases, aggregates results, and reports progress

Typical usage:
- Launch the app through an `AppBootstrap` to get a `UiSurface`.
- Build a `StepExecutor` over the surface and a `SuiteRunner` over a `Reporter`.
- Call `SuiteRunner::run` with a `TestSuite` and a `TestSession`.

Example:
```no_run
use std::sync::Arc;
use uidsl::config::RunnerConfig;
use uidsl::executor::{StepExecutor, SuiteRunner, TestSession};
use uidsl::report::{Reporter, StdoutSink};
use uidsl::surface::SnapshotSurface;

# async fn demo(suite: uidsl::dsl::TestSuite) {
let cfg = RunnerConfig::default();
let surface = Arc::new(SnapshotSurface::new(vec![]));
let mut runner = SuiteRunner::new(
    StepExecutor::new(surface, &cfg),
    Reporter::new(Arc::new(StdoutSink)),
);
let result = runner.run(&suite, &mut TestSession::new()).await;
# let _ = result;
# }
```
*/

pub mod actions;
pub mod runner;
pub mod session;
pub mod wait;

// Re-exports for convenient access from `uidsl::executor::*`
pub use actions::{Action, StepExecutor, StepOutcome, Target};
pub use runner::{SuiteResult, SuiteRunner};
pub use session::TestSession;
pub use wait::wait_for;
