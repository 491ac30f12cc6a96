/*!
Suite sources (orchestration layer).

This module defines the `SuiteSource` trait polled by the interactive session, plus the
pieces built on it:

- `http.rs`         -> `HttpSource`        (GET a coordinator endpoint with `reqwest`)
- `interactive.rs`  -> `InteractiveSession` (poll, decode, run, repeat until the exit command)
- `queue_server.rs` -> an `axum` server that hands out queued DSL payloads one per request

Each source implementation is responsible for:
- Turning one poll into a `Fetch` (nothing ready, unexpected status, or a body)
- Reporting transport failures as errors; the session decides whether to retry
- Never panicking; the session loop treats every fetch as fallible

Adding a new source:
1. Create `src/sources/your_source.rs`
2. Implement `SuiteSource` for `YourSource`
3. Expose with `pub use self::your_source::YourSource;`
4. Drive it with `InteractiveSession::new(config, source)`
*/

use async_trait::async_trait;

pub mod http;
pub mod interactive;
pub mod queue_server;

pub use http::HttpSource;
pub use interactive::{InteractiveSession, run_interactive};
pub use queue_server::{PayloadQueue, QueueMode, QueueServerConfig};

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    /// No suite is ready yet (HTTP 204).
    Empty,
    /// An unexpected status code.
    Status(u16),
    /// A payload body (HTTP 200).
    Body(String),
}

/// A remote producer of suite payloads, polled sequentially.
#[async_trait]
pub trait SuiteSource: Send {
    /// Human-readable identifier (used in logs).
    fn name(&self) -> &str;

    /// Perform one poll. At most one call is outstanding at a time.
    async fn fetch(&mut self) -> anyhow::Result<Fetch>;
}
