//! Queue server handing out DSL payloads to an interactive session.
//!
//! Routes:
//! - `GET|POST <endpoint>` (default `/next`): pop the next payload as `text/plain`.
//!   An empty queue answers 204, or the exit command in `ExitWhenEmpty` mode.
//!   In `Cycle` mode a served payload goes back to the end of the queue.
//!   Requests from a `HeadlessChrome` user agent always get 204.
//!   A POST whose body is the exit command gets the exit command back without touching the
//!   queue, which stops a session even while cycling.
//! - `POST /enqueue`: raw text body, or the `payload` field of a urlencoded form.
//! - `GET /status`: `{"size": n}`.
//! - `GET /`: a small page for pasting payloads by hand.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// FIFO of raw payload texts, shared between handlers.
#[derive(Debug, Clone, Default)]
pub struct PayloadQueue {
    items: Arc<Mutex<VecDeque<String>>>,
}

impl PayloadQueue {
    pub fn push(&self, payload: impl Into<String>) {
        self.lock().push_back(payload.into());
    }

    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Queue the contents of each file, in order.
    pub async fn from_files(paths: &[PathBuf]) -> Result<Self> {
        let queue = Self::default();
        for path in paths {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read DSL file {}", path.display()))?;
            queue.push(content);
        }
        Ok(queue)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// What the poll endpoint does with the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueMode {
    /// Serve each payload once; 204 when empty.
    #[default]
    Drain,
    /// Re-queue served payloads so they repeat forever.
    Cycle,
    /// Serve each payload once, then the exit command.
    ExitWhenEmpty,
}

#[derive(Debug, Clone)]
pub struct QueueServerConfig {
    pub endpoint: String,
    pub mode: QueueMode,
    pub exit_command: String,
}

impl Default for QueueServerConfig {
    fn default() -> Self {
        Self {
            endpoint: "/next".to_string(),
            mode: QueueMode::Drain,
            exit_command: "exit".to_string(),
        }
    }
}

impl QueueServerConfig {
    /// Endpoint with a leading slash and no trailing slash.
    pub fn normalized_endpoint(&self) -> String {
        let trimmed = self.endpoint.trim().trim_matches('/');
        format!("/{trimmed}")
    }
}

#[derive(Clone)]
struct AppState {
    queue: PayloadQueue,
    config: Arc<QueueServerConfig>,
}

/// Build the router. Fixed routes that collide with the poll endpoint are left out.
pub fn router(queue: PayloadQueue, config: QueueServerConfig) -> Router {
    let endpoint = config.normalized_endpoint();
    let state = AppState {
        queue,
        config: Arc::new(config),
    };

    let mut app = Router::new().route(&endpoint, get(next_payload).post(post_next_payload));
    if endpoint != "/enqueue" {
        app = app.route("/enqueue", post(enqueue));
    }
    if endpoint != "/status" {
        app = app.route("/status", get(status));
    }
    if endpoint != "/" {
        app = app.route("/", get(index));
    }
    app.layer(CorsLayer::permissive()).with_state(state)
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(target: "uidsl::queue", %addr, "Queue server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Queue server failed")?;
    info!(target: "uidsl::queue", "Queue server stopped");
    Ok(())
}

async fn next_payload(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if user_agent.contains("HeadlessChrome") {
        debug!(target: "uidsl::queue", "Ignoring headless browser poll");
        return StatusCode::NO_CONTENT.into_response();
    }

    match state.queue.pop() {
        Some(payload) => {
            if state.config.mode == QueueMode::Cycle {
                state.queue.push(payload.clone());
            }
            info!(
                target: "uidsl::queue",
                bytes = payload.len(),
                remaining = state.queue.len(),
                "Served payload"
            );
            plain_text(payload)
        }
        None if state.config.mode == QueueMode::ExitWhenEmpty => {
            info!(target: "uidsl::queue", "Queue drained; sending exit command");
            plain_text(state.config.exit_command.clone())
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn post_next_payload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if body.trim().eq_ignore_ascii_case(state.config.exit_command.trim()) {
        info!(target: "uidsl::queue", "Exit requested; sending exit command");
        return plain_text(state.config.exit_command.clone());
    }
    next_payload(State(state), headers).await
}

async fn enqueue(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"));

    let payload = if is_form {
        url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    } else {
        body
    };

    let payload = payload.trim();
    if payload.is_empty() {
        warn!(target: "uidsl::queue", "Rejected empty payload");
        return (StatusCode::BAD_REQUEST, "Empty payload").into_response();
    }
    state.queue.push(payload);
    info!(target: "uidsl::queue", size = state.queue.len(), "Payload enqueued");
    StatusCode::CREATED.into_response()
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "size": state.queue.len() }))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

fn plain_text(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>uidsl queue</title>
  <style>
    body { font-family: sans-serif; margin: 2rem auto; max-width: 720px; }
    textarea { width: 100%; min-height: 320px; font-family: monospace; }
  </style>
</head>
<body>
  <h1>Interactive DSL queue</h1>
  <p>Paste a YAML or JSON payload and submit it to queue it for the running session.</p>
  <form id="enqueue" method="post" action="/enqueue">
    <textarea name="payload" placeholder="- action: click&#10;  selector: key:login"></textarea>
    <p><button type="submit">Submit</button> <span id="size"></span></p>
  </form>
  <script>
    const form = document.getElementById('enqueue');
    const size = document.getElementById('size');
    async function refresh() {
      try {
        const res = await fetch('/status');
        if (res.ok) size.textContent = `Queued: ${(await res.json()).size}`;
      } catch (err) { console.error(err); }
    }
    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      const payload = new FormData(form).get('payload');
      if (!payload || !payload.trim()) return;
      const res = await fetch('/enqueue', {
        method: 'POST',
        headers: { 'Content-Type': 'text/plain; charset=utf-8' },
        body: payload,
      });
      if (res.ok) { form.reset(); refresh(); } else { alert('Failed to enqueue payload.'); }
    });
    setInterval(refresh, 1500);
    refresh();
  </script>
</body>
</html>
"#;
