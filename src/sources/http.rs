//! HTTP suite source.
//!
//! Issues one GET per poll against the coordinator endpoint:
//! - 204 -> `Fetch::Empty`
//! - 200 -> `Fetch::Body` (a blank body counts as empty)
//! - anything else -> `Fetch::Status`
//!
//! Transport errors (connection refused, timeouts) are returned as errors.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::trace;

use super::{Fetch, SuiteSource};

/// Polls a single URL with a reusable `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SuiteSource for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&mut self) -> Result<Fetch> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", self.url))?;
        let status = response.status();
        trace!(target: "uidsl::interactive", url = %self.url, %status, "Polled");
        match status {
            StatusCode::NO_CONTENT => Ok(Fetch::Empty),
            StatusCode::OK => {
                let body = response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read body from {}", self.url))?;
                if body.trim().is_empty() {
                    Ok(Fetch::Empty)
                } else {
                    Ok(Fetch::Body(body))
                }
            }
            other => Ok(Fetch::Status(other.as_u16())),
        }
    }
}
