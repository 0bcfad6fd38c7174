// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{Result, TriggerError};
use feedcheck_config::TriggerConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};
use url::Url;

const DEFAULT_TRIGGER_URL: &str = "http://127.0.0.1:8080/";
const USER_AGENT: &str = concat!("feedcheck/", env!("CARGO_PKG_VERSION"));

/// Something that can kick off a feed poll.
#[async_trait::async_trait]
pub trait Trigger: Send + Sync {
    /// Fire the trigger, retrying connection failures according to the implementation's budget.
    async fn fire(&self) -> Result<TriggerResponse>;
}

/// What the poller answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: String,
    /// Number of requests sent, including the one that got through.
    pub attempts: u32,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Package count from a `"<n> packages processed"` body.
    pub fn processed_count(&self) -> Option<u64> {
        self.body
            .trim()
            .strip_suffix("packages processed")?
            .trim()
            .parse()
            .ok()
    }
}

/// HTTP client for the poll trigger endpoint with fixed-budget connection retries.
#[derive(Debug, Clone)]
pub struct TriggerClient {
    client: Client,
    url: Url,
    retry_budget: u32,
    retry_delay: Duration,
}

impl TriggerClient {
    /// Create a client for the default local endpoint.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> TriggerClientBuilder {
        TriggerClientBuilder::default()
    }

    pub fn from_config(config: &TriggerConfig) -> Result<Self> {
        Self::builder()
            .url(config.url.clone())
            .retry_budget(config.retry_budget)
            .retry_delay(config.retry_delay())
            .timeout(config.request_timeout())
            .build()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    async fn send(&self) -> std::result::Result<(StatusCode, String), reqwest::Error> {
        trace!(target: "trigger", "GET {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        debug!(target: "trigger", "response status: {}", status);

        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl Trigger for TriggerClient {
    async fn fire(&self) -> Result<TriggerResponse> {
        let mut remaining = self.retry_budget;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.send().await {
                Ok((status, body)) => {
                    info!(
                        target: "trigger",
                        url = %self.url,
                        status = status.as_u16(),
                        attempts,
                        "trigger endpoint responded"
                    );
                    return Ok(TriggerResponse {
                        status: status.as_u16(),
                        body,
                        attempts,
                    });
                }
                Err(err) if err.is_connect() => {
                    if remaining == 0 {
                        error!(
                            target: "trigger",
                            url = %self.url,
                            attempts,
                            error = %err,
                            "trigger endpoint unreachable, giving up"
                        );
                        return Err(TriggerError::Unreachable {
                            attempts,
                            source: err,
                        });
                    }
                    warn!(
                        target: "trigger",
                        url = %self.url,
                        attempt = attempts,
                        remaining,
                        delay = ?self.retry_delay,
                        error = %err,
                        "failed to reach trigger endpoint, retrying after delay"
                    );
                    sleep(self.retry_delay).await;
                    remaining -= 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Builder for configuring a trigger client.
#[derive(Debug)]
pub struct TriggerClientBuilder {
    url: String,
    timeout: Duration,
    retry_budget: u32,
    retry_delay: Duration,
}

impl Default for TriggerClientBuilder {
    fn default() -> Self {
        Self {
            url: DEFAULT_TRIGGER_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry_budget: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl TriggerClientBuilder {
    /// Set the trigger endpoint (useful for testing with mock servers).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many times a refused connection is retried.
    pub fn retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Set the pause between connection attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Build the trigger client.
    pub fn build(self) -> Result<TriggerClient> {
        let url = Url::parse(&self.url)?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(TriggerError::ClientBuild)?;

        Ok(TriggerClient {
            client,
            url,
            retry_budget: self.retry_budget,
            retry_delay: self.retry_delay,
        })
    }
}
