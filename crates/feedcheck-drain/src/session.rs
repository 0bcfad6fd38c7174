// SPDX-License-Identifier: GPL-3.0-or-later
use crate::error::{DrainError, Result};
use crate::source::MessageSource;
use feedcheck_config::DrainConfig;
use feedcheck_domain::{ConsumedMessage, ReceivedMessage};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, trace, warn};

/// Poll granularity and quiescence threshold for a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSettings {
    pub poll_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&DrainConfig> for DrainSettings {
    fn from(config: &DrainConfig) -> Self {
        Self {
            poll_timeout: config.poll_timeout(),
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Where the drain stands after the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    /// Nothing arrived, still inside the idle window.
    Waiting,
    /// A message arrived on the last poll. The next poll starts from `Waiting`.
    Received,
    /// Idle window exceeded. Terminal.
    IdleTimeout,
}

/// Accumulator and idle timer for one drain.
#[derive(Debug)]
pub struct DrainSession {
    settings: DrainSettings,
    state: DrainState,
    messages: Vec<ConsumedMessage>,
    discarded: usize,
    polls: u64,
    started_at: Instant,
    last_activity: Instant,
}

impl DrainSession {
    pub fn new(settings: DrainSettings) -> Self {
        Self::starting_at(settings, Instant::now())
    }

    pub fn starting_at(settings: DrainSettings, now: Instant) -> Self {
        Self {
            settings,
            state: DrainState::Waiting,
            messages: Vec::new(),
            discarded: 0,
            polls: 0,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn state(&self) -> DrainState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == DrainState::IdleTimeout
    }

    pub fn messages(&self) -> &[ConsumedMessage] {
        &self.messages
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Apply one poll result observed at `now`.
    pub fn observe(&mut self, polled: Option<ReceivedMessage>, now: Instant) -> DrainState {
        if self.is_finished() {
            return self.state;
        }
        self.polls += 1;

        self.state = match polled {
            Some(ReceivedMessage::Payload(payload)) => {
                let message = ConsumedMessage::new(payload);
                match &message.package {
                    Some(package) => info!(
                        target: "drain",
                        feed = %package.feed,
                        name = %package.name,
                        version = %package.version,
                        "received message: {}",
                        message.text()
                    ),
                    None => info!(target: "drain", "received message: {}", message.text()),
                }
                self.messages.push(message);
                self.last_activity = now;
                DrainState::Received
            }
            Some(ReceivedMessage::Error(description)) => {
                // Not counted as activity: the idle timer keeps running.
                warn!(target: "drain", error = %description, "consumer error, discarding message");
                self.discarded += 1;
                DrainState::Received
            }
            None => {
                let idle = now.saturating_duration_since(self.last_activity);
                if idle > self.settings.idle_timeout {
                    info!(
                        target: "drain",
                        ?idle,
                        received = self.messages.len(),
                        "no message within idle timeout, stopping"
                    );
                    DrainState::IdleTimeout
                } else {
                    trace!(target: "drain", ?idle, "poll returned nothing");
                    DrainState::Waiting
                }
            }
        };

        self.state
    }

    /// Poll `source` until the idle timeout is exceeded.
    pub async fn run<S>(&mut self, source: &mut S)
    where
        S: MessageSource + ?Sized,
    {
        while !self.is_finished() {
            let polled = source.poll(self.settings.poll_timeout).await;
            self.observe(polled, Instant::now());
        }
    }

    pub fn into_report(self, interrupted: bool) -> DrainReport {
        DrainReport {
            elapsed: Instant::now().saturating_duration_since(self.started_at),
            messages: self.messages,
            discarded: self.discarded,
            polls: self.polls,
            interrupted,
        }
    }
}

/// Outcome of a finished drain.
#[derive(Debug)]
pub struct DrainReport {
    pub messages: Vec<ConsumedMessage>,
    pub discarded: usize,
    pub polls: u64,
    pub elapsed: Duration,
    pub interrupted: bool,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.messages.len()
    }

    /// Decoded packages per feed. Payloads that are not package records are not counted.
    pub fn per_feed(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for package in self.messages.iter().filter_map(|m| m.package.as_ref()) {
            *counts.entry(package.feed.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Pass only when the drain ran to quiescence and received something.
    pub fn verify(&self) -> Result<()> {
        if self.interrupted {
            return Err(DrainError::Interrupted {
                received: self.total(),
            });
        }
        if self.messages.is_empty() {
            return Err(DrainError::NoMessages);
        }
        Ok(())
    }
}

/// Drain `source` until it goes idle or `shutdown` resolves, then close it.
///
/// The source is closed on both paths before the report is returned, so a
/// failing verdict never leaves the subscription behind.
pub async fn drain_until_idle<S, F>(
    source: &mut S,
    settings: DrainSettings,
    shutdown: F,
) -> DrainReport
where
    S: MessageSource + ?Sized,
    F: Future<Output = ()>,
{
    info!(
        target: "drain",
        poll_timeout = ?settings.poll_timeout,
        idle_timeout = ?settings.idle_timeout,
        "draining until idle"
    );

    let mut session = DrainSession::new(settings);
    let interrupted = tokio::select! {
        _ = session.run(source) => false,
        _ = shutdown => {
            warn!(target: "drain", "shutdown requested, interrupting drain");
            true
        }
    };

    source.close().await;

    let report = session.into_report(interrupted);
    info!(
        target: "drain",
        received = report.total(),
        discarded = report.discarded,
        polls = report.polls,
        elapsed = ?report.elapsed,
        "drain finished"
    );
    report
}
