// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// ============================================================================
// Broker messages
// ============================================================================

/// A single poll result from the broker: either a payload or an error the
/// client reported in place of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedMessage {
    Payload(Vec<u8>),
    Error(String),
}

impl ReceivedMessage {
    pub fn payload(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Payload(bytes.into())
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::Error(description.into())
    }
}

/// A message accepted into the drain accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedMessage {
    pub payload: Vec<u8>,
    /// Present when the payload decoded as a package record.
    pub package: Option<PackageRecord>,
}

impl ConsumedMessage {
    pub fn new(payload: Vec<u8>) -> Self {
        let package = PackageRecord::from_payload(&payload);
        Self { payload, package }
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

// ============================================================================
// Package records
// ============================================================================

/// Package announcement as published by the feed poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub created_date: DateTime<Utc>,
    /// Feed the package was seen on (npm, pypi, crates, ...).
    #[serde(rename = "type")]
    pub feed: String,
    #[serde(default)]
    pub artifact_id: String,
    #[serde(default)]
    pub schema_ver: Option<String>,
}

impl PackageRecord {
    /// Best-effort decode; anything that is not a package record yields `None`.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        serde_json::from_slice(payload).ok()
    }
}
