// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TriggerError>;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Invalid trigger URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Trigger endpoint unreachable after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

impl TriggerError {
    /// Whether the error came from failing to reach the endpoint at all.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            TriggerError::Unreachable { .. } => true,
            TriggerError::RequestFailed(err) => err.is_connect(),
            _ => false,
        }
    }
}
