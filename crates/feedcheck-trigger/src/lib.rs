// SPDX-License-Identifier: GPL-3.0-or-later

//! Client for the package-feeds poll trigger.
//!
//! A single GET against the poller starts ingestion from every configured
//! registry. Connection-level failures are retried on a fixed budget and
//! delay; everything else is reported to the caller immediately.

pub mod client;
#[cfg(test)]
mod client_tests;
pub mod error;

pub use client::{Trigger, TriggerClient, TriggerClientBuilder, TriggerResponse};
pub use error::{Result, TriggerError};
