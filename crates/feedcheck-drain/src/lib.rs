// SPDX-License-Identifier: GPL-3.0-or-later

//! Bounded-wait drain of a message topic.
//!
//! A [`DrainSession`] polls a [`MessageSource`] and accumulates every payload
//! until nothing has arrived for longer than the idle timeout. There is no
//! end-of-stream signal; quiescence is the only stop condition.

pub mod error;
pub mod kafka;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod session;
pub mod source;

pub use error::{DrainError, Result};
pub use kafka::KafkaSource;
pub use session::{drain_until_idle, DrainReport, DrainSession, DrainSettings, DrainState};
pub use source::MessageSource;
