// SPDX-License-Identifier: GPL-3.0-or-later
use feedcheck_domain::ReceivedMessage;
use std::time::Duration;

/// A subscription that can be polled for messages.
#[async_trait::async_trait]
pub trait MessageSource: Send {
    /// Wait up to `timeout` for the next message. `None` means nothing arrived.
    async fn poll(&mut self, timeout: Duration) -> Option<ReceivedMessage>;

    /// Release the subscription. Must be safe to call more than once.
    async fn close(&mut self);
}
