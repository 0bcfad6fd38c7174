// SPDX-License-Identifier: GPL-3.0-or-later
use crate::source::MessageSource;
use feedcheck_domain::ReceivedMessage;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// In-memory source that delivers messages at fixed offsets from its creation.
///
/// Meant for driving a drain under a paused tokio clock: `poll` sleeps until
/// either the next scripted message is due or the poll timeout elapses.
#[derive(Debug)]
pub struct ScriptedSource {
    origin: Instant,
    script: VecDeque<(Duration, ReceivedMessage)>,
    polls: usize,
    closed: bool,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            script: VecDeque::new(),
            polls: 0,
            closed: false,
        }
    }

    /// Deliver `message` once `offset` has passed since the source was created.
    pub fn at(mut self, offset: Duration, message: ReceivedMessage) -> Self {
        let index = self.script.partition_point(|(at, _)| *at <= offset);
        self.script.insert(index, (offset, message));
        self
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn pending(&self) -> usize {
        self.script.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait::async_trait]
impl MessageSource for ScriptedSource {
    async fn poll(&mut self, timeout: Duration) -> Option<ReceivedMessage> {
        self.polls += 1;
        let deadline = Instant::now() + timeout;

        let due = match self.script.front() {
            Some((offset, _)) if self.origin + *offset <= deadline => self.origin + *offset,
            _ => {
                sleep_until(deadline).await;
                return None;
            }
        };

        sleep_until(due).await;
        self.script.pop_front().map(|(_, message)| message)
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
