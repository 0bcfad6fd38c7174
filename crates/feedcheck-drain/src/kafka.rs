// SPDX-License-Identifier: GPL-3.0-or-later
use crate::error::Result;
use crate::source::MessageSource;
use feedcheck_config::BrokerConfig;
use feedcheck_domain::ReceivedMessage;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::time::Duration;
use tracing::{info, trace};

/// Consumer-group subscription to a single topic.
pub struct KafkaSource {
    consumer: StreamConsumer,
    topic: String,
    closed: bool,
}

impl KafkaSource {
    /// Create the consumer and subscribe. The broker itself is contacted lazily.
    pub fn connect(config: &BrokerConfig) -> Result<Self> {
        info!(
            target: "kafka",
            bootstrap_servers = %config.bootstrap_servers,
            group_id = %config.group_id,
            topic = %config.topic,
            auto_offset_reset = %config.auto_offset_reset,
            "creating consumer"
        );

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .create()?;

        consumer.subscribe(&[config.topic.as_str()])?;

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            closed: false,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait::async_trait]
impl MessageSource for KafkaSource {
    async fn poll(&mut self, timeout: Duration) -> Option<ReceivedMessage> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => None,
            Ok(Ok(message)) => {
                trace!(
                    target: "kafka",
                    partition = message.partition(),
                    offset = message.offset(),
                    "message received"
                );
                let payload = message.payload().map(<[u8]>::to_vec).unwrap_or_default();
                Some(ReceivedMessage::Payload(payload))
            }
            Ok(Err(err)) => Some(ReceivedMessage::Error(err.to_string())),
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        // Leaving the group here; the native handle is closed on drop.
        self.consumer.unsubscribe();
        self.closed = true;
        info!(target: "kafka", topic = %self.topic, "consumer unsubscribed");
    }
}
