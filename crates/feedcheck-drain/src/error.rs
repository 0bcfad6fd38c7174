// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrainError>;

#[derive(Debug, Error)]
pub enum DrainError {
    #[error("Kafka client error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Failed to assert that at least a single package was received")]
    NoMessages,

    #[error("Drain interrupted after receiving {received} messages")]
    Interrupted { received: usize },
}
