use async_trait::async_trait;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use thiserror::Error;

/// One message for the downstream event log. `key` drives partitioning and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub key: String,
    pub payload: Json,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum EventSinkError {
    #[error("event sink unavailable: {0}")]
    Unavailable(String),

    #[error("event sink rejected the message: {0}")]
    Rejected(String),

    #[error("event sink timed out after {0} ms")]
    Timeout(u64),
}

/// Append-only publish sink. At-least-once from the broker's side.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, topic: &str, message: &OutgoingMessage) -> Result<(), EventSinkError>;

    async fn ping(&self) -> Result<(), EventSinkError>;
}

pub mod in_memory;
pub mod pulsar;
