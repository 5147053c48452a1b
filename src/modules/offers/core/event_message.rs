use crate::modules::offers::core::outbox_entry::{OfferEventType, OutboxEntry};
use crate::shared::infrastructure::event_sink::OutgoingMessage;
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Wire format of an offer event on the sink.
///
/// `(offer_id, sequence)` is stable across redeliveries and is the consumer's dedup key.
/// `timestamp` is the time of the mutation, not of the publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferEventMessage {
    pub event_type: OfferEventType,
    pub timestamp: String,
    pub offer_id: String,
    pub sequence: u64,
    pub data: Json,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Json>,
    pub source_service: String,
}

impl OfferEventMessage {
    pub fn from_entry(entry: &OutboxEntry, source_service: &str) -> Self {
        Self {
            event_type: entry.event_type,
            timestamp: entry.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            offer_id: entry.offer_id.clone(),
            sequence: entry.sequence,
            data: entry.payload.clone(),
            changes: entry.changes.clone(),
            source_service: source_service.to_string(),
        }
    }

    pub fn into_outgoing(self) -> Result<OutgoingMessage, serde_json::Error> {
        let mut properties = BTreeMap::new();
        properties.insert("event_type".to_string(), self.event_type.to_string());
        properties.insert("sequence".to_string(), self.sequence.to_string());
        properties.insert("offer_id".to_string(), self.offer_id.clone());
        Ok(OutgoingMessage {
            key: self.offer_id.clone(),
            payload: serde_json::to_value(&self)?,
            properties,
        })
    }
}
