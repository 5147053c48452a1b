// In memory implementation of the EventSink port.
//
// Purpose
// - Let relay tests observe exactly what was published, in which order.
//
// Responsibilities
// - Record published messages per topic.
// - Fail a scripted number of publishes, or all of them while offline.

use crate::shared::infrastructure::event_sink::{EventSink, EventSinkError, OutgoingMessage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct InMemoryEventSink {
    pub published: Mutex<Vec<(String, OutgoingMessage)>>,
    fail_next: AtomicUsize,
    is_offline: AtomicBool,
    attempts: AtomicUsize,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_publishes(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    /// Every publish call, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn published_keys(&self) -> Vec<String> {
        self.published
            .lock()
            .await
            .iter()
            .map(|(_, message)| message.key.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl EventSink for InMemoryEventSink {
    async fn publish(&self, topic: &str, message: &OutgoingMessage) -> Result<(), EventSinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(EventSinkError::Unavailable("Event sink offline".into()));
        }
        if self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(EventSinkError::Unavailable("scripted publish failure".into()));
        }
        self.published
            .lock()
            .await
            .push((topic.to_string(), message.clone()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), EventSinkError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(EventSinkError::Unavailable("Event sink offline".into()));
        }
        Ok(())
    }
}
