// Relay's view of the outbox.
//
// Responsibilities
// - Page through unfinished entries in sequence order.
// - Move an entry to its next delivery state with a compare-and-swap on the stored version.
//
// Boundaries
// - Never touches offers. Entries are never deleted here.

use crate::modules::offers::adapters::outbound::offer_repository::OUTBOX;
use crate::modules::offers::core::outbox_entry::{DeliveryState, OutboxEntry};
use crate::shared::infrastructure::document_store::{DocumentStore, DocumentStoreError};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboxStoreError {
    #[error("outbox unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt outbox entry {key}: {details}")]
    Corrupt { key: String, details: String },

    #[error("outbox backend error: {0}")]
    Backend(String),
}

impl From<DocumentStoreError> for OutboxStoreError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::Unavailable(msg) => OutboxStoreError::Unavailable(msg),
            other => OutboxStoreError::Backend(other.to_string()),
        }
    }
}

/// An entry together with the store version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub entry: OutboxEntry,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutboxCounts {
    /// Pending, failed or in flight.
    pub pending: usize,
    pub dead_lettered: usize,
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Up to `limit` non-terminal entries with a sequence above `after`, lowest sequence first.
    async fn fetch_unfinished(
        &self,
        after: u64,
        limit: usize,
    ) -> Result<Vec<StoredEntry>, OutboxStoreError>;

    /// Returns `None` when another writer changed the entry since it was read.
    async fn transition(
        &self,
        current: &StoredEntry,
        next: DeliveryState,
    ) -> Result<Option<StoredEntry>, OutboxStoreError>;

    async fn counts(&self) -> Result<OutboxCounts, OutboxStoreError>;

    async fn dead_letters(&self) -> Result<Vec<OutboxEntry>, OutboxStoreError>;
}

pub struct DocumentOutboxStore<TStore>
where
    TStore: DocumentStore + 'static,
{
    store: Arc<TStore>,
}

impl<TStore> DocumentOutboxStore<TStore>
where
    TStore: DocumentStore + 'static,
{
    pub fn new(store: Arc<TStore>) -> Self {
        Self { store }
    }

    async fn all(&self) -> Result<Vec<StoredEntry>, OutboxStoreError> {
        let mut entries = Vec::new();
        for document in self.store.scan(OUTBOX).await? {
            let entry: OutboxEntry =
                serde_json::from_value(document.body).map_err(|err| OutboxStoreError::Corrupt {
                    key: document.id.clone(),
                    details: err.to_string(),
                })?;
            entries.push(StoredEntry {
                entry,
                version: document.version,
            });
        }
        entries.sort_by_key(|stored| stored.entry.sequence);
        Ok(entries)
    }
}

#[async_trait]
impl<TStore> OutboxStore for DocumentOutboxStore<TStore>
where
    TStore: DocumentStore + 'static,
{
    async fn fetch_unfinished(
        &self,
        after: u64,
        limit: usize,
    ) -> Result<Vec<StoredEntry>, OutboxStoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|stored| stored.entry.sequence > after)
            .filter(|stored| !stored.entry.delivery_state.is_terminal())
            .take(limit)
            .collect())
    }

    async fn transition(
        &self,
        current: &StoredEntry,
        next: DeliveryState,
    ) -> Result<Option<StoredEntry>, OutboxStoreError> {
        let mut entry = current.entry.clone();
        entry.delivery_state = next;
        let body = serde_json::to_value(&entry).map_err(|err| OutboxStoreError::Corrupt {
            key: entry.key(),
            details: err.to_string(),
        })?;
        match self
            .store
            .update(OUTBOX, &entry.key(), current.version, body)
            .await
        {
            Ok(()) => Ok(Some(StoredEntry {
                entry,
                version: current.version + 1,
            })),
            Err(DocumentStoreError::Conflict { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn counts(&self) -> Result<OutboxCounts, OutboxStoreError> {
        let mut counts = OutboxCounts::default();
        for stored in self.all().await? {
            match stored.entry.delivery_state {
                DeliveryState::Delivered { .. } => {}
                DeliveryState::DeadLettered { .. } => counts.dead_lettered += 1,
                _ => counts.pending += 1,
            }
        }
        Ok(counts)
    }

    async fn dead_letters(&self) -> Result<Vec<OutboxEntry>, OutboxStoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .map(|stored| stored.entry)
            .filter(|entry| matches!(entry.delivery_state, DeliveryState::DeadLettered { .. }))
            .collect())
    }
}

#[cfg(test)]
mod document_outbox_store_tests {
    use super::*;
    use crate::modules::offers::core::outbox_entry::OfferEventType;
    use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
    use crate::tests::fixtures::offers::start_of_fixtures;
    use chrono::Duration;
    use rstest::{fixture, rstest};
    use serde_json::json;

    async fn seed_entry(store: &InMemoryDocumentStore, sequence: u64, state: DeliveryState) {
        let mut entry = OutboxEntry::new(
            sequence,
            OfferEventType::OfferCreated,
            format!("O{sequence}"),
            json!({}),
            None,
            start_of_fixtures(),
        );
        entry.delivery_state = state;
        store
            .seed(OUTBOX, &entry.key(), serde_json::to_value(&entry).unwrap())
            .await;
    }

    #[fixture]
    fn store() -> Arc<InMemoryDocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_list_unfinished_entries_by_sequence(store: Arc<InMemoryDocumentStore>) {
        let now = start_of_fixtures();
        seed_entry(&store, 11, DeliveryState::Pending).await;
        seed_entry(&store, 2, DeliveryState::Pending).await;
        seed_entry(
            &store,
            5,
            DeliveryState::Delivered {
                attempt_count: 0,
                delivered_at: now,
            },
        )
        .await;
        seed_entry(
            &store,
            7,
            DeliveryState::Failed {
                attempt_count: 1,
                last_error: "down".into(),
                retry_at: now + Duration::seconds(1),
            },
        )
        .await;
        let outbox = DocumentOutboxStore::new(store);

        let sequences: Vec<u64> = outbox
            .fetch_unfinished(0, 10)
            .await
            .unwrap()
            .iter()
            .map(|stored| stored.entry.sequence)
            .collect();
        assert_eq!(sequences, vec![2, 7, 11]);
        assert_eq!(outbox.fetch_unfinished(0, 1).await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_resume_a_page_after_the_given_sequence(store: Arc<InMemoryDocumentStore>) {
        for sequence in 1..=5 {
            seed_entry(&store, sequence, DeliveryState::Pending).await;
        }
        let outbox = DocumentOutboxStore::new(store);

        async fn page(outbox: &DocumentOutboxStore<InMemoryDocumentStore>, after: u64) -> Vec<u64> {
            outbox
                .fetch_unfinished(after, 2)
                .await
                .unwrap()
                .iter()
                .map(|stored| stored.entry.sequence)
                .collect()
        }
        assert_eq!(page(&outbox, 0).await, vec![1, 2]);
        assert_eq!(page(&outbox, 2).await, vec![3, 4]);
        assert_eq!(page(&outbox, 4).await, vec![5]);
        assert!(page(&outbox, 5).await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_let_only_one_writer_win_a_transition(store: Arc<InMemoryDocumentStore>) {
        seed_entry(&store, 1, DeliveryState::Pending).await;
        let outbox = DocumentOutboxStore::new(store);
        let read = outbox.fetch_unfinished(0, 1).await.unwrap().remove(0);
        let now = start_of_fixtures();

        let first = outbox
            .transition(&read, read.entry.claimed(now, Duration::seconds(30)))
            .await
            .unwrap();
        let second = outbox
            .transition(&read, read.entry.claimed(now, Duration::seconds(30)))
            .await
            .unwrap();

        assert_eq!(first.map(|stored| stored.version), Some(2));
        assert_eq!(second, None);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_count_pending_and_dead_lettered_entries(store: Arc<InMemoryDocumentStore>) {
        let now = start_of_fixtures();
        seed_entry(&store, 1, DeliveryState::Pending).await;
        seed_entry(
            &store,
            2,
            DeliveryState::DeadLettered {
                attempt_count: 10,
                last_error: "rejected".into(),
                dead_lettered_at: now,
            },
        )
        .await;
        seed_entry(
            &store,
            3,
            DeliveryState::Delivered {
                attempt_count: 0,
                delivered_at: now,
            },
        )
        .await;
        let outbox = DocumentOutboxStore::new(store);

        assert_eq!(
            outbox.counts().await.unwrap(),
            OutboxCounts {
                pending: 1,
                dead_lettered: 1
            }
        );
        let dead: Vec<u64> = outbox
            .dead_letters()
            .await
            .unwrap()
            .iter()
            .map(|entry| entry.sequence)
            .collect();
        assert_eq!(dead, vec![2]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_corrupt_entry(store: Arc<InMemoryDocumentStore>) {
        store.seed(OUTBOX, "00000000000000000001", json!({"x": 1})).await;
        let outbox = DocumentOutboxStore::new(store);
        assert!(matches!(
            outbox.fetch_unfinished(0, 10).await,
            Err(OutboxStoreError::Corrupt { .. })
        ));
    }
}
