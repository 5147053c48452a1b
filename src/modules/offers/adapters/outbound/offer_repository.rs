// Offer repository over the document store.
//
// Purpose
// - Persist offers and the outbox entry of each mutation in one atomic batch.
//
// Responsibilities
// - Assign the outbox sequence inside the same batch, through a version-checked counter document.
// - Retry a bounded number of times when a concurrent writer wins the counter or the offer.
//
// Boundaries
// - No authorization. Callers go through the authorization guard first.
// - Never publishes. The relay drains the outbox.
//
// Invariants
// - A committed mutation has exactly one outbox entry; a failed commit leaves neither.
// - Sequences are strictly increasing in commit order.

use crate::modules::offers::core::errors::{OfferError, OfferResult};
use crate::modules::offers::core::offer::{Offer, OfferDraft};
use crate::modules::offers::core::outbox_entry::{OfferEventType, OutboxEntry};
use crate::modules::offers::core::patch::OfferPatch;
use crate::shared::core::primitives::Clock;
use crate::shared::infrastructure::document_store::{
    Document, DocumentStore, DocumentStoreError, WriteBatch,
};
use async_trait::async_trait;
use serde_json::{Value as Json, json};
use std::future::Future;
use std::sync::Arc;

pub const OFFERS: &str = "offers";
pub const OUTBOX: &str = "outbox";
pub const COUNTERS: &str = "counters";
pub const OUTBOX_SEQUENCE: &str = "outbox_sequence";

const MAX_COMMIT_ATTEMPTS: u32 = 5;

#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn create(&self, draft: OfferDraft) -> OfferResult<(Offer, OutboxEntry)>;

    async fn update(&self, id: &str, patch: &OfferPatch) -> OfferResult<(Offer, OutboxEntry)>;

    async fn delete(&self, id: &str) -> OfferResult<OutboxEntry>;

    async fn get(&self, id: &str) -> OfferResult<Offer>;
}

pub struct DocumentOfferRepository<TStore>
where
    TStore: DocumentStore + 'static,
{
    store: Arc<TStore>,
    clock: Arc<dyn Clock>,
}

impl<TStore> DocumentOfferRepository<TStore>
where
    TStore: DocumentStore + 'static,
{
    pub fn new(store: Arc<TStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn load(&self, id: &str) -> OfferResult<(Document, Offer)> {
        let document = self
            .store
            .get(OFFERS, id)
            .await?
            .ok_or_else(|| OfferError::NotFound("Offer not found".into()))?;
        let offer: Offer =
            serde_json::from_value(document.body.clone()).map_err(DocumentStoreError::from)?;
        Ok((document, offer))
    }

    /// Reserves the next sequence by adding the counter write to `batch`.
    async fn next_sequence(&self, batch: WriteBatch) -> OfferResult<(u64, WriteBatch)> {
        match self.store.get(COUNTERS, OUTBOX_SEQUENCE).await? {
            None => Ok((1, batch.create(COUNTERS, OUTBOX_SEQUENCE, json!({"value": 1})))),
            Some(counter) => {
                let current = counter
                    .body
                    .get("value")
                    .and_then(Json::as_u64)
                    .ok_or_else(|| OfferError::Internal("corrupt outbox sequence counter".into()))?;
                let next = current + 1;
                Ok((
                    next,
                    batch.replace(COUNTERS, OUTBOX_SEQUENCE, counter.version, json!({"value": next})),
                ))
            }
        }
    }

    async fn commit_with_entry(
        &self,
        batch: WriteBatch,
        event_type: OfferEventType,
        offer_id: &str,
        payload: Json,
        changes: Option<Json>,
    ) -> OfferResult<OutboxEntry> {
        let (sequence, batch) = self.next_sequence(batch).await?;
        let entry = OutboxEntry::new(
            sequence,
            event_type,
            offer_id,
            payload,
            changes,
            self.clock.now(),
        );
        let body = serde_json::to_value(&entry).map_err(DocumentStoreError::from)?;
        self.store.commit(batch.create(OUTBOX, &entry.key(), body)).await?;
        Ok(entry)
    }

    async fn try_create(&self, id: &str, draft: &OfferDraft) -> OfferResult<(Offer, OutboxEntry)> {
        let offer = Offer::from_draft(id.to_string(), draft.clone(), self.clock.now());
        let snapshot = serde_json::to_value(&offer).map_err(DocumentStoreError::from)?;
        let batch = WriteBatch::new().create(OFFERS, id, snapshot.clone());
        let entry = self
            .commit_with_entry(batch, OfferEventType::OfferCreated, id, snapshot, None)
            .await?;
        Ok((offer, entry))
    }

    async fn try_update(&self, id: &str, patch: &OfferPatch) -> OfferResult<(Offer, OutboxEntry)> {
        let (document, current) = self.load(id).await?;
        let outcome = patch.apply_to(&current, self.clock.now())?;
        let snapshot = serde_json::to_value(&outcome.offer).map_err(DocumentStoreError::from)?;
        let batch = WriteBatch::new().replace(OFFERS, id, document.version, snapshot.clone());
        let entry = self
            .commit_with_entry(
                batch,
                OfferEventType::OfferUpdated,
                id,
                snapshot,
                Some(outcome.changes),
            )
            .await?;
        Ok((outcome.offer, entry))
    }

    async fn try_delete(&self, id: &str) -> OfferResult<OutboxEntry> {
        let (document, _) = self.load(id).await?;
        let batch = WriteBatch::new().delete(OFFERS, id, document.version);
        self.commit_with_entry(
            batch,
            OfferEventType::OfferDeleted,
            id,
            json!({"offer_id": id}),
            None,
        )
        .await
    }
}

async fn retry_on_conflict<T, F, Fut>(operation: &str, mut attempt: F) -> OfferResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = OfferResult<T>>,
{
    let mut attempts = 1;
    loop {
        match attempt().await {
            Err(OfferError::Conflict(reason)) if attempts < MAX_COMMIT_ATTEMPTS => {
                tracing::debug!(operation, attempts, %reason, "commit conflicted, retrying");
                attempts += 1;
            }
            Err(OfferError::Conflict(reason)) => {
                return Err(OfferError::Conflict(format!(
                    "{operation} gave up after {attempts} conflicting commits: {reason}"
                )));
            }
            result => return result,
        }
    }
}

#[async_trait]
impl<TStore> OfferRepository for DocumentOfferRepository<TStore>
where
    TStore: DocumentStore + 'static,
{
    async fn create(&self, draft: OfferDraft) -> OfferResult<(Offer, OutboxEntry)> {
        let id = self.store.next_id();
        retry_on_conflict("create", || self.try_create(&id, &draft)).await
    }

    async fn update(&self, id: &str, patch: &OfferPatch) -> OfferResult<(Offer, OutboxEntry)> {
        retry_on_conflict("update", || self.try_update(id, patch)).await
    }

    async fn delete(&self, id: &str) -> OfferResult<OutboxEntry> {
        retry_on_conflict("delete", || self.try_delete(id)).await
    }

    async fn get(&self, id: &str) -> OfferResult<Offer> {
        self.load(id).await.map(|(_, offer)| offer)
    }
}
