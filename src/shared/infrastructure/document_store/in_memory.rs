// In memory implementation of the DocumentStore port.
//
// Purpose
// - Support repository and relay tests and local development without a database.
//
// Responsibilities
// - Keep documents per (collection, id) with a version counter.
// - Validate every operation of a batch before applying any of them.
// - Offer hooks to simulate an unreachable store, a crash during commit, and slow writes.

use crate::shared::infrastructure::document_store::{
    Document, DocumentStore, DocumentStoreError, WriteBatch, WriteOp,
};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Document>>,
    is_offline: AtomicBool,
    crash_next_commits: AtomicUsize,
    commit_delay_ms: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    /// The next `count` commits fail as if the process died mid-write.
    pub fn crash_next_commits(&self, count: usize) {
        self.crash_next_commits.store(count, Ordering::SeqCst);
    }

    pub fn set_commit_delay_ms(&self, ms: u64) {
        self.commit_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    fn ensure_online(&self) -> Result<(), DocumentStoreError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Unavailable(
                "Document store offline".into(),
            ));
        }
        Ok(())
    }

    fn take_crash(&self) -> bool {
        self.crash_next_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn conflict(collection: &str, id: &str) -> DocumentStoreError {
    DocumentStoreError::Conflict {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn check(
    documents: &HashMap<(String, String), Document>,
    op: &WriteOp,
) -> Result<(), DocumentStoreError> {
    let (collection, id) = op.key();
    let current = documents.get(&(collection.to_string(), id.to_string()));
    match (op, current) {
        (WriteOp::Create { .. }, None) => Ok(()),
        (WriteOp::Create { .. }, Some(_)) => Err(conflict(collection, id)),
        (WriteOp::Replace { expected_version, .. }, Some(doc))
        | (WriteOp::Delete { expected_version, .. }, Some(doc))
            if doc.version == *expected_version =>
        {
            Ok(())
        }
        _ => Err(conflict(collection, id)),
    }
}

fn apply(documents: &mut HashMap<(String, String), Document>, op: WriteOp) {
    match op {
        WriteOp::Create {
            collection,
            id,
            body,
        } => {
            documents.insert(
                (collection.clone(), id.clone()),
                Document {
                    collection,
                    id,
                    version: 1,
                    body,
                },
            );
        }
        WriteOp::Replace {
            collection,
            id,
            expected_version,
            body,
        } => {
            documents.insert(
                (collection.clone(), id.clone()),
                Document {
                    collection,
                    id,
                    version: expected_version + 1,
                    body,
                },
            );
        }
        WriteOp::Delete { collection, id, .. } => {
            documents.remove(&(collection, id));
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn next_id(&self) -> String {
        Uuid::now_v7().simple().to_string()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentStoreError> {
        self.ensure_online()?;
        Ok(self
            .documents
            .read()
            .await
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError> {
        self.ensure_online()?;
        let guard = self.documents.read().await;
        let mut documents: Vec<Document> = guard
            .values()
            .filter(|doc| doc.collection == collection)
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DocumentStoreError> {
        self.ensure_online()?;
        let delay = self.commit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut guard = self.documents.write().await;
        for op in batch.ops() {
            check(&guard, op)?;
        }
        if self.take_crash() {
            return Err(DocumentStoreError::Backend(
                "simulated crash during commit".into(),
            ));
        }
        for op in batch.into_ops() {
            apply(&mut guard, op);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), DocumentStoreError> {
        self.ensure_online()
    }
}

impl InMemoryDocumentStore {
    /// Seed a document outside of any batch, e.g. a product owned by another service.
    pub async fn seed(&self, collection: &str, id: &str, body: Json) {
        let mut guard = self.documents.write().await;
        apply(
            &mut guard,
            WriteOp::Create {
                collection: collection.to_string(),
                id: id.to_string(),
                body,
            },
        );
    }
}
