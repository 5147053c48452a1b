// Document store port: typed access to a collection-keyed document store.
//
// Responsibilities
// - Point reads, collection scans and an atomic multi-document commit.
// - Every document carries a version; replace and delete are compare-and-update on it.
//
// Boundaries
// - No business logic. Repositories build batches, the store applies them all or none.

use async_trait::async_trait;
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: String,
    pub id: String,
    pub version: u64,
    pub body: Json,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Fails with `Conflict` when the document already exists.
    Create {
        collection: String,
        id: String,
        body: Json,
    },
    /// Fails with `Conflict` unless the stored version equals `expected_version`.
    Replace {
        collection: String,
        id: String,
        expected_version: u64,
        body: Json,
    },
    Delete {
        collection: String,
        id: String,
        expected_version: u64,
    },
}

impl WriteOp {
    pub fn key(&self) -> (&str, &str) {
        match self {
            WriteOp::Create { collection, id, .. }
            | WriteOp::Replace { collection, id, .. }
            | WriteOp::Delete { collection, id, .. } => (collection.as_str(), id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, collection: &str, id: &str, body: Json) -> Self {
        self.ops.push(WriteOp::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            body,
        });
        self
    }

    pub fn replace(mut self, collection: &str, id: &str, expected_version: u64, body: Json) -> Self {
        self.ops.push(WriteOp::Replace {
            collection: collection.to_string(),
            id: id.to_string(),
            expected_version,
            body,
        });
        self
    }

    pub fn delete(mut self, collection: &str, id: &str, expected_version: u64) -> Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
            expected_version,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("write conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for DocumentStoreError {
    fn from(err: serde_json::Error) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store-assigned opaque identifier for a new document.
    fn next_id(&self) -> String;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentStoreError>;

    async fn scan(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError>;

    /// Applies every operation of the batch, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), DocumentStoreError>;

    async fn ping(&self) -> Result<(), DocumentStoreError>;

    async fn put(&self, collection: &str, id: &str, body: Json) -> Result<(), DocumentStoreError> {
        self.commit(WriteBatch::new().create(collection, id, body)).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
        body: Json,
    ) -> Result<(), DocumentStoreError> {
        self.commit(WriteBatch::new().replace(collection, id, expected_version, body))
            .await
    }

    async fn delete(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
    ) -> Result<(), DocumentStoreError> {
        self.commit(WriteBatch::new().delete(collection, id, expected_version))
            .await
    }
}

pub mod in_memory;
