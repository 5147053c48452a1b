use crate::modules::offers::core::errors::OfferResult;
use crate::modules::offers::core::offer::Product;
use crate::shared::infrastructure::document_store::{DocumentStore, DocumentStoreError};
use async_trait::async_trait;
use std::sync::Arc;

pub const PRODUCTS: &str = "products";

/// Read-only access to products. Products are owned by another service.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn find(&self, product_id: &str) -> OfferResult<Option<Product>>;
}

pub struct DocumentProductLookup<TStore>
where
    TStore: DocumentStore + 'static,
{
    store: Arc<TStore>,
}

impl<TStore> DocumentProductLookup<TStore>
where
    TStore: DocumentStore + 'static,
{
    pub fn new(store: Arc<TStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<TStore> ProductLookup for DocumentProductLookup<TStore>
where
    TStore: DocumentStore + 'static,
{
    async fn find(&self, product_id: &str) -> OfferResult<Option<Product>> {
        let Some(document) = self.store.get(PRODUCTS, product_id).await? else {
            return Ok(None);
        };
        let mut product: Product =
            serde_json::from_value(document.body).map_err(DocumentStoreError::from)?;
        product.id = document.id;
        Ok(Some(product))
    }
}

#[cfg(test)]
mod document_product_lookup_tests {
    use super::*;
    use crate::shared::core::primitives::UserId;
    use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[tokio::test]
    async fn it_should_find_a_seeded_product() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .seed(
                PRODUCTS,
                "P1",
                json!({"owner_uid": "U1", "store_id": "S1", "name": "Cafe"}),
            )
            .await;
        let lookup = DocumentProductLookup::new(store);

        let product = lookup.find("P1").await.unwrap().unwrap();
        assert_eq!(product.id, "P1");
        assert_eq!(product.owner_uid, UserId::new("U1"));
        assert_eq!(product.store_id, "S1");
        assert_eq!(lookup.find("P-missing").await.unwrap(), None);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_on_a_product_without_an_owner() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.seed(PRODUCTS, "P2", json!({"store_id": "S1"})).await;
        let lookup = DocumentProductLookup::new(store);
        assert!(lookup.find("P2").await.is_err());
    }
}
