use crate::modules::offers::adapters::outbound::offer_repository::{
    DocumentOfferRepository, OfferRepository,
};
use crate::modules::offers::adapters::outbound::outbox_store::{DocumentOutboxStore, OutboxStore};
use crate::modules::offers::adapters::outbound::product_lookup::{
    DocumentProductLookup, ProductLookup,
};
use crate::modules::offers::use_cases::offer_service::OfferService;
use crate::shared::core::primitives::Clock;
use crate::shared::infrastructure::document_store::DocumentStore;
use crate::shared::infrastructure::event_sink::EventSink;
use crate::shared::infrastructure::identity::IdentityVerifier;
use std::sync::Arc;
use std::time::Duration;

pub type AppOfferService =
    OfferService<dyn IdentityVerifier, dyn ProductLookup, dyn OfferRepository>;

#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<AppOfferService>,
    pub document_store: Arc<dyn DocumentStore>,
    pub event_sink: Arc<dyn EventSink>,
    pub outbox: Arc<dyn OutboxStore>,
}

impl AppState {
    /// Builds every adapter on top of one document store. Constructed once at startup.
    pub fn wire<TStore>(
        store: Arc<TStore>,
        identity: Arc<dyn IdentityVerifier>,
        event_sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
    ) -> Self
    where
        TStore: DocumentStore + 'static,
    {
        let products: Arc<dyn ProductLookup> = Arc::new(DocumentProductLookup::new(store.clone()));
        let repository: Arc<dyn OfferRepository> =
            Arc::new(DocumentOfferRepository::new(store.clone(), clock));
        let outbox: Arc<dyn OutboxStore> = Arc::new(DocumentOutboxStore::new(store.clone()));
        Self {
            offers: Arc::new(OfferService::new(
                identity,
                products,
                repository,
                request_timeout,
            )),
            document_store: store,
            event_sink,
            outbox,
        }
    }
}
