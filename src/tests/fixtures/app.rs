use crate::shared::core::primitives::SystemClock;
use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use crate::shared::infrastructure::event_sink::in_memory::InMemoryEventSink;
use crate::shared::infrastructure::identity::in_memory::StaticIdentityVerifier;
use crate::shell::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// In-memory application. `token-u1` authenticates as U1, `token-u2` as U2.
pub struct TestApp {
    pub store: Arc<InMemoryDocumentStore>,
    pub sink: Arc<InMemoryEventSink>,
    pub state: AppState,
}

pub fn make_test_app() -> TestApp {
    let store = Arc::new(InMemoryDocumentStore::new());
    let sink = Arc::new(InMemoryEventSink::new());
    let identity = Arc::new(
        StaticIdentityVerifier::new()
            .with_token("token-u1", "U1")
            .with_token("token-u2", "U2"),
    );
    let state = AppState::wire(
        store.clone(),
        identity,
        sink.clone(),
        Arc::new(SystemClock),
        Duration::from_secs(5),
    );
    TestApp { store, sink, state }
}
