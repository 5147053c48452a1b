// End to end in memory test for the offer lifecycle.
//
// - Drive create, update and delete through the HTTP router.
// - Relay the outbox into an in memory sink.
// - Assert that the sink received one event per mutation, in order, keyed by offer.
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use offers::modules::offers::adapters::outbound::outbox_store::{DocumentOutboxStore, OutboxStore};
use offers::modules::offers::use_cases::relay_outbox::relay::{OutboxRelay, RelayConfig};
use offers::shared::core::primitives::SystemClock;
use offers::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use offers::shared::infrastructure::event_sink::in_memory::InMemoryEventSink;
use offers::shared::infrastructure::identity::in_memory::StaticIdentityVerifier;
use offers::shell::http::router;
use offers::shell::state::AppState;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct World {
    store: Arc<InMemoryDocumentStore>,
    sink: Arc<InMemoryEventSink>,
    app: Router,
}

async fn world() -> World {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .seed(
            "products",
            "P1",
            json!({"owner_uid": "U1", "store_id": "S1", "name": "Cafe especial"}),
        )
        .await;
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
    World {
        store,
        sink,
        app: router(state),
    }
}

async fn send(app: &Router, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json");
    let body = body.map_or_else(Body::empty, |body| Body::from(body.to_string()));
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn publishes_one_event_per_mutation_in_order() {
    let world = world().await;

    let (status, created) = send(
        &world.app,
        "POST",
        "/offers",
        "token-u1",
        Some(json!({
            "product_id": "P1",
            "offer_price": 79.99,
            "offer_type": "promocao",
            "start_date": "2025-10-01T00:00:00Z",
            "end_date": "2025-10-10T23:59:59Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let offer_id = created["offerId"].as_str().unwrap().to_string();
    let uri = format!("/offers/{offer_id}");

    let (status, _) = send(&world.app, "PUT", &uri, "token-u2", Some(json!({"offer_price": 1}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&world.app, "PUT", &uri, "token-u1", Some(json!({"offer_price": 69.9}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, offer) = send(&world.app, "GET", &uri, "token-u2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(offer["offer_price"], json!(69.9));
    assert_eq!(offer["store_id"], json!("S1"));

    let (status, _) = send(&world.app, "DELETE", &uri, "token-u1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&world.app, "GET", &uri, "token-u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let outbox = Arc::new(DocumentOutboxStore::new(world.store.clone()));
    let relay = OutboxRelay::new(
        outbox.clone(),
        world.sink.clone(),
        Arc::new(SystemClock),
        RelayConfig::default(),
    );
    let report = relay.relay_once().await.unwrap();
    assert_eq!(report.delivered, 3);

    let published = world.sink.published.lock().await;
    let events: Vec<(&str, &str, u64)> = published
        .iter()
        .map(|(_, message)| {
            (
                message.key.as_str(),
                message.payload["event_type"].as_str().unwrap(),
                message.payload["sequence"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        events,
        vec![
            (offer_id.as_str(), "OfferCreated", 1),
            (offer_id.as_str(), "OfferUpdated", 2),
            (offer_id.as_str(), "OfferDeleted", 3),
        ]
    );
    assert_eq!(
        published[1].1.payload["changes"]["offer_price"],
        json!({"from": 79.99, "to": 69.9})
    );
    assert_eq!(outbox.counts().await.unwrap().pending, 0);
}

#[tokio::test]
async fn leaves_no_trace_when_the_owner_check_fails() {
    let world = world().await;

    let (status, body) = send(
        &world.app,
        "POST",
        "/offers",
        "token-u2",
        Some(json!({
            "product_id": "P1",
            "offer_price": 10,
            "start_date": "2025-10-01T00:00:00Z",
            "end_date": "2025-10-10T23:59:59Z"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().is_some());
    assert_eq!(world.store.len("offers").await, 0);
    assert_eq!(world.store.len("outbox").await, 0);
}
