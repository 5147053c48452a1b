use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use offers::shared::core::primitives::{Clock, SystemClock};
use offers::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use offers::shared::infrastructure::identity::jwt::JwtIdentityVerifier;
use offers::shell::config::{AppConfig, FromEnv};
use offers::shell::state::AppState;
use offers::shell::{http, workers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    // In-memory document store for now
    let store = Arc::new(InMemoryDocumentStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let event_sink = workers::build_event_sink(
        config.pulsar.as_ref(),
        &config.relay.source_service,
        config.relay.publish_timeout,
    )?;
    let identity = Arc::new(JwtIdentityVerifier::new(&config.jwt_secret));

    let state = AppState::wire(
        store,
        identity,
        event_sink,
        clock.clone(),
        config.request_timeout,
    );

    let cancel = CancellationToken::new();
    let relay = workers::spawn_outbox_relay(&state, clock, config.relay.clone(), cancel.clone());

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!("Offers API: http://{}/offers", config.http_addr);
    axum::serve(listener, http::router(state))
        .with_graceful_shutdown({
            let cancel = cancel.clone();
            async move {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %err, "failed to listen for shutdown signal");
                }
                cancel.cancel();
            }
        })
        .await?;

    cancel.cancel();
    relay.await?;
    Ok(())
}
