use crate::modules::offers::use_cases::relay_outbox::relay::{OutboxRelay, RelayConfig};
use crate::shared::core::primitives::Clock;
use crate::shared::infrastructure::event_sink::in_memory::InMemoryEventSink;
use crate::shared::infrastructure::event_sink::pulsar::PulsarEventSink;
use crate::shared::infrastructure::event_sink::{EventSink, EventSinkError};
use crate::shell::config::PulsarConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::shell::state::AppState;

/// Pulsar when a broker is configured, otherwise an in-process sink that nobody consumes.
pub fn build_event_sink(
    pulsar: Option<&PulsarConfig>,
    source_service: &str,
    publish_timeout: Duration,
) -> Result<Arc<dyn EventSink>, EventSinkError> {
    match pulsar {
        Some(pulsar) => {
            tracing::info!(
                broker_url = %pulsar.broker_url,
                tenant = %pulsar.tenant,
                namespace = %pulsar.namespace,
                "publishing offer events to pulsar"
            );
            Ok(Arc::new(PulsarEventSink::new(
                source_service,
                pulsar.broker_url.as_str(),
                pulsar.tenant.as_str(),
                pulsar.namespace.as_str(),
                publish_timeout,
            )?))
        }
        None => {
            tracing::warn!("PULSAR_BROKER_URL is not set, offer events stay in memory");
            Ok(Arc::new(InMemoryEventSink::new()))
        }
    }
}

/// Spawns the outbox relay on the runtime. It stops when `cancel` fires.
pub fn spawn_outbox_relay(
    state: &AppState,
    clock: Arc<dyn Clock>,
    config: RelayConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let relay = OutboxRelay::new(
        state.outbox.clone(),
        state.event_sink.clone(),
        clock,
        config,
    );
    tokio::spawn(async move { relay.run(cancel).await })
}
