// Outbox relay.
//
// Purpose
// - Drain the outbox into the event sink, at least once per entry.
//
// Responsibilities
// - Claim an entry (CAS into InFlight) before publishing, so concurrent relays never both publish it
//   while the claim is live.
// - Record delivery, or schedule a retry with backoff, or dead-letter after the ceiling.
// - Walk entries by sequence and stop at the first undelivered entry of each offer.
//
// Boundaries
// - Reads and transitions outbox entries only. Never reads or writes offers.
// - Errors never reach the request path. A failed cycle is logged and retried on the next poll.

use crate::modules::offers::adapters::outbound::outbox_store::{
    OutboxStore, OutboxStoreError, StoredEntry,
};
use crate::modules::offers::core::event_message::OfferEventMessage;
use crate::modules::offers::core::outbox_entry::{DeliveryState, Eligibility, OutboxEntry};
use crate::modules::offers::use_cases::relay_outbox::backoff::ExponentialBackoff;
use crate::shared::core::primitives::Clock;
use crate::shared::infrastructure::event_sink::{EventSink, EventSinkError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Subset of offers a relay instance is responsible for. One offer always maps to one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub index: u64,
    pub count: u64,
}

impl Shard {
    pub fn owns(&self, offer_id: &str) -> bool {
        self.count <= 1 || fnv1a(offer_id) % self.count == self.index
    }
}

fn fnv1a(value: &str) -> u64 {
    value.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub topic: String,
    pub source_service: String,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub lease: Duration,
    pub publish_timeout: Duration,
    pub poll_interval: Duration,
    pub backoff: ExponentialBackoff,
    pub shard: Option<Shard>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            topic: "eventos_ofertas".into(),
            source_service: "servico-ofertas".into(),
            batch_size: 100,
            max_attempts: 10,
            lease: Duration::from_secs(30),
            publish_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
            backoff: ExponentialBackoff::default(),
            shard: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub examined: usize,
    pub delivered: usize,
    pub failed: usize,
    pub dead_lettered: usize,
    /// Not ready, claimed elsewhere, or behind an undelivered entry of the same offer.
    pub skipped: usize,
}

impl RelayReport {
    pub fn is_idle(&self) -> bool {
        self.delivered == 0 && self.failed == 0 && self.dead_lettered == 0
    }
}

fn millis(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}

pub struct OutboxRelay<TOutbox, TSink>
where
    TOutbox: OutboxStore + ?Sized,
    TSink: EventSink + ?Sized,
{
    outbox: Arc<TOutbox>,
    sink: Arc<TSink>,
    clock: Arc<dyn Clock>,
    config: RelayConfig,
}

impl<TOutbox, TSink> OutboxRelay<TOutbox, TSink>
where
    TOutbox: OutboxStore + ?Sized,
    TSink: EventSink + ?Sized,
{
    pub fn new(
        outbox: Arc<TOutbox>,
        sink: Arc<TSink>,
        clock: Arc<dyn Clock>,
        config: RelayConfig,
    ) -> Self {
        Self {
            outbox,
            sink,
            clock,
            config,
        }
    }

    async fn publish(&self, entry: &OutboxEntry) -> Result<(), EventSinkError> {
        let message = OfferEventMessage::from_entry(entry, &self.config.source_service)
            .into_outgoing()
            .map_err(|err| EventSinkError::Rejected(err.to_string()))?;
        let timeout_ms = u64::try_from(self.config.publish_timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(
            self.config.publish_timeout,
            self.sink.publish(&self.config.topic, &message),
        )
        .await
        .map_err(|_| EventSinkError::Timeout(timeout_ms))?
    }

    /// One pass over the unfinished entries this relay owns, paged by sequence. At most
    /// `batch_size` entries are claimed; entries of other shards and entries still waiting
    /// do not count towards it.
    pub async fn relay_once(&self) -> Result<RelayReport, OutboxStoreError> {
        let mut report = RelayReport::default();
        let mut blocked: HashSet<String> = HashSet::new();
        let page_size = self.config.batch_size.max(1);
        let mut claims = 0;
        let mut after = 0;

        loop {
            let page = self.outbox.fetch_unfinished(after, page_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = last.entry.sequence;
            let exhausted = page.len() < page_size;

            for stored in page {
                let offer_id = stored.entry.offer_id.clone();
                if !self.config.shard.is_none_or(|shard| shard.owns(&offer_id)) {
                    continue;
                }
                report.examined += 1;
                if blocked.contains(&offer_id) {
                    report.skipped += 1;
                    continue;
                }
                match stored.entry.eligibility(self.clock.now()) {
                    Eligibility::Ready => {}
                    Eligibility::Terminal => continue,
                    Eligibility::Waiting => {
                        blocked.insert(offer_id);
                        report.skipped += 1;
                        continue;
                    }
                }

                let claim = stored.entry.claimed(self.clock.now(), millis(self.config.lease));
                let Some(claimed) = self.outbox.transition(&stored, claim).await? else {
                    tracing::debug!(
                        %offer_id,
                        sequence = stored.entry.sequence,
                        "entry claimed by another relay"
                    );
                    blocked.insert(offer_id);
                    report.skipped += 1;
                    continue;
                };

                claims += 1;
                if !self.deliver(claimed, &mut report).await? {
                    blocked.insert(offer_id);
                }
                if claims >= page_size {
                    return Ok(report);
                }
            }
            if exhausted {
                break;
            }
        }
        Ok(report)
    }

    /// Publishes a claimed entry and records the outcome. Returns whether later entries of the
    /// same offer may proceed in this cycle.
    async fn deliver(
        &self,
        claimed: StoredEntry,
        report: &mut RelayReport,
    ) -> Result<bool, OutboxStoreError> {
        let entry = &claimed.entry;
        match self.publish(entry).await {
            Ok(()) => {
                let delivered = entry.delivered(self.clock.now());
                if self.outbox.transition(&claimed, delivered).await?.is_none() {
                    tracing::warn!(
                        offer_id = %entry.offer_id,
                        sequence = entry.sequence,
                        "claim lost before delivery was recorded, entry may be published again"
                    );
                    return Ok(false);
                }
                tracing::debug!(
                    offer_id = %entry.offer_id,
                    sequence = entry.sequence,
                    attempt_count = entry.delivery_state.attempt_count(),
                    "outbox entry delivered"
                );
                report.delivered += 1;
                Ok(true)
            }
            Err(err) => {
                let attempt = entry.delivery_state.attempt_count() + 1;
                let retry_in = self.config.backoff.delay(attempt, &mut rand::thread_rng());
                let next = entry.failed(
                    err.to_string(),
                    self.clock.now(),
                    millis(retry_in),
                    self.config.max_attempts,
                );
                let dead_lettered = matches!(next, DeliveryState::DeadLettered { .. });
                if self.outbox.transition(&claimed, next).await?.is_none() {
                    return Ok(false);
                }
                if dead_lettered {
                    tracing::error!(
                        offer_id = %entry.offer_id,
                        sequence = entry.sequence,
                        attempt_count = attempt,
                        error = %err,
                        "outbox entry dead-lettered"
                    );
                    report.dead_lettered += 1;
                    Ok(true)
                } else {
                    tracing::warn!(
                        offer_id = %entry.offer_id,
                        sequence = entry.sequence,
                        attempt_count = attempt,
                        retry_in_ms = retry_in.as_millis() as u64,
                        error = %err,
                        "outbox publish failed"
                    );
                    report.failed += 1;
                    Ok(false)
                }
            }
        }
    }

    /// Polls until `cancel` fires. Sleeps `poll_interval` after a cycle that did no work.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            topic = %self.config.topic,
            shard = ?self.config.shard,
            "outbox relay started"
        );
        loop {
            let idle = match self.relay_once().await {
                Ok(report) => report.is_idle(),
                Err(err) => {
                    tracing::warn!(error = %err, "outbox relay cycle failed");
                    true
                }
            };
            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            } else if cancel.is_cancelled() {
                break;
            } else {
                tokio::task::yield_now().await;
            }
        }
        tracing::info!("outbox relay stopped");
    }
}
