// Outbox entry and its delivery state machine.
//
// Pending -> InFlight -> Delivered                       (success, terminal)
// Pending -> InFlight -> Failed -> InFlight -> ...       (retry loop)
//                               -> DeadLettered          (terminal, after the ceiling)
// InFlight whose lease expired is claimable again (crashed relay).
//
// Boundaries
// - Pure transitions. Persisting them is the outbox store's job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferEventType {
    OfferCreated,
    OfferUpdated,
    OfferDeleted,
}

impl OfferEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferEventType::OfferCreated => "OfferCreated",
            OfferEventType::OfferUpdated => "OfferUpdated",
            OfferEventType::OfferDeleted => "OfferDeleted",
        }
    }
}

impl fmt::Display for OfferEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `attempt_count` is the number of failed publish attempts so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeliveryState {
    Pending,
    InFlight {
        attempt_count: u32,
        lease_expires_at: DateTime<Utc>,
    },
    Failed {
        attempt_count: u32,
        last_error: String,
        retry_at: DateTime<Utc>,
    },
    Delivered {
        attempt_count: u32,
        delivered_at: DateTime<Utc>,
    },
    DeadLettered {
        attempt_count: u32,
        last_error: String,
        dead_lettered_at: DateTime<Utc>,
    },
}

impl DeliveryState {
    pub fn attempt_count(&self) -> u32 {
        match self {
            DeliveryState::Pending => 0,
            DeliveryState::InFlight { attempt_count, .. }
            | DeliveryState::Failed { attempt_count, .. }
            | DeliveryState::Delivered { attempt_count, .. }
            | DeliveryState::DeadLettered { attempt_count, .. } => *attempt_count,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryState::Delivered { .. } | DeliveryState::DeadLettered { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// May be claimed now.
    Ready,
    /// Backoff or another relay's lease still running.
    Waiting,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub sequence: u64,
    pub event_type: OfferEventType,
    pub offer_id: String,
    pub payload: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub delivery_state: DeliveryState,
}

impl OutboxEntry {
    pub fn new(
        sequence: u64,
        event_type: OfferEventType,
        offer_id: impl Into<String>,
        payload: Json,
        changes: Option<Json>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sequence,
            event_type,
            offer_id: offer_id.into(),
            payload,
            changes,
            created_at,
            delivery_state: DeliveryState::Pending,
        }
    }

    /// Document key. Zero padded so that key order equals sequence order.
    pub fn key_for(sequence: u64) -> String {
        format!("{sequence:020}")
    }

    pub fn key(&self) -> String {
        Self::key_for(self.sequence)
    }

    pub fn eligibility(&self, now: DateTime<Utc>) -> Eligibility {
        match &self.delivery_state {
            DeliveryState::Pending => Eligibility::Ready,
            DeliveryState::Failed { retry_at, .. } if *retry_at <= now => Eligibility::Ready,
            DeliveryState::InFlight {
                lease_expires_at, ..
            } if *lease_expires_at <= now => Eligibility::Ready,
            DeliveryState::Failed { .. } | DeliveryState::InFlight { .. } => Eligibility::Waiting,
            DeliveryState::Delivered { .. } | DeliveryState::DeadLettered { .. } => {
                Eligibility::Terminal
            }
        }
    }

    pub fn claimed(&self, now: DateTime<Utc>, lease: Duration) -> DeliveryState {
        DeliveryState::InFlight {
            attempt_count: self.delivery_state.attempt_count(),
            lease_expires_at: now + lease,
        }
    }

    pub fn delivered(&self, now: DateTime<Utc>) -> DeliveryState {
        DeliveryState::Delivered {
            attempt_count: self.delivery_state.attempt_count(),
            delivered_at: now,
        }
    }

    /// Failure transition. Dead-letters once the failed attempts exceed `max_attempts`.
    pub fn failed(
        &self,
        error: impl Into<String>,
        now: DateTime<Utc>,
        retry_in: Duration,
        max_attempts: u32,
    ) -> DeliveryState {
        let attempt_count = self.delivery_state.attempt_count() + 1;
        let last_error = error.into();
        if attempt_count > max_attempts {
            DeliveryState::DeadLettered {
                attempt_count,
                last_error,
                dead_lettered_at: now,
            }
        } else {
            DeliveryState::Failed {
                attempt_count,
                last_error,
                retry_at: now + retry_in,
            }
        }
    }
}
