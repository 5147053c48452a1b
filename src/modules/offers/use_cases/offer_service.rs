// Offer service: the single entry point for offer reads and mutations.
//
// Flow per mutation: authenticate -> validate -> authorize -> repository (offer + outbox entry).
// Authentication is a separate call so transports can run it before decoding the body.
//
// Boundaries
// - Stateless. Never publishes; the relay owns delivery and its failures.
// - Every suspending step runs under the request deadline. A write that committed before the
//   deadline fired stands.

use crate::modules::offers::adapters::outbound::offer_repository::OfferRepository;
use crate::modules::offers::adapters::outbound::product_lookup::ProductLookup;
use crate::modules::offers::core::errors::{OfferError, OfferResult};
use crate::modules::offers::core::offer::{CreateOfferRequest, Offer};
use crate::modules::offers::core::patch::OfferPatch;
use crate::modules::offers::use_cases::authorization_guard::{AuthorizationGuard, OfferAction};
use crate::shared::core::primitives::UserId;
use crate::shared::infrastructure::identity::IdentityVerifier;
use serde_json::Value as Json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct OfferService<TIdentity, TProducts, TOffers>
where
    TIdentity: IdentityVerifier + ?Sized,
    TProducts: ProductLookup + ?Sized,
    TOffers: OfferRepository + ?Sized,
{
    guard: AuthorizationGuard<TIdentity, TProducts, TOffers>,
    offers: Arc<TOffers>,
    timeout: Duration,
}

impl<TIdentity, TProducts, TOffers> OfferService<TIdentity, TProducts, TOffers>
where
    TIdentity: IdentityVerifier + ?Sized,
    TProducts: ProductLookup + ?Sized,
    TOffers: OfferRepository + ?Sized,
{
    pub fn new(
        identity: Arc<TIdentity>,
        products: Arc<TProducts>,
        offers: Arc<TOffers>,
        timeout: Duration,
    ) -> Self {
        Self {
            guard: AuthorizationGuard::new(identity, products, offers.clone()),
            offers,
            timeout,
        }
    }

    async fn within<T>(
        &self,
        step: &'static str,
        future: impl Future<Output = OfferResult<T>>,
    ) -> OfferResult<T> {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(step, timeout_ms, "request step timed out");
                OfferError::Timeout(format!("{step} exceeded {timeout_ms} ms"))
            })?
    }

    /// Resolves the caller. Runs before the body is looked at.
    pub async fn authenticate(&self, authorization: Option<&str>) -> OfferResult<UserId> {
        self.within("authenticate", self.guard.authenticate(authorization))
            .await
    }

    pub async fn create(&self, uid: UserId, body: Json) -> OfferResult<Offer> {
        let validated = CreateOfferRequest::from_json(body)?.validate()?;
        let product = self
            .within(
                "authorize",
                self.guard.authorize_product(&uid, validated.product_id()),
            )
            .await?;
        let draft = validated.into_draft(uid, &product);
        let (offer, entry) = self.within("create", self.offers.create(draft)).await?;
        tracing::info!(
            offer_id = %offer.id,
            sequence = entry.sequence,
            uid = %offer.owner_uid,
            "offer created"
        );
        Ok(offer)
    }

    pub async fn get(&self, id: &str) -> OfferResult<Offer> {
        self.within("get", self.offers.get(id)).await
    }

    pub async fn update(&self, uid: &UserId, id: &str, body: Json) -> OfferResult<Offer> {
        let patch = OfferPatch::from_json(body)?;
        self.within(
            "authorize",
            self.guard.authorize_offer(uid, id, OfferAction::Update),
        )
        .await?;
        let (offer, entry) = self.within("update", self.offers.update(id, &patch)).await?;
        tracing::info!(offer_id = %offer.id, sequence = entry.sequence, %uid, "offer updated");
        Ok(offer)
    }

    pub async fn delete(&self, uid: &UserId, id: &str) -> OfferResult<()> {
        self.within(
            "authorize",
            self.guard.authorize_offer(uid, id, OfferAction::Delete),
        )
        .await?;
        let entry = self.within("delete", self.offers.delete(id)).await?;
        tracing::info!(offer_id = id, sequence = entry.sequence, %uid, "offer deleted");
        Ok(())
    }
}
