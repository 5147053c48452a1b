// Authorization guard.
//
// Responsibilities
// - Resolve the caller from the Authorization header.
// - Check ownership against live state: the product's owner for creation, the offer's owner otherwise.
//
// Invariants
// - Existence is checked before ownership. NotFound wins over Forbidden, so a caller can tell
//   "does not exist" from "not yours". This is accepted and not hardened.

use crate::modules::offers::adapters::outbound::offer_repository::OfferRepository;
use crate::modules::offers::adapters::outbound::product_lookup::ProductLookup;
use crate::modules::offers::core::errors::{OfferError, OfferResult};
use crate::modules::offers::core::offer::{Offer, Product};
use crate::shared::core::primitives::UserId;
use crate::shared::infrastructure::identity::{IdentityVerifier, bearer_token};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAction {
    Update,
    Delete,
}

impl fmt::Display for OfferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferAction::Update => f.write_str("update"),
            OfferAction::Delete => f.write_str("delete"),
        }
    }
}

pub struct AuthorizationGuard<TIdentity, TProducts, TOffers>
where
    TIdentity: IdentityVerifier + ?Sized,
    TProducts: ProductLookup + ?Sized,
    TOffers: OfferRepository + ?Sized,
{
    identity: Arc<TIdentity>,
    products: Arc<TProducts>,
    offers: Arc<TOffers>,
}

impl<TIdentity, TProducts, TOffers> AuthorizationGuard<TIdentity, TProducts, TOffers>
where
    TIdentity: IdentityVerifier + ?Sized,
    TProducts: ProductLookup + ?Sized,
    TOffers: OfferRepository + ?Sized,
{
    pub fn new(identity: Arc<TIdentity>, products: Arc<TProducts>, offers: Arc<TOffers>) -> Self {
        Self {
            identity,
            products,
            offers,
        }
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> OfferResult<UserId> {
        let token = bearer_token(authorization)?;
        self.identity.verify(token).await.map_err(|err| {
            tracing::warn!(error = %err, "rejected bearer token");
            OfferError::from(err)
        })
    }

    pub async fn authorize_product(&self, uid: &UserId, product_id: &str) -> OfferResult<Product> {
        let product = self
            .products
            .find(product_id)
            .await?
            .ok_or_else(|| OfferError::NotFound("Product not found".into()))?;
        if product.owner_uid != *uid {
            tracing::warn!(%uid, product_id, "caller does not own the product");
            return Err(OfferError::Forbidden(
                "User is not authorized to create offers for this product".into(),
            ));
        }
        Ok(product)
    }

    pub async fn authorize_offer(
        &self,
        uid: &UserId,
        offer_id: &str,
        action: OfferAction,
    ) -> OfferResult<Offer> {
        let offer = self.offers.get(offer_id).await?;
        if !offer.is_owned_by(uid) {
            tracing::warn!(%uid, offer_id, %action, "caller does not own the offer");
            return Err(OfferError::Forbidden(format!(
                "User is not authorized to {action} this offer"
            )));
        }
        Ok(offer)
    }
}

#[cfg(test)]
mod authorization_guard_tests {
    use super::*;
    use crate::modules::offers::adapters::outbound::offer_repository::DocumentOfferRepository;
    use crate::modules::offers::adapters::outbound::product_lookup::DocumentProductLookup;
    use crate::shared::core::primitives::SystemClock;
    use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
    use crate::shared::infrastructure::identity::in_memory::StaticIdentityVerifier;
    use crate::tests::fixtures::offers::{seed_offer, seed_product};
    use rstest::{fixture, rstest};

    type Guard = AuthorizationGuard<
        StaticIdentityVerifier,
        DocumentProductLookup<InMemoryDocumentStore>,
        DocumentOfferRepository<InMemoryDocumentStore>,
    >;

    #[fixture]
    fn setup() -> (Arc<InMemoryDocumentStore>, Guard) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let identity = Arc::new(
            StaticIdentityVerifier::new()
                .with_token("token-u1", "U1")
                .with_token("token-u2", "U2"),
        );
        let guard = AuthorizationGuard::new(
            identity,
            Arc::new(DocumentProductLookup::new(store.clone())),
            Arc::new(DocumentOfferRepository::new(store.clone(), Arc::new(SystemClock))),
        );
        (store, guard)
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_resolve_the_caller(setup: (Arc<InMemoryDocumentStore>, Guard)) {
        let (_, guard) = setup;
        assert_eq!(
            guard.authenticate(Some("Bearer token-u1")).await,
            Ok(UserId::new("U1"))
        );
    }

    #[rstest]
    #[case(None, "Authorization token is required")]
    #[case(Some("token-u1"), "Authorization token is required")]
    #[case(Some("Bearer forged"), "Invalid or expired token")]
    #[tokio::test]
    async fn it_should_reject_a_missing_or_invalid_token(
        setup: (Arc<InMemoryDocumentStore>, Guard),
        #[case] header: Option<&str>,
        #[case] message: &str,
    ) {
        let (_, guard) = setup;
        assert_eq!(
            guard.authenticate(header).await,
            Err(OfferError::Unauthenticated(message.into()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_allow_the_product_owner(setup: (Arc<InMemoryDocumentStore>, Guard)) {
        let (store, guard) = setup;
        seed_product(&store, "P1", "U1", "S1").await;
        let product = guard
            .authorize_product(&UserId::new("U1"), "P1")
            .await
            .unwrap();
        assert_eq!(product.store_id, "S1");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_forbid_creating_offers_for_a_foreign_product(
        setup: (Arc<InMemoryDocumentStore>, Guard),
    ) {
        let (store, guard) = setup;
        seed_product(&store, "P1", "U1", "S1").await;
        assert_eq!(
            guard.authorize_product(&UserId::new("U2"), "P1").await,
            Err(OfferError::Forbidden(
                "User is not authorized to create offers for this product".into()
            ))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_missing_product_before_ownership(
        setup: (Arc<InMemoryDocumentStore>, Guard),
    ) {
        let (_, guard) = setup;
        assert_eq!(
            guard.authorize_product(&UserId::new("U2"), "P-missing").await,
            Err(OfferError::NotFound("Product not found".into()))
        );
    }

    #[rstest]
    #[case(OfferAction::Update, "User is not authorized to update this offer")]
    #[case(OfferAction::Delete, "User is not authorized to delete this offer")]
    #[tokio::test]
    async fn it_should_name_the_denied_action(
        setup: (Arc<InMemoryDocumentStore>, Guard),
        #[case] action: OfferAction,
        #[case] message: &str,
    ) {
        let (store, guard) = setup;
        seed_offer(&store, "O1", "U1").await;
        assert_eq!(
            guard.authorize_offer(&UserId::new("U2"), "O1", action).await,
            Err(OfferError::Forbidden(message.into()))
        );
        assert!(
            guard
                .authorize_offer(&UserId::new("U1"), "O1", action)
                .await
                .is_ok()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_missing_offer_before_ownership(
        setup: (Arc<InMemoryDocumentStore>, Guard),
    ) {
        let (_, guard) = setup;
        assert!(matches!(
            guard
                .authorize_offer(&UserId::new("U2"), "O-missing", OfferAction::Delete)
                .await,
            Err(OfferError::NotFound(_))
        ));
    }
}
