// Shared offer fixtures: a create body backed by a JSON file, canned offers, and seeding helpers.

use crate::modules::offers::adapters::outbound::offer_repository::OFFERS;
use crate::modules::offers::adapters::outbound::product_lookup::PRODUCTS;
use crate::modules::offers::core::offer::{CreateOfferRequest, Offer, OfferDraft};
use crate::shared::core::primitives::UserId;
use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use std::fs;

pub fn start_of_fixtures() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap()
}

pub struct CreateOfferRequestBuilder {
    inner: Value,
}

impl Default for CreateOfferRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl CreateOfferRequestBuilder {
    pub fn new() -> Self {
        let json_str =
            fs::read_to_string("./src/tests/fixtures/json/create_offer_request.json").unwrap();
        Self {
            inner: serde_json::from_str(&json_str).unwrap(),
        }
    }

    pub fn product_id(mut self, v: &str) -> Self {
        self.inner["product_id"] = json!(v);
        self
    }

    pub fn offer_price(mut self, v: f64) -> Self {
        self.inner["offer_price"] = json!(v);
        self
    }

    pub fn start_date(mut self, v: &str) -> Self {
        self.inner["start_date"] = json!(v);
        self
    }

    pub fn end_date(mut self, v: &str) -> Self {
        self.inner["end_date"] = json!(v);
        self
    }

    pub fn to_json(&self) -> Value {
        self.inner.clone()
    }

    pub fn build(self) -> CreateOfferRequest {
        CreateOfferRequest::from_json(self.inner).unwrap()
    }
}

/// Draft for product P1 in store S1.
pub fn make_draft(owner: &str) -> OfferDraft {
    let request = CreateOfferRequestBuilder::new().build();
    OfferDraft {
        product_id: request.product_id.unwrap(),
        owner_uid: UserId::new(owner),
        store_id: "S1".into(),
        offer_price: request.offer_price.unwrap(),
        offer_type: request.offer_type,
        start_date: request.start_date,
        end_date: request.end_date,
    }
}

pub fn make_offer(id: &str, owner: &str) -> Offer {
    Offer::from_draft(id.to_string(), make_draft(owner), start_of_fixtures())
}

pub async fn seed_product(store: &InMemoryDocumentStore, id: &str, owner: &str, store_id: &str) {
    store
        .seed(
            PRODUCTS,
            id,
            json!({"owner_uid": owner, "store_id": store_id, "name": "Cafe especial"}),
        )
        .await;
}

pub async fn seed_offer(store: &InMemoryDocumentStore, id: &str, owner: &str) -> Offer {
    let offer = make_offer(id, owner);
    store
        .seed(OFFERS, id, serde_json::to_value(&offer).unwrap())
        .await;
    offer
}

#[cfg(test)]
mod offer_fixtures_tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    fn it_should_load_the_canonical_create_body() {
        let request = CreateOfferRequestBuilder::default().build();
        assert_eq!(request.product_id.as_deref(), Some("P1"));
        assert_eq!(request.offer_price, Some("79.99".parse::<Decimal>().unwrap()));
        assert_eq!(request.offer_type.as_deref(), Some("promocao"));
        assert!(request.start_date < request.end_date);
    }

    #[rstest]
    fn it_should_override_fields() {
        let body = CreateOfferRequestBuilder::new()
            .product_id("P9")
            .offer_price(1.5)
            .to_json();
        assert_eq!(body["product_id"], json!("P9"));
        assert_eq!(body["offer_price"], json!(1.5));
    }
}
