// Offer and Product domain records.
//
// Boundaries
// - No input or output. Pure data and validation.
//
// Invariants
// - owner_uid is the creator's verified identity and never changes.
// - store_id is copied from the referenced product at creation time.
// - offer_price is strictly positive; start_date is not after end_date.

use crate::modules::offers::core::errors::{OfferError, OfferResult};
use crate::shared::core::primitives::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub product_id: String,
    pub owner_uid: UserId,
    pub store_id: String,
    pub offer_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of a product, used to authorize offer creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub owner_uid: UserId,
    pub store_id: String,
}

/// Create body as sent by the caller. Caller-supplied `owner_uid` or `store_id` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateOfferRequest {
    pub product_id: Option<String>,
    pub offer_price: Option<Decimal>,
    pub offer_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOffer {
    product_id: String,
    offer_price: Decimal,
    offer_type: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

/// Everything the repository needs to create an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferDraft {
    pub product_id: String,
    pub owner_uid: UserId,
    pub store_id: String,
    pub offer_price: Decimal,
    pub offer_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub fn ensure_positive_price(price: Decimal) -> OfferResult<()> {
    if price <= Decimal::ZERO {
        return Err(OfferError::InvalidArgument(
            "offer_price must be greater than zero".into(),
        ));
    }
    Ok(())
}

pub fn ensure_date_order(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> OfferResult<()> {
    match (start_date, end_date) {
        (Some(start), Some(end)) if start > end => Err(OfferError::InvalidArgument(
            "start_date must not be after end_date".into(),
        )),
        _ => Ok(()),
    }
}

impl CreateOfferRequest {
    pub fn from_json(body: Json) -> OfferResult<Self> {
        serde_json::from_value(body)
            .map_err(|err| OfferError::InvalidArgument(format!("malformed offer: {err}")))
    }

    pub fn validate(self) -> OfferResult<ValidatedOffer> {
        let missing =
            || OfferError::InvalidArgument("Product ID and offer price are required".into());
        let product_id = self
            .product_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(missing)?;
        let offer_price = self.offer_price.ok_or_else(missing)?;
        ensure_positive_price(offer_price)?;
        ensure_date_order(self.start_date, self.end_date)?;
        Ok(ValidatedOffer {
            product_id,
            offer_price,
            offer_type: self.offer_type,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

impl ValidatedOffer {
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn into_draft(self, owner_uid: UserId, product: &Product) -> OfferDraft {
        OfferDraft {
            product_id: self.product_id,
            owner_uid,
            store_id: product.store_id.clone(),
            offer_price: self.offer_price,
            offer_type: self.offer_type,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

impl Offer {
    pub fn from_draft(id: String, draft: OfferDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id: draft.product_id,
            owner_uid: draft.owner_uid,
            store_id: draft.store_id,
            offer_price: draft.offer_price,
            offer_type: draft.offer_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, uid: &UserId) -> bool {
        &self.owner_uid == uid
    }
}
