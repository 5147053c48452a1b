// Partial update of an offer.
//
// Invariants
// - Server-assigned fields are rejected, never silently dropped.
// - Unknown fields are rejected.
// - updated_at never moves backwards.

use crate::modules::offers::core::errors::{OfferError, OfferResult};
use crate::modules::offers::core::offer::{Offer, ensure_date_order, ensure_positive_price};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as Json};

pub const SERVER_ASSIGNED_FIELDS: [&str; 6] = [
    "id",
    "owner_uid",
    "store_id",
    "created_at",
    "updated_at",
    "product_id",
];

// Distinguishes an explicit `null` (clear the field) from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfferPatch {
    #[serde(default)]
    pub offer_price: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    pub offer_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub offer: Offer,
    /// `{field: {"from": old, "to": new}}` for every field whose value changed.
    pub changes: Json,
}

#[derive(Serialize)]
struct Change<'a, T: Serialize> {
    from: &'a T,
    to: &'a T,
}

fn record<T: Serialize + PartialEq>(
    changes: &mut Map<String, Json>,
    field: &str,
    from: &T,
    to: &T,
) -> OfferResult<()> {
    if from != to {
        let change = serde_json::to_value(Change { from, to })
            .map_err(|err| OfferError::Internal(err.to_string()))?;
        changes.insert(field.to_string(), change);
    }
    Ok(())
}

impl OfferPatch {
    pub fn from_json(body: Json) -> OfferResult<Self> {
        let Json::Object(fields) = body else {
            return Err(OfferError::InvalidArgument(
                "update body must be a JSON object".into(),
            ));
        };
        if fields.is_empty() {
            return Err(OfferError::InvalidArgument("Update data is required".into()));
        }
        let forbidden: Vec<&str> = SERVER_ASSIGNED_FIELDS
            .iter()
            .copied()
            .filter(|field| fields.contains_key(*field))
            .collect();
        if !forbidden.is_empty() {
            return Err(OfferError::InvalidArgument(format!(
                "fields cannot be updated: {}",
                forbidden.join(", ")
            )));
        }
        if fields.get("offer_price").is_some_and(Json::is_null) {
            return Err(OfferError::InvalidArgument(
                "offer_price cannot be cleared".into(),
            ));
        }
        let patch: OfferPatch = serde_json::from_value(Json::Object(fields))
            .map_err(|err| OfferError::InvalidArgument(format!("malformed update: {err}")))?;
        if patch.is_empty() {
            return Err(OfferError::InvalidArgument("Update data is required".into()));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.offer_price.is_none()
            && self.offer_type.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Merge into `current`, stamping `updated_at` no earlier than its previous value.
    pub fn apply_to(&self, current: &Offer, now: DateTime<Utc>) -> OfferResult<PatchOutcome> {
        let mut next = current.clone();
        if let Some(price) = self.offer_price {
            ensure_positive_price(price)?;
            next.offer_price = price;
        }
        if let Some(offer_type) = &self.offer_type {
            next.offer_type = offer_type.clone();
        }
        if let Some(start_date) = self.start_date {
            next.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            next.end_date = end_date;
        }
        ensure_date_order(next.start_date, next.end_date)?;
        next.updated_at = now.max(current.updated_at);

        let mut changes = Map::new();
        record(&mut changes, "offer_price", &current.offer_price, &next.offer_price)?;
        record(&mut changes, "offer_type", &current.offer_type, &next.offer_type)?;
        record(&mut changes, "start_date", &current.start_date, &next.start_date)?;
        record(&mut changes, "end_date", &current.end_date, &next.end_date)?;

        Ok(PatchOutcome {
            offer: next,
            changes: Json::Object(changes),
        })
    }
}
