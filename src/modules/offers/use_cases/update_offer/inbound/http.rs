use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::modules::offers::adapters::inbound::request::{authorization_header, json_body};
use crate::shell::state::AppState;

#[derive(Serialize)]
pub struct UpdateOfferResponse {
    pub message: &'static str,
    #[serde(rename = "offerId")]
    pub offer_id: String,
}

pub async fn handle(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let uid = match state.offers.authenticate(authorization_header(&headers)).await {
        Ok(uid) => uid,
        Err(err) => return err.into_response(),
    };
    let body = match json_body(body) {
        Ok(body) => body,
        Err(err) => return err.into_response(),
    };

    match state.offers.update(&uid, &offer_id, body).await {
        Ok(offer) => Json(UpdateOfferResponse {
            message: "Offer updated successfully",
            offer_id: offer.id,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}
