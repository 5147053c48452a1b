use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::shell::state::AppState;

/// Public read. No bearer token required.
pub async fn handle(State(state): State<AppState>, Path(offer_id): Path<String>) -> Response {
    match state.offers.get(&offer_id).await {
        Ok(offer) => Json(offer).into_response(),
        Err(err) => err.into_response(),
    }
}
