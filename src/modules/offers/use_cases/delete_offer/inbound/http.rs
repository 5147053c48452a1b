use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::modules::offers::adapters::inbound::request::authorization_header;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let uid = match state.offers.authenticate(authorization_header(&headers)).await {
        Ok(uid) => uid,
        Err(err) => return err.into_response(),
    };

    match state.offers.delete(&uid, &offer_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
