use crate::modules::offers::core::errors::{OfferError, OfferResult};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde_json::Value;

pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
}

/// Undecodable bodies are the caller's fault: 400, not axum's default 415/422.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> OfferResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| OfferError::InvalidArgument(rejection.body_text()))
}
