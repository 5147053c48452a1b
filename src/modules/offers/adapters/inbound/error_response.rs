use crate::modules::offers::core::errors::OfferError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl OfferError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OfferError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            OfferError::Forbidden(_) => StatusCode::FORBIDDEN,
            OfferError::NotFound(_) => StatusCode::NOT_FOUND,
            OfferError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            OfferError::Conflict(_) => StatusCode::CONFLICT,
            OfferError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            OfferError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            OfferError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OfferError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
