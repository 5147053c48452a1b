use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::modules::offers::use_cases::create_offer::inbound::http as create_http;
use crate::modules::offers::use_cases::delete_offer::inbound::http as delete_http;
use crate::modules::offers::use_cases::get_offer::inbound::http as get_http;
use crate::modules::offers::use_cases::update_offer::inbound::http as update_http;
use crate::shell::health;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/offers", post(create_http::handle))
        .route(
            "/offers/{id}",
            get(get_http::handle)
                .put(update_http::handle)
                .delete(delete_http::handle),
        )
        .route("/health", get(health::handle))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
