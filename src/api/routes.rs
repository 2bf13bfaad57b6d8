//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Token views
        .route("/api/token", get(handlers::get_token))
        .route(
            "/api/token/balance/{holder}",
            get(handlers::get_token_balance),
        )
        .route("/api/token/allowance", get(handlers::get_token_allowance))
        .route("/api/token/events", get(handlers::get_token_events))
        // Token calls
        .route("/api/token/transfer", post(handlers::transfer_tokens))
        .route("/api/token/approve", post(handlers::approve_tokens))
        .route(
            "/api/token/transferFrom",
            post(handlers::transfer_from_tokens),
        )
        .route("/api/token/ownership", post(handlers::change_ownership))
        // Native currency
        .route("/api/send", post(handlers::send_native))
        .route("/api/accounts/{address}", get(handlers::get_account))
        .with_state(state)
        .layer(cors)
}
