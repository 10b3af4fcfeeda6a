pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Knowledge base
        .route("/api/v1/careers", get(handlers::handle_list_careers))
        .route("/api/v1/careers/:id", get(handlers::handle_get_career))
        // Matching
        .route(
            "/api/v1/transcripts/profile",
            post(handlers::handle_extract_profile),
        )
        .route("/api/v1/careers/search", post(handlers::handle_search))
        .route("/api/v1/careers/match", post(handlers::handle_match))
        .with_state(state)
}
