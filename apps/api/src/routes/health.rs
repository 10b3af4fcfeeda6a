use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the embedding backend and cache state.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let retriever = state.recommender.retriever();
    let cache = if retriever.cache().is_populated() {
        "populated"
    } else {
        "empty"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "careerlens",
        "embedding_model": retriever.embedder().model(),
        "embedding_cache": cache,
        "embedding_dimensions": retriever.cache().dimensions(),
        "catalog_size": retriever.catalog().len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
