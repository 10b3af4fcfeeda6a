use std::sync::Arc;

use crate::config::Config;
use crate::matching::recommender::CareerRecommender;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the catalog, the embedding provider and the process-wide embedding cache.
    pub recommender: Arc<CareerRecommender>,
}
