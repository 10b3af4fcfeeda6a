mod config;
mod embedding;
mod errors;
mod knowledge;
mod matching;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EmbeddingBackend};
use crate::embedding::{EmbeddingProvider, GeminiEmbedder, OpenAiEmbedder};
use crate::knowledge::catalog::Catalog;
use crate::matching::hybrid::HybridScorer;
use crate::matching::profile::PatternProfileExtractor;
use crate::matching::recommender::CareerRecommender;
use crate::matching::retriever::CareerRetriever;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing API key or malformed value)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerLens API v{}", env!("CARGO_PKG_VERSION"));

    // Load the career knowledge base (immutable for the process lifetime)
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin().context("built-in career catalog is invalid")?,
    };
    if catalog.is_empty() {
        warn!("Career catalog is empty; every match will return no careers");
    } else {
        info!("Career catalog ready ({} careers)", catalog.len());
    }

    // Initialize embedding provider
    let embedder = build_embedder(&config)?;
    info!(
        "Embedding provider initialized ({:?}, model: {})",
        config.embedding_backend,
        embedder.model()
    );

    let retriever = CareerRetriever::new(
        catalog,
        embedder,
        Arc::new(PatternProfileExtractor::new()),
        config.embedding_timeout,
    );
    let recommender = Arc::new(CareerRecommender::new(
        retriever,
        HybridScorer::new(config.hybrid_weights),
    ));

    if config.warm_embeddings_on_start {
        let recommender = Arc::clone(&recommender);
        tokio::spawn(async move {
            match recommender.retriever().ensure_populated().await {
                Ok(count) => info!("Warmed embedding cache with {count} careers"),
                // The first match request will retry the population.
                Err(e) => warn!("Embedding cache warm-up failed: {e}"),
            }
        });
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        recommender,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web frontend's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the embedding client selected by EMBEDDING_PROVIDER.
fn build_embedder(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    let api_key = config.embedding_api_key.clone();
    let model = config.embedding_model.clone();
    let base_url = config.embedding_base_url.clone();
    let timeout = config.embedding_timeout;

    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Gemini => Arc::new(
            GeminiEmbedder::new(api_key, model, base_url, timeout)
                .context("failed to build Gemini embedding client")?,
        ),
        EmbeddingBackend::OpenAi => Arc::new(
            OpenAiEmbedder::new(api_key, model, base_url, timeout)
                .context("failed to build OpenAI embedding client")?,
        ),
    };
    Ok(embedder)
}
