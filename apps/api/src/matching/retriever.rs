//! Career Retriever: ranks the catalog by embedding similarity to a student query.
//!
//! Catalog vectors live in an `EmbeddingCache` owned by the retriever. The cache
//! is filled on first use and never invalidated; concurrent first callers share
//! one in-flight population instead of racing.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::knowledge::catalog::Catalog;
use crate::knowledge::CareerEntry;
use crate::matching::profile::{ProfileExtractor, StudentProfile};
use crate::matching::similarity::cosine_similarity;

/// Strength count above which a student reads as broad rather than specialised.
const DIVERSE_STRENGTH_COUNT: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A career with its scores. Retrieval sets only `embedding_score`; the hybrid
/// scorer fills the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCareer {
    pub career: Arc<CareerEntry>,
    pub embedding_score: f64, // -1.0 – 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_match_score: Option<f64>, // 0 – 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>, // 0.0 – 1.0
}

impl RankedCareer {
    pub fn retrieved(career: Arc<CareerEntry>, embedding_score: f64) -> Self {
        Self {
            career,
            embedding_score,
            grade_match_score: None,
            final_score: None,
            confidence: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedCareer {
    pub career: Arc<CareerEntry>,
    pub embedding: Vec<f32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Embedding cache
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EmbeddingCache {
    cell: OnceCell<Vec<CachedCareer>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_populated(&self) -> bool {
        self.cell.initialized()
    }

    /// Vector dimension of the cached catalog, once populated and non-empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.cell
            .get()
            .and_then(|cached| cached.first())
            .map(|c| c.embedding.len())
    }

    /// Embeds the catalog on first call and returns the cached vectors.
    ///
    /// Callers arriving while a population is in flight wait for it. A failed
    /// population leaves the cache empty, so the next call tries again.
    pub async fn ensure_populated(
        &self,
        catalog: &Catalog,
        embedder: &dyn EmbeddingProvider,
        timeout: Duration,
    ) -> Result<&[CachedCareer], EmbeddingError> {
        let cached = self
            .cell
            .get_or_try_init(|| populate(catalog, embedder, timeout))
            .await?;
        Ok(cached.as_slice())
    }
}

async fn populate(
    catalog: &Catalog,
    embedder: &dyn EmbeddingProvider,
    timeout: Duration,
) -> Result<Vec<CachedCareer>, EmbeddingError> {
    info!(
        "Generating career embeddings for {} careers (model: {})...",
        catalog.len(),
        embedder.model()
    );

    let cached = try_join_all(catalog.entries().iter().map(|career| async move {
        let embedding = embed_with_timeout(embedder, &career.search_text(), timeout).await?;
        Ok::<_, EmbeddingError>(CachedCareer {
            career: Arc::clone(career),
            embedding,
        })
    }))
    .await?;

    if let Some(first) = cached.first() {
        let expected = first.embedding.len();
        if let Some(odd) = cached.iter().find(|c| c.embedding.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: odd.embedding.len(),
            });
        }
    }

    info!("Generated {} career embeddings", cached.len());
    Ok(cached)
}

async fn embed_with_timeout(
    embedder: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, EmbeddingError> {
    tokio::time::timeout(timeout, embedder.embed(text))
        .await
        .map_err(|_| EmbeddingError::Timeout(timeout))?
}

// ────────────────────────────────────────────────────────────────────────────
// Retriever
// ────────────────────────────────────────────────────────────────────────────

pub struct CareerRetriever {
    catalog: Catalog,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn ProfileExtractor>,
    cache: EmbeddingCache,
    timeout: Duration,
}

impl CareerRetriever {
    pub fn new(
        catalog: Catalog,
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn ProfileExtractor>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            embedder,
            extractor,
            cache: EmbeddingCache::new(),
            timeout,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn extractor(&self) -> &dyn ProfileExtractor {
        self.extractor.as_ref()
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Populates the catalog embedding cache if needed; returns the entry count.
    pub async fn ensure_populated(&self) -> Result<usize, EmbeddingError> {
        let cached = self
            .cache
            .ensure_populated(&self.catalog, self.embedder.as_ref(), self.timeout)
            .await?;
        Ok(cached.len())
    }

    /// Top `top_k` careers by cosine similarity to the transcript's student query.
    pub async fn search_relevant_careers(
        &self,
        transcript_text: &str,
        top_k: usize,
    ) -> Result<Vec<RankedCareer>, EmbeddingError> {
        let profile = self.extractor.extract(transcript_text);
        self.search_with_profile(&profile, top_k).await
    }

    /// Same as `search_relevant_careers` for an already extracted profile.
    pub async fn search_with_profile(
        &self,
        profile: &StudentProfile,
        top_k: usize,
    ) -> Result<Vec<RankedCareer>, EmbeddingError> {
        let cached = self
            .cache
            .ensure_populated(&self.catalog, self.embedder.as_ref(), self.timeout)
            .await?;
        if cached.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query = build_student_query(profile);
        let query_embedding = embed_with_timeout(self.embedder.as_ref(), &query, self.timeout).await?;

        let expected = cached[0].embedding.len();
        if query_embedding.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: query_embedding.len(),
            });
        }

        let mut ranked: Vec<RankedCareer> = cached
            .iter()
            .map(|c| {
                RankedCareer::retrieved(
                    Arc::clone(&c.career),
                    cosine_similarity(&query_embedding, &c.embedding),
                )
            })
            .collect();

        // Stable: equal similarities keep catalog order.
        ranked.sort_by(|a, b| {
            b.embedding_score
                .partial_cmp(&a.embedding_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(top_k);

        debug!(
            "Retrieved {} careers (best: {:?})",
            ranked.len(),
            ranked.first().map(|r| r.career.id.as_str())
        );
        Ok(ranked)
    }
}

/// Natural-language summary of a profile, embedded as the search query.
pub fn build_student_query(profile: &StudentProfile) -> String {
    let breadth = if profile.strengths.len() > DIVERSE_STRENGTH_COUNT {
        "Diverse skill set with multiple strong areas."
    } else {
        "Specialized focus in core subjects."
    };

    format!(
        "Student with strong academic performance in: {}.\n\
         Average score: {:.1}.\n\
         Key strengths in: {}.\n\
         Looking for careers that match these academic strengths and interests.\n\
         {}",
        profile.top_subjects.join(", "),
        profile.avg_score,
        profile.strengths.join(", "),
        breadth,
    )
}
