//! Axum route handlers for the Matching API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::knowledge::CareerEntry;
use crate::matching::hybrid::HybridWeights;
use crate::matching::profile::StudentProfile;
use crate::matching::retriever::RankedCareer;
use crate::state::AppState;

/// Upper bound for `top_k` and `candidates` in requests.
pub const MAX_TOP_K: usize = 50;
pub const MAX_TRANSCRIPT_CHARS: usize = 100_000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub transcript_text: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: StudentProfile,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub transcript_text: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub careers: Vec<RankedCareer>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub transcript_text: String,
    pub top_k: Option<usize>,
    pub candidates: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MatchMetadata {
    pub embedding_model: String,
    pub candidate_pool: usize,
    pub weights: HybridWeights,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub request_id: Uuid,
    pub profile: StudentProfile,
    pub careers: Vec<RankedCareer>,
    pub metadata: MatchMetadata,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub count: usize,
    pub careers: Vec<Arc<CareerEntry>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/transcripts/profile
///
/// Extracts the student profile only. No embedding call.
pub async fn handle_extract_profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_transcript(&request.transcript_text)?;

    let profile = state
        .recommender
        .retriever()
        .extractor()
        .extract(&request.transcript_text);

    Ok(Json(ProfileResponse { profile }))
}

/// POST /api/v1/careers/search
///
/// Ranks careers by embedding similarity alone.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    validate_transcript(&request.transcript_text)?;
    let top_k = resolve_count("top_k", request.top_k, state.config.default_top_k)?;

    let careers = state
        .recommender
        .retriever()
        .search_relevant_careers(&request.transcript_text, top_k)
        .await?;

    Ok(Json(SearchResponse { careers }))
}

/// POST /api/v1/careers/match
///
/// Full pipeline: profile → embedding retrieval → hybrid re-rank.
/// An embedding failure is an error response, never an empty list.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    validate_transcript(&request.transcript_text)?;
    let top_k = resolve_count("top_k", request.top_k, state.config.default_top_k)?;
    let candidate_pool = resolve_count("candidates", request.candidates, state.config.candidate_pool)?;

    let request_id = Uuid::new_v4();
    let recommendation = state
        .recommender
        .recommend(&request.transcript_text, candidate_pool, top_k)
        .instrument(info_span!("match", %request_id))
        .await?;

    Ok(Json(MatchResponse {
        request_id,
        profile: recommendation.profile,
        careers: recommendation.careers,
        metadata: MatchMetadata {
            embedding_model: state.recommender.retriever().embedder().model().to_string(),
            candidate_pool: candidate_pool.max(top_k),
            weights: *state.recommender.scorer().weights(),
            generated_at: Utc::now(),
        },
    }))
}

/// GET /api/v1/careers
pub async fn handle_list_careers(State(state): State<AppState>) -> Json<CatalogResponse> {
    let catalog = state.recommender.retriever().catalog();
    Json(CatalogResponse {
        count: catalog.len(),
        careers: catalog.entries().to_vec(),
    })
}

/// GET /api/v1/careers/:id
pub async fn handle_get_career(
    State(state): State<AppState>,
    Path(career_id): Path<String>,
) -> Result<Json<Arc<CareerEntry>>, AppError> {
    state
        .recommender
        .retriever()
        .catalog()
        .get(&career_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Career {career_id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

/// Empty text is allowed (it yields an empty profile); oversized text is not.
fn validate_transcript(text: &str) -> Result<(), AppError> {
    let chars = text.chars().count();
    if chars > MAX_TRANSCRIPT_CHARS {
        return Err(AppError::Validation(format!(
            "transcript_text is {chars} characters; the limit is {MAX_TRANSCRIPT_CHARS}"
        )));
    }
    Ok(())
}

fn resolve_count(field: &str, requested: Option<usize>, default: usize) -> Result<usize, AppError> {
    let value = requested.unwrap_or(default);
    if !(1..=MAX_TOP_K).contains(&value) {
        return Err(AppError::Validation(format!(
            "{field} must be between 1 and {MAX_TOP_K}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_count_uses_default() {
        assert_eq!(resolve_count("top_k", None, 10).unwrap(), 10);
        assert_eq!(resolve_count("top_k", Some(3), 10).unwrap(), 3);
    }

    #[test]
    fn test_resolve_count_rejects_out_of_range() {
        assert!(matches!(
            resolve_count("top_k", Some(0), 10),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            resolve_count("candidates", Some(MAX_TOP_K + 1), 10),
            Err(AppError::Validation(msg)) if msg.contains("candidates")
        ));
    }

    #[test]
    fn test_empty_transcript_is_valid() {
        assert!(validate_transcript("").is_ok());
    }

    #[test]
    fn test_oversized_transcript_is_rejected() {
        let text = "A".repeat(MAX_TRANSCRIPT_CHARS + 1);
        assert!(matches!(validate_transcript(&text), Err(AppError::Validation(_))));
    }
}
