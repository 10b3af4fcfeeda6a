//! Recommender: the full matching pipeline behind the match endpoint.
//!
//! transcript → profile → embedding retrieval (candidate pool) → hybrid re-rank → top N.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embedding::EmbeddingError;
use crate::matching::hybrid::HybridScorer;
use crate::matching::profile::StudentProfile;
use crate::matching::retriever::{CareerRetriever, RankedCareer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub profile: StudentProfile,
    pub careers: Vec<RankedCareer>,
}

pub struct CareerRecommender {
    retriever: CareerRetriever,
    scorer: HybridScorer,
}

impl CareerRecommender {
    pub fn new(retriever: CareerRetriever, scorer: HybridScorer) -> Self {
        Self { retriever, scorer }
    }

    pub fn retriever(&self) -> &CareerRetriever {
        &self.retriever
    }

    pub fn scorer(&self) -> &HybridScorer {
        &self.scorer
    }

    /// Retrieves `candidates` careers by similarity, re-ranks them with the
    /// hybrid score, and keeps the best `top_n`.
    pub async fn recommend(
        &self,
        transcript_text: &str,
        candidates: usize,
        top_n: usize,
    ) -> Result<Recommendation, EmbeddingError> {
        let profile = self.retriever.extractor().extract(transcript_text);
        if profile.is_empty() {
            info!("No subject/grade pairs found in transcript; ranking on a degenerate query");
        }

        let retrieved = self
            .retriever
            .search_with_profile(&profile, candidates.max(top_n))
            .await?;

        let mut careers = self.scorer.rerank(&profile, retrieved);
        careers.truncate(top_n);

        info!(
            "Matched {} careers from {} subjects (top: {:?})",
            careers.len(),
            profile.subjects.len(),
            careers.first().map(|c| c.career.id.as_str())
        );

        Ok(Recommendation { profile, careers })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::embedding::test_support::{FailingEmbedder, HashEmbedder};
    use crate::embedding::EmbeddingProvider;
    use crate::knowledge::catalog::Catalog;
    use crate::matching::hybrid::HybridWeights;
    use crate::matching::profile::PatternProfileExtractor;

    const TRANSCRIPT: &str = "\
        Mathematics A+\n\
        Statistics A\n\
        Computer Science A-\n\
        Economics B\n\
        Art D\n\
        Design D-\n";

    fn recommender(embedder: Arc<dyn EmbeddingProvider>) -> CareerRecommender {
        let retriever = CareerRetriever::new(
            Catalog::builtin().unwrap(),
            embedder,
            Arc::new(PatternProfileExtractor::new()),
            Duration::from_secs(5),
        );
        CareerRecommender::new(retriever, HybridScorer::new(HybridWeights::default()))
    }

    #[tokio::test]
    async fn test_recommendations_are_fully_scored_and_sorted() {
        let recommender = recommender(Arc::new(HashEmbedder::new()));
        let rec = recommender.recommend(TRANSCRIPT, 11, 5).await.unwrap();

        assert_eq!(rec.careers.len(), 5);
        assert_eq!(rec.profile.subjects.len(), 6);
        for career in &rec.careers {
            let grade = career.grade_match_score.unwrap();
            assert!((0.0..=100.0).contains(&grade));
            assert!(career.final_score.is_some());
            assert!(career.confidence.is_some());
        }
        for pair in rec.careers.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
    }

    #[tokio::test]
    async fn test_strong_quantitative_transcript_favours_quantitative_careers() {
        let recommender = recommender(Arc::new(HashEmbedder::new()));
        let rec = recommender.recommend(TRANSCRIPT, 11, 11).await.unwrap();

        let position = |id: &str| rec.careers.iter().position(|c| c.career.id == id).unwrap();
        assert!(position("data-scientist") < position("graphic-designer"));
        assert!(position("financial-analyst") < position("ux-designer"));
    }

    #[tokio::test]
    async fn test_empty_transcript_still_recommends() {
        let recommender = recommender(Arc::new(HashEmbedder::new()));
        let rec = recommender.recommend("", 10, 3).await.unwrap();

        assert!(rec.profile.is_empty());
        assert_eq!(rec.careers.len(), 3);
        for career in &rec.careers {
            assert_eq!(career.grade_match_score, Some(50.0));
            assert_eq!(career.confidence, Some(0.0));
        }
    }

    #[tokio::test]
    async fn test_candidate_pool_never_smaller_than_top_n() {
        let recommender = recommender(Arc::new(HashEmbedder::new()));
        let rec = recommender.recommend(TRANSCRIPT, 2, 6).await.unwrap();
        assert_eq!(rec.careers.len(), 6);
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_an_empty_result() {
        let recommender = recommender(Arc::new(FailingEmbedder { status: 401 }));
        let err = recommender.recommend(TRANSCRIPT, 10, 5).await.unwrap_err();
        assert!(!err.is_transient());
    }
}
