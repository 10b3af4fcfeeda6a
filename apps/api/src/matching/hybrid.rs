//! Hybrid Scorer: blends embedding similarity with a rule-based grade match.
//!
//! Grade match, per career threshold with transcript evidence:
//! - met:    (student / 100) × weight
//! - missed: (student / required) × 0.5 × weight
//!
//! score = Σ contribution / Σ weight × 100, or 50 when no threshold has evidence.
//! final = embedding × 0.6 + grade_match × 0.4 (weights configurable).

use serde::{Deserialize, Serialize};

use crate::knowledge::CareerEntry;
use crate::matching::profile::StudentProfile;
use crate::matching::retriever::RankedCareer;
use crate::matching::subjects::subjects_match;

/// Grade-match score when none of a career's thresholds appear on the transcript.
pub const NO_EVIDENCE_SCORE: f64 = 50.0;
/// Share of proportional credit kept for a missed threshold.
const MISSED_THRESHOLD_CREDIT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    pub embedding: f64,
    pub grade_match: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            embedding: 0.6,
            grade_match: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeMatch {
    pub score: f64,      // 0 – 100
    pub confidence: f64, // 0 – 1, evidenced weight / total threshold weight
}

/// Computes the grade match and how much of it rests on transcript evidence.
pub fn grade_match(profile: &StudentProfile, career: &CareerEntry) -> GradeMatch {
    let mut matched = 0.0_f64;
    let mut evidenced_weight = 0.0_f64;
    let mut total_weight = 0.0_f64;

    for threshold in &career.grade_thresholds {
        let weight = threshold.importance.weight();
        total_weight += weight;

        let Some(subject) = profile
            .subjects
            .iter()
            .find(|s| subjects_match(&s.name, &threshold.subject))
        else {
            // No evidence: neither rewarded nor penalised.
            continue;
        };

        let required = threshold.minimum_grade.score();
        if subject.score >= required {
            matched += (subject.score / 100.0) * weight;
        } else {
            matched += (subject.score / required) * MISSED_THRESHOLD_CREDIT * weight;
        }
        evidenced_weight += weight;
    }

    let score = if evidenced_weight > 0.0 {
        ((matched / evidenced_weight) * 100.0).clamp(0.0, 100.0)
    } else {
        NO_EVIDENCE_SCORE
    };
    let confidence = if total_weight > 0.0 {
        evidenced_weight / total_weight
    } else {
        0.0
    };

    GradeMatch { score, confidence }
}

/// Grade-match score in [0, 100] for one career.
#[cfg_attr(not(test), allow(dead_code))]
pub fn score_grade_match(profile: &StudentProfile, career: &CareerEntry) -> f64 {
    grade_match(profile, career).score
}

pub fn combine_scores(embedding_score: f64, grade_match_score: f64, weights: &HybridWeights) -> f64 {
    embedding_score * weights.embedding + grade_match_score * weights.grade_match
}

#[derive(Debug, Clone, Default)]
pub struct HybridScorer {
    weights: HybridWeights,
}

impl HybridScorer {
    pub fn new(weights: HybridWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &HybridWeights {
        &self.weights
    }

    /// Fills in grade match, confidence and final score on a retrieved candidate.
    pub fn score(&self, profile: &StudentProfile, mut candidate: RankedCareer) -> RankedCareer {
        let grade = grade_match(profile, &candidate.career);
        candidate.grade_match_score = Some(grade.score);
        candidate.confidence = Some(grade.confidence);
        candidate.final_score = Some(combine_scores(
            candidate.embedding_score,
            grade.score,
            &self.weights,
        ));
        candidate
    }

    /// Scores every candidate and sorts by final score, highest first.
    /// Ties keep retrieval order.
    pub fn rerank(&self, profile: &StudentProfile, candidates: Vec<RankedCareer>) -> Vec<RankedCareer> {
        let mut scored: Vec<RankedCareer> = candidates
            .into_iter()
            .map(|candidate| self.score(profile, candidate))
            .collect();

        scored.sort_by(|a, b| {
            b.final_score
                .unwrap_or_default()
                .partial_cmp(&a.final_score.unwrap_or_default())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored
    }
}
