//! Transcript Profile Extractor: turns OCR'd transcript text into a `StudentProfile`.
//!
//! Extraction is heuristic, so it sits behind the `ProfileExtractor` trait; a
//! stricter structured parser can replace `PatternProfileExtractor` without
//! touching the retriever or the scorer.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::grades::normalize_grade;

pub const STRENGTH_MIN_SCORE: f64 = 85.0;
pub const WEAKNESS_BELOW_SCORE: f64 = 70.0;
pub const TOP_SUBJECT_COUNT: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectGrade {
    pub name: String,
    pub grade: String, // as written on the transcript
    pub score: f64,    // 0 – 100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub subjects: Vec<SubjectGrade>, // transcript order
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub avg_score: f64,
    pub top_subjects: Vec<String>,
}

impl StudentProfile {
    /// Derives strengths, weaknesses, average and top subjects from graded subjects.
    pub fn from_subjects(subjects: Vec<SubjectGrade>) -> Self {
        let avg_score = if subjects.is_empty() {
            0.0
        } else {
            subjects.iter().map(|s| s.score).sum::<f64>() / subjects.len() as f64
        };

        let strengths = subjects
            .iter()
            .filter(|s| s.score >= STRENGTH_MIN_SCORE)
            .map(|s| s.name.clone())
            .collect();
        let weaknesses = subjects
            .iter()
            .filter(|s| s.score < WEAKNESS_BELOW_SCORE)
            .map(|s| s.name.clone())
            .collect();

        // Stable sort keeps first-occurrence order among equal scores.
        let mut ranked: Vec<&SubjectGrade> = subjects.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let top_subjects = ranked
            .into_iter()
            .take(TOP_SUBJECT_COUNT)
            .map(|s| s.name.clone())
            .collect();

        Self {
            subjects,
            strengths,
            weaknesses,
            avg_score,
            top_subjects,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extractors
// ────────────────────────────────────────────────────────────────────────────

pub trait ProfileExtractor: Send + Sync {
    /// Never fails: unreadable text yields an empty profile.
    fn extract(&self, transcript_text: &str) -> StudentProfile;
}

/// Scans for "subject name, then grade" pairs on each line.
///
/// A name is a run of ASCII letters and blanks, separated from the grade by
/// blanks or a colon. The grade is a letter A–F with an optional `+`/`-`, or
/// a number, and must not run straight into another letter or digit, so "Data Analysis" is not read as "Data" graded "A".
pub struct PatternProfileExtractor {
    pair_regex: Regex,
}

impl Default for PatternProfileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternProfileExtractor {
    pub fn new() -> Self {
        let pair_regex = Regex::new(
            r"(?m)([A-Za-z][A-Za-z \t]*?)[ \t]*(?::[ \t]*|[ \t]+)([A-F][+-]?|\d+(?:\.\d+)?)(?:[^A-Za-z0-9]|$)",
        )
        .expect("Invalid subject/grade regex");

        Self { pair_regex }
    }
}

impl ProfileExtractor for PatternProfileExtractor {
    fn extract(&self, transcript_text: &str) -> StudentProfile {
        let subjects = self
            .pair_regex
            .captures_iter(transcript_text)
            .map(|caps| {
                let grade = caps[2].to_string();
                SubjectGrade {
                    name: caps[1].trim().to_string(),
                    score: normalize_grade(&grade),
                    grade,
                }
            })
            .collect();

        StudentProfile::from_subjects(subjects)
    }
}

/// Extracts a profile with the default pattern extractor.
#[cfg_attr(not(test), allow(dead_code))]
pub fn extract_profile(transcript_text: &str) -> StudentProfile {
    PatternProfileExtractor::new().extract(transcript_text)
}
