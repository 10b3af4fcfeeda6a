//! Knowledge Base: the static catalog of career archetypes the matcher ranks.
//!
//! Entries are loaded once at startup (see `catalog`) and never mutated afterwards.

pub mod catalog;

use serde::{Deserialize, Serialize};

use crate::matching::grades::normalize_grade;

// ────────────────────────────────────────────────────────────────────────────
// Schema
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Critical,
    Important,
    Helpful,
}

impl Importance {
    /// Weight of a threshold in the grade-match score.
    pub fn weight(self) -> f64 {
        match self {
            Importance::Critical => 1.0,
            Importance::Important => 0.6,
            Importance::Helpful => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Stable,
    Declining,
}

/// A threshold's floor: either a letter grade ("B+") or a numeric score (83).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinimumGrade {
    Score(f64),
    Letter(String),
}

impl MinimumGrade {
    /// The floor on the 0–100 scale.
    pub fn score(&self) -> f64 {
        match self {
            MinimumGrade::Score(score) => score.clamp(0.0, 100.0),
            MinimumGrade::Letter(letter) => normalize_grade(letter),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub subject: String,
    pub minimum_grade: MinimumGrade,
    pub importance: Importance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub required_subjects: Vec<String>,
    pub required_skills: Vec<String>,
    pub grade_thresholds: Vec<GradeThreshold>,
    pub academic_profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_trends: Option<String>,
    pub salary_range: String,
    pub growth_rate: String,
    pub demand_level: u8, // 0 – 100
    pub trend: Trend,
    pub industries: Vec<String>,
    pub tools: Vec<String>,
    pub tags: Vec<String>,
}

impl CareerEntry {
    /// Builds the descriptive text that is embedded for this career.
    pub fn search_text(&self) -> String {
        let lead_subjects: Vec<&str> = self
            .required_subjects
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();

        format!(
            "Career: {}\n\
             Description: {}\n\
             Required Subjects: {}\n\
             Key Skills: {}\n\
             Academic Profile: {}\n\
             Industries: {}\n\
             Tags: {}\n\
             Suitable for students with strong performance in {}",
            self.title,
            self.description,
            self.required_subjects.join(", "),
            self.required_skills.join(", "),
            self.academic_profile,
            self.industries.join(", "),
            self.tags.join(", "),
            lead_subjects.join(", "),
        )
    }
}
