//! Grade Normalizer: maps letter grades and numeric scores onto one 0–100 scale.

/// Score assumed for a grade we cannot read.
pub const UNKNOWN_GRADE_SCORE: f64 = 75.0;

const LETTER_SCORES: [(&str, f64); 13] = [
    ("A+", 97.0),
    ("A", 93.0),
    ("A-", 90.0),
    ("B+", 87.0),
    ("B", 83.0),
    ("B-", 80.0),
    ("C+", 77.0),
    ("C", 73.0),
    ("C-", 70.0),
    ("D+", 67.0),
    ("D", 63.0),
    ("D-", 60.0),
    ("F", 50.0),
];

/// Normalizes a raw grade to a score in [0, 100]. Never fails.
///
/// Numeric input passes through clamped to [0, 100]; letter grades use the
/// standard US table (case-insensitive); anything else scores
/// [`UNKNOWN_GRADE_SCORE`].
pub fn normalize_grade(grade: &str) -> f64 {
    let grade = grade.trim();

    if let Ok(score) = grade.parse::<f64>() {
        if score.is_finite() {
            return score.clamp(0.0, 100.0);
        }
    }

    let upper = grade.to_ascii_uppercase();
    LETTER_SCORES
        .iter()
        .find(|(letter, _)| *letter == upper)
        .map(|(_, score)| *score)
        .unwrap_or(UNKNOWN_GRADE_SCORE)
}
