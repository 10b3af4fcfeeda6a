//! Tolerant subject-name matching between catalog thresholds and transcript lines.
//!
//! Transcripts abbreviate ("Math") or expand ("Advanced Mathematics II") subject
//! names, so two names match when either normalized name contains the other.

/// Lowercases, strips punctuation, and collapses whitespace.
pub fn normalize_subject(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when either normalized name contains the other. Empty names never match.
pub fn subjects_match(a: &str, b: &str) -> bool {
    let a = normalize_subject(a);
    let b = normalize_subject(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}
