use tracing::warn;

/// Cosine similarity of two embedding vectors, in [-1, 1].
///
/// Vectors of different lengths are not comparable and score 0 (with a
/// warning, since it means two embedding models got mixed). A zero-norm
/// vector also scores 0 so rankings never see NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        warn!(
            "Cosine similarity on vectors of different length ({} vs {}); scoring 0",
            a.len(),
            b.len()
        );
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (dot / denominator).clamp(-1.0, 1.0)
}
