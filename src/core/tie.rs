//! Tie group detection over category probabilities

use crate::types::QuizError;

/// Candidates whose probability is within `threshold` of the best candidate
///
/// The maximum is taken over `candidates` only. Inclusive: a gap equal to the
/// threshold still ties, so threshold 0 keeps exact maxima. Candidate order
/// is preserved.
pub fn resolve_tie_group<F>(
    threshold: f64,
    candidates: &[String],
    probability_of: F,
) -> Result<Vec<String>, QuizError>
where
    F: Fn(&str) -> Option<f64>,
{
    let mut scored = Vec::with_capacity(candidates.len());
    for name in candidates {
        let p = probability_of(name).ok_or_else(|| QuizError::UnknownCategory(name.clone()))?;
        scored.push((name, p));
    }

    let max = scored.iter().map(|(_, p)| *p).fold(f64::NEG_INFINITY, f64::max);

    Ok(scored
        .into_iter()
        .filter(|(_, p)| max - p <= threshold)
        .map(|(name, _)| name.clone())
        .collect())
}

// =============================================================================
// TESTS
// =============================================================================
