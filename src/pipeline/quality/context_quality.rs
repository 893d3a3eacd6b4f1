use crate::models::{CaseBundle, ContextType, DimensionScore};
use crate::pipeline::text::char_len;

use super::NEUTRAL_COMPONENT;

const REGULARITY_WEIGHT: f64 = 0.3;
const CONTEXT_WEIGHT: f64 = 0.35;
const DOMAIN_WEIGHT: f64 = 0.35;

/// One minus the coefficient of variation of segment lengths.
pub fn regularity(lengths: &[usize]) -> f64 {
    if lengths.len() < 2 {
        return if lengths.is_empty() { 0.0 } else { NEUTRAL_COMPONENT };
    }
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<usize>() as f64 / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = lengths.iter().map(|&l| (l as f64 - mean).powi(2)).sum::<f64>() / n;
    1.0 - variance.sqrt() / mean
}

pub fn score(bundle: &CaseBundle) -> DimensionScore {
    let segments = &bundle.segments;
    let lengths: Vec<usize> = segments.iter().map(|s| char_len(&s.text)).collect();
    let (typed, with_domain) = if segments.is_empty() {
        (0.0, 0.0)
    } else {
        let n = segments.len() as f64;
        (
            segments.iter().filter(|s| s.context_type != ContextType::General).count() as f64 / n,
            segments.iter().filter(|s| s.medical_domain.is_some()).count() as f64 / n,
        )
    };
    DimensionScore::weighted(&[
        ("lengthRegularity", regularity(&lengths), REGULARITY_WEIGHT),
        ("contextTyped", typed, CONTEXT_WEIGHT),
        ("domainAssigned", with_domain, DOMAIN_WEIGHT),
    ])
}
