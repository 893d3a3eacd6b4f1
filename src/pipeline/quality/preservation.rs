use crate::models::{CaseBundle, DimensionScore};
use crate::pipeline::segmentation::domain::MEDICAL_KEYWORDS;

use super::NEUTRAL_COMPONENT;

const COVERAGE_WEIGHT: f64 = 0.5;
const STRUCTURE_WEIGHT: f64 = 0.2;
const KEYWORD_WEIGHT: f64 = 0.3;

/// Share of the document's non-whitespace characters that some segment covers.
pub fn coverage(bundle: &CaseBundle) -> f64 {
    let text = &bundle.original_text;
    let mut spans: Vec<(usize, usize)> = bundle
        .segments
        .iter()
        .map(|s| (s.position.start.min(text.len()), s.position.end.min(text.len())))
        .collect();
    spans.sort_unstable();

    let mut covered = 0usize;
    let mut reach = 0usize;
    for (start, end) in spans {
        let start = start.max(reach);
        if start < end && text.is_char_boundary(start) && text.is_char_boundary(end) {
            covered += text[start..end].chars().filter(|c| !c.is_whitespace()).count();
        }
        reach = reach.max(end);
    }
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Rough count of structural elements: non-empty lines.
pub fn structural_estimate(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count().max(1)
}

/// Fraction of the medical keywords in the document that survive in segment text.
pub fn keyword_overlap(bundle: &CaseBundle) -> f64 {
    let present: Vec<&str> = MEDICAL_KEYWORDS
        .iter()
        .copied()
        .filter(|k| bundle.original_text.contains(k))
        .collect();
    if present.is_empty() {
        return NEUTRAL_COMPONENT;
    }
    let kept = present
        .iter()
        .filter(|k| bundle.segments.iter().any(|s| s.text.contains(*k)))
        .count();
    kept as f64 / present.len() as f64
}

pub fn score(bundle: &CaseBundle) -> DimensionScore {
    let elements = (bundle.segments.len() + bundle.entities.len()) as f64;
    let structure = elements / structural_estimate(&bundle.original_text) as f64;
    DimensionScore::weighted(&[
        ("coverage", coverage(bundle), COVERAGE_WEIGHT),
        ("structure", structure.min(1.0), STRUCTURE_WEIGHT),
        ("keywordOverlap", keyword_overlap(bundle), KEYWORD_WEIGHT),
    ])
}
