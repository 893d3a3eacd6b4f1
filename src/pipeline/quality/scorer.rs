use tracing::debug;

use super::{context_quality, entity_quality, preservation, temporal_quality};
use super::{QualityError, ReferenceAnnotations, DATE_WARNINGS_KEY};
use crate::models::quality::DIMENSION_MAX;
use crate::models::{CaseBundle, DimensionScore, QualityBreakdown, QualityGate, QualityReport};

/// Dimensions below this share of their maximum are reported as weak.
const WEAK_DIMENSION_RATIO: f64 = 0.5;

/// Read-only scorer over an assembled bundle.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        bundle: &CaseBundle,
        reference: Option<&ReferenceAnnotations>,
    ) -> Result<QualityReport, QualityError> {
        if let Some(reference) = reference {
            reference.validate()?;
        }
        if bundle.original_text.trim().is_empty() {
            return Ok(QualityReport::empty());
        }
        check_spans(bundle)?;

        let breakdown = QualityBreakdown {
            information_preservation: preservation::score(bundle),
            entity_extraction: entity_quality::score(bundle, reference),
            temporal_normalization: temporal_quality::score(bundle, reference),
            contextual_classification: context_quality::score(bundle),
        };
        let overall_score = breakdown.total().clamp(0.0, 4.0 * DIMENSION_MAX);
        let diagnostics = diagnostics(bundle, &breakdown);
        debug!(
            case_id = %bundle.case_id,
            overall = overall_score,
            preservation = breakdown.information_preservation.score,
            entities = breakdown.entity_extraction.score,
            temporal = breakdown.temporal_normalization.score,
            context = breakdown.contextual_classification.score,
            "Quality scored"
        );

        Ok(QualityReport {
            overall_score,
            quality_gate: QualityGate::from_score(overall_score),
            breakdown,
            diagnostics,
            reference_used: reference.is_some(),
        })
    }
}

fn check_spans(bundle: &CaseBundle) -> Result<(), QualityError> {
    let text = &bundle.original_text;
    for segment in &bundle.segments {
        let p = segment.position;
        if p.end > text.len() || !text.is_char_boundary(p.start) || !text.is_char_boundary(p.end) {
            return Err(QualityError::InconsistentBundle(format!(
                "segment {} span {}..{} is not a character range of the document",
                segment.id, p.start, p.end
            )));
        }
    }
    Ok(())
}

fn diagnostics(bundle: &CaseBundle, breakdown: &QualityBreakdown) -> Vec<String> {
    let dimensions: [(&str, &DimensionScore); 4] = [
        ("information preservation", &breakdown.information_preservation),
        ("entity extraction", &breakdown.entity_extraction),
        ("temporal normalization", &breakdown.temporal_normalization),
        ("contextual classification", &breakdown.contextual_classification),
    ];
    let mut out: Vec<String> = dimensions
        .iter()
        .filter(|(_, d)| d.score < DIMENSION_MAX * WEAK_DIMENSION_RATIO)
        .map(|(name, d)| format!("{name} is weak ({:.1}/{DIMENSION_MAX})", d.score))
        .collect();

    if bundle.entities.is_empty() {
        out.push("no entities extracted".to_string());
    }
    let undated = bundle.events.iter().filter(|e| !e.is_dated()).count();
    if undated > 0 {
        out.push(format!("{undated} of {} events have no resolved date", bundle.events.len()));
    }
    if let Some(warnings) = bundle.metadata.get(DATE_WARNINGS_KEY).and_then(|v| v.as_array()) {
        for warning in warnings {
            let text = warning.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            match warning.get("reason").and_then(|v| v.as_str()) {
                Some("future_date") => out.push(format!("future date: {text}")),
                Some(reason) => out.push(format!("impossible date: {text} ({reason})")),
                None => {}
            }
        }
    }
    out
}
