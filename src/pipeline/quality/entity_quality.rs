use std::collections::{BTreeMap, HashSet};

use crate::models::quality::DIMENSION_MAX;
use crate::models::{CaseBundle, DimensionScore, EntityType};

use super::ReferenceAnnotations;

const CONFIDENCE_WEIGHT: f64 = 0.5;
const DIVERSITY_WEIGHT: f64 = 0.3;
const EVIDENCE_WEIGHT: f64 = 0.2;

/// Precision, recall and F1 on `(type, lowercased normalizedText)`.
pub fn against_reference(bundle: &CaseBundle, reference: &ReferenceAnnotations) -> DimensionScore {
    let extracted: HashSet<(EntityType, String)> = bundle
        .entities
        .iter()
        .map(|e| (e.entity_type, e.normalized_text.to_lowercase()))
        .collect();
    let expected: HashSet<(EntityType, String)> = reference
        .entities
        .iter()
        .map(|e| (e.entity_type, e.normalized_text.trim().to_lowercase()))
        .collect();

    let (precision, recall) = if expected.is_empty() && extracted.is_empty() {
        (1.0, 1.0)
    } else {
        let matched = extracted.intersection(&expected).count() as f64;
        let precision = if extracted.is_empty() { 0.0 } else { matched / extracted.len() as f64 };
        let recall = if expected.is_empty() { 0.0 } else { matched / expected.len() as f64 };
        (precision, recall)
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    DimensionScore {
        score: f1 * DIMENSION_MAX,
        components: BTreeMap::from([
            ("precision".to_string(), precision),
            ("recall".to_string(), recall),
            ("f1".to_string(), f1),
        ]),
    }
}

pub fn heuristic(bundle: &CaseBundle) -> DimensionScore {
    let entities = &bundle.entities;
    if entities.is_empty() {
        return DimensionScore::weighted(&[
            ("meanConfidence", 0.0, CONFIDENCE_WEIGHT),
            ("typeDiversity", 0.0, DIVERSITY_WEIGHT),
            ("evidencePresence", 0.0, EVIDENCE_WEIGHT),
        ]);
    }
    let n = entities.len() as f64;
    let mean = entities.iter().map(|e| e.confidence).sum::<f64>() / n;
    let types: HashSet<EntityType> = entities.iter().map(|e| e.entity_type).collect();
    let with_evidence = entities.iter().filter(|e| !e.evidence.is_empty()).count() as f64;
    DimensionScore::weighted(&[
        ("meanConfidence", mean, CONFIDENCE_WEIGHT),
        ("typeDiversity", types.len() as f64 / EntityType::all().len() as f64, DIVERSITY_WEIGHT),
        ("evidencePresence", with_evidence / n, EVIDENCE_WEIGHT),
    ])
}

pub fn score(bundle: &CaseBundle, reference: Option<&ReferenceAnnotations>) -> DimensionScore {
    match reference {
        Some(reference) => against_reference(bundle, reference),
        None => heuristic(bundle),
    }
}
