use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum points a single dimension contributes to the overall score.
pub const DIMENSION_MAX: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGate {
    Rigorous,
    Standard,
    Draft,
    Insufficient,
}

impl QualityGate {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Rigorous
        } else if score >= 70.0 {
            Self::Standard
        } else if score >= 50.0 {
            Self::Draft
        } else {
            Self::Insufficient
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rigorous => "rigorous",
            Self::Standard => "standard",
            Self::Draft => "draft",
            Self::Insufficient => "insufficient",
        }
    }
}

/// One scoring dimension, 0..=25, with the sub-scores that produced it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub score: f64,
    pub components: BTreeMap<String, f64>,
}

impl DimensionScore {
    /// Build a dimension from weighted unit-interval components.
    pub fn weighted(components: &[(&str, f64, f64)]) -> Self {
        let mut map = BTreeMap::new();
        let mut total = 0.0;
        for (name, value, weight) in components {
            let value = value.clamp(0.0, 1.0);
            total += value * weight;
            map.insert((*name).to_string(), value);
        }
        Self {
            score: (total * DIMENSION_MAX).clamp(0.0, DIMENSION_MAX),
            components: map,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub information_preservation: DimensionScore,
    pub entity_extraction: DimensionScore,
    pub temporal_normalization: DimensionScore,
    pub contextual_classification: DimensionScore,
}

impl QualityBreakdown {
    pub fn total(&self) -> f64 {
        self.information_preservation.score
            + self.entity_extraction.score
            + self.temporal_normalization.score
            + self.contextual_classification.score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub overall_score: f64,
    pub breakdown: QualityBreakdown,
    pub quality_gate: QualityGate,
    pub diagnostics: Vec<String>,
    pub reference_used: bool,
}

impl QualityReport {
    /// Report for a document with no content.
    pub fn empty() -> Self {
        Self {
            overall_score: 0.0,
            breakdown: QualityBreakdown::default(),
            quality_gate: QualityGate::Insufficient,
            diagnostics: vec!["document is empty".to_string()],
            reference_used: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_ladder_boundaries() {
        assert_eq!(QualityGate::from_score(100.0), QualityGate::Rigorous);
        assert_eq!(QualityGate::from_score(85.0), QualityGate::Rigorous);
        assert_eq!(QualityGate::from_score(84.99), QualityGate::Standard);
        assert_eq!(QualityGate::from_score(70.0), QualityGate::Standard);
        assert_eq!(QualityGate::from_score(50.0), QualityGate::Draft);
        assert_eq!(QualityGate::from_score(49.9), QualityGate::Insufficient);
        assert_eq!(QualityGate::from_score(0.0), QualityGate::Insufficient);
    }

    #[test]
    fn weighted_dimension_clamps_components() {
        let dim = DimensionScore::weighted(&[("a", 2.0, 0.5), ("b", -1.0, 0.5)]);
        assert!((dim.score - 12.5).abs() < 1e-9);
        assert_eq!(dim.components["a"], 1.0);
        assert_eq!(dim.components["b"], 0.0);
    }

    #[test]
    fn gate_serializes_snake_case() {
        let json = serde_json::to_string(&QualityGate::Insufficient).unwrap();
        assert_eq!(json, "\"insufficient\"");
        assert_eq!(QualityGate::Draft.as_str(), "draft");
    }
}
