//! Quality stage: four 0..=25 dimensions summed into an overall score.

pub mod context_quality;
pub mod entity_quality;
pub mod preservation;
pub mod scorer;
pub mod temporal_quality;

pub use scorer::QualityScorer;

/// Component value when there is nothing to measure.
pub const NEUTRAL_COMPONENT: f64 = 0.5;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::EntityType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    #[error("Invalid reference annotations: {0}")]
    InvalidReference(String),

    #[error("Bundle is inconsistent: {0}")]
    InconsistentBundle(String),
}

/// Expected entity, compared on type and case-folded normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub normalized_text: String,
}

/// Hand-made expectations for one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceAnnotations {
    pub entities: Vec<ReferenceEntity>,
    pub dates: Vec<NaiveDate>,
}

impl ReferenceAnnotations {
    pub fn from_json_str(json: &str) -> Result<Self, QualityError> {
        let reference: Self =
            serde_json::from_str(json).map_err(|e| QualityError::InvalidReference(e.to_string()))?;
        reference.validate()?;
        Ok(reference)
    }

    pub fn validate(&self) -> Result<(), QualityError> {
        if let Some(blank) = self.entities.iter().find(|e| e.normalized_text.trim().is_empty()) {
            return Err(QualityError::InvalidReference(format!(
                "{} entity with empty normalizedText",
                blank.entity_type
            )));
        }
        Ok(())
    }
}

/// Metadata key holding implausible or future date warnings.
pub const DATE_WARNINGS_KEY: &str = "dateWarnings";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_parses_camel_case() {
        let reference = ReferenceAnnotations::from_json_str(
            r#"{"entities":[{"type":"diagnosis","normalizedText":"위궤양"}],"dates":["2024-03-15"]}"#,
        )
        .unwrap();
        assert_eq!(reference.entities[0].entity_type, EntityType::Diagnosis);
        assert_eq!(reference.dates, vec![NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()]);
    }

    #[test]
    fn blank_reference_entity_rejected() {
        let err = ReferenceAnnotations::from_json_str(r#"{"entities":[{"type":"value","normalizedText":" "}]}"#)
            .unwrap_err();
        assert!(matches!(err, QualityError::InvalidReference(_)));
    }

    #[test]
    fn missing_fields_default() {
        let reference = ReferenceAnnotations::from_json_str("{}").unwrap();
        assert!(reference.entities.is_empty());
        assert!(reference.dates.is_empty());
    }
}
