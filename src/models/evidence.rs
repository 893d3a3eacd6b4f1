use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::EvidenceType;
use super::segment::Position;

/// Justification record attached to an entity or event when it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    /// Component that produced the record, e.g. `entity_extractor`.
    pub source: String,
    pub content: String,
    pub position: Option<Position>,
    pub confidence: f64,
    pub supported_claim: String,
}
