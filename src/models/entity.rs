use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{EntityType, RelationDirection, RelationType, ValidationStatus};
use super::evidence::Evidence;
use super::segment::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelation {
    pub target_id: Uuid,
    pub relation_type: RelationType,
    pub direction: RelationDirection,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Pattern-specific refinement, e.g. `kcd_code`, `dosage`, `blood_pressure`.
    pub subtype: String,
    pub text: String,
    pub normalized_text: String,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub confidence: f64,
    /// Byte span in the original document.
    pub position: Position,
    pub segment_id: Uuid,
    /// Surrounding text (a few dozen characters either side).
    pub context: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub relations: Vec<EntityRelation>,
    pub evidence: Vec<Evidence>,
    pub validation_status: ValidationStatus,
}

impl Entity {
    /// Exact-duplicate key.
    pub fn dedup_key(&self) -> (EntityType, &str, usize) {
        (self.entity_type, self.normalized_text.as_str(), self.position.start)
    }
}
