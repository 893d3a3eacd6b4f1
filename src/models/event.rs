use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{RelationDirection, TemporalRelationType};
use super::evidence::Evidence;
use super::segment::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalRelation {
    pub target_id: Uuid,
    pub relation_type: TemporalRelationType,
    pub direction: RelationDirection,
    pub confidence: f64,
    pub gap_days: i64,
}

/// An entity anchored (or not) to a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    /// `<entity type>:<subtype>`, e.g. `diagnosis:korean_suffix`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Raw temporal expression the event was linked to.
    pub date: Option<String>,
    pub normalized_date: Option<NaiveDate>,
    pub date_confidence: f64,
    pub description: String,
    pub entities: Vec<Uuid>,
    pub position: Position,
    pub evidence: Vec<Evidence>,
    pub temporal_relations: Vec<TemporalRelation>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Event {
    pub fn is_dated(&self) -> bool {
        self.normalized_date.is_some()
    }
}
