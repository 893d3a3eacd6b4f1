use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::Entity;
use super::event::Event;
use super::evidence::Evidence;
use super::quality::QualityReport;
use super::segment::{Position, Segment};

/// Complete structured output for one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseBundle {
    pub case_id: String,
    pub original_text: String,
    pub segments: Vec<Segment>,
    pub entities: Vec<Entity>,
    /// Timeline order.
    pub events: Vec<Event>,
    /// Document-level evidence (reference date derivation and similar).
    pub evidence: Vec<Evidence>,
    pub quality_score: f64,
    pub quality_report: Option<QualityReport>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl CaseBundle {
    pub fn empty(case_id: impl Into<String>, original_text: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            original_text: original_text.into(),
            segments: Vec::new(),
            entities: Vec::new(),
            events: Vec::new(),
            evidence: Vec::new(),
            quality_score: 0.0,
            quality_report: None,
            metadata: BTreeMap::new(),
        }
    }

    /// The only post-assembly mutation.
    pub fn apply_quality(&mut self, report: QualityReport) {
        self.quality_score = report.overall_score;
        self.quality_report = Some(report);
    }

    pub fn entity(&self, id: &Uuid) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    pub fn segment(&self, id: &Uuid) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    /// Check the structural invariants of an assembled bundle.
    /// Returns one message per violation; an empty list means the bundle is sound.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        let text_len = self.original_text.len();

        for segment in &self.segments {
            if !span_sound(&segment.position, text_len) {
                out.push(format!("segment {} has span outside the document", segment.id));
            }
            if !unit(segment.confidence) {
                out.push(format!("segment {} confidence out of bounds", segment.id));
            }
            let source = self.original_text.get(segment.position.start..segment.position.end);
            if source != Some(segment.text.as_str()) {
                out.push(format!("segment {} text differs from its span", segment.id));
            }
        }

        for entity in &self.entities {
            if !span_sound(&entity.position, text_len) {
                out.push(format!("entity {} has span outside the document", entity.id));
            }
            let within = self
                .segment(&entity.segment_id)
                .is_some_and(|s| s.position.contains(&entity.position));
            if !within {
                out.push(format!("entity {} is not inside its segment", entity.id));
            }
            if !unit(entity.confidence) {
                out.push(format!("entity {} confidence out of bounds", entity.id));
            }
        }

        let entity_ids: HashSet<Uuid> = self.entities.iter().map(|e| e.id).collect();
        for event in &self.events {
            if let Some(missing) = event.entities.iter().find(|id| !entity_ids.contains(id)) {
                out.push(format!("event {} references unknown entity {missing}", event.id));
            }
            let within = self
                .segments
                .iter()
                .any(|s| s.position.contains(&event.position));
            if !within {
                out.push(format!("event {} is not inside any segment", event.id));
            }
            if !unit(event.date_confidence) {
                out.push(format!("event {} date confidence out of bounds", event.id));
            }
        }

        if !(0.0..=100.0).contains(&self.quality_score) {
            out.push(format!("quality score {} out of bounds", self.quality_score));
        }
        out
    }
}

fn span_sound(position: &Position, text_len: usize) -> bool {
    position.start < position.end && position.end <= text_len
}

fn unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
