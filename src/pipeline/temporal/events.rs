//! Event synthesis: one event per entity, dated through its nearest link.

use std::collections::{BTreeMap, HashMap};

use serde_json::json;
use uuid::Uuid;

use super::linking::{link, nearby_frequency};
use super::types::TemporalExpression;
use super::TemporalError;
use crate::models::{Entity, EntityType, Event, Evidence, EvidenceType, Segment};
use crate::pipeline::text::{clamp_unit, content_id};

/// Frequency expressions further than this from a medication are ignored.
pub const FREQUENCY_WINDOW_CHARS: usize = 30;

pub const EVENT_SOURCE: &str = "temporal_normalizer";

pub fn evidence_record(
    owner: Uuid,
    ordinal: usize,
    evidence_type: EvidenceType,
    content: String,
    position: Option<crate::models::Position>,
    confidence: f64,
    claim: String,
) -> Evidence {
    Evidence {
        id: content_id("evidence", &[&owner.to_string(), &ordinal.to_string()]),
        evidence_type,
        source: EVENT_SOURCE.to_string(),
        content,
        position,
        confidence: clamp_unit(confidence),
        supported_claim: claim,
    }
}

pub fn synthesize(
    document: &str,
    segments: &[Segment],
    entities: &[Entity],
    expressions: &[TemporalExpression],
) -> Result<Vec<Event>, TemporalError> {
    let by_id: HashMap<Uuid, &Segment> = segments.iter().map(|s| (s.id, s)).collect();
    let mut events = Vec::with_capacity(entities.len());

    for entity in entities {
        let segment = by_id
            .get(&entity.segment_id)
            .copied()
            .ok_or(TemporalError::UnknownSegment { entity: entity.id, segment: entity.segment_id })?;
        let id = content_id("event", &[&entity.id.to_string()]);
        let mut attributes = BTreeMap::new();
        attributes.insert("segmentId".to_string(), json!(entity.segment_id));
        let mut evidence = Vec::new();

        let temporal = link(document, entity, segment, expressions);
        let (date, normalized_date, date_confidence) = match &temporal {
            Some(found) => {
                let expr = found.expression;
                attributes.insert("linkConfidence".into(), json!(found.confidence));
                attributes.insert("linkScope".into(), json!(found.scope.as_str()));
                attributes.insert("linkDistance".into(), json!(found.distance));
                attributes.insert("temporalKind".into(), json!(expr.kind.as_str()));
                attributes.insert("temporalExpressionId".into(), json!(expr.id));
                if let Some(reason) = expr.invalid_reason() {
                    attributes.insert("invalid_reason".into(), json!(reason));
                }
                if expr.is_future() {
                    attributes.insert("future_date".into(), json!(true));
                }
                evidence.push(evidence_record(
                    id,
                    evidence.len(),
                    EvidenceType::Rule,
                    format!("temporal_link: {} ({} chars, {})", expr.text, found.distance, found.scope.as_str()),
                    Some(expr.position),
                    found.confidence,
                    format!("{} occurred on {}", entity.normalized_text, expr.text),
                ));
                let confidence = if expr.resolved.is_some() { expr.confidence } else { 0.0 };
                (Some(expr.text.clone()), expr.resolved, confidence)
            }
            None => (None, None, 0.0),
        };

        if entity.entity_type == EntityType::Medication {
            if let Some(freq) = nearby_frequency(document, entity, expressions, FREQUENCY_WINDOW_CHARS) {
                if let Some(per_day) = freq.attributes.get("perDay") {
                    attributes.insert("frequencyPerDay".into(), per_day.clone());
                }
                evidence.push(evidence_record(
                    id,
                    evidence.len(),
                    EvidenceType::Textual,
                    format!("frequency: {}", freq.text),
                    Some(freq.position),
                    freq.confidence,
                    format!("{} dosing schedule", entity.normalized_text),
                ));
            }
        }

        events.push(Event {
            id,
            event_type: format!("{}:{}", entity.entity_type.as_str(), entity.subtype),
            date,
            normalized_date,
            date_confidence: clamp_unit(date_confidence),
            description: format!("{} {}", entity.entity_type.as_str(), entity.text),
            entities: vec![entity.id],
            position: entity.position,
            evidence,
            temporal_relations: Vec::new(),
            attributes,
        });
    }
    Ok(events)
}
