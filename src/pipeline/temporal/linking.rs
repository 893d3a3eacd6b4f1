//! Entity-to-time linking.

use serde::{Deserialize, Serialize};

use super::types::TemporalExpression;
use crate::models::{Entity, Segment};
use crate::pipeline::text::{char_distance, clamp_unit};

pub const NEAR_CHARS: usize = 50;
pub const MID_CHARS: usize = 100;
const NEAR_CONFIDENCE: f64 = 0.9;
const MID_CONFIDENCE: f64 = 0.7;
const FAR_CONFIDENCE: f64 = 0.5;
const DOCUMENT_SCOPE_PENALTY: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    Segment,
    Document,
}

impl LinkScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Document => "document",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TemporalLink<'a> {
    pub expression: &'a TemporalExpression,
    /// Characters between the entity and the expression (0 when they touch).
    pub distance: usize,
    pub scope: LinkScope,
    pub confidence: f64,
}

/// Character gap between two spans in `document`.
pub fn gap(document: &str, a: (usize, usize), b: (usize, usize)) -> usize {
    if a.1 <= b.0 {
        char_distance(document, a.1, b.0)
    } else if b.1 <= a.0 {
        char_distance(document, b.1, a.0)
    } else {
        0
    }
}

fn link_confidence(distance: usize, scope: LinkScope) -> f64 {
    let base = if distance < NEAR_CHARS {
        NEAR_CONFIDENCE
    } else if distance < MID_CHARS {
        MID_CONFIDENCE
    } else {
        FAR_CONFIDENCE
    };
    match scope {
        LinkScope::Segment => base,
        LinkScope::Document => clamp_unit(base - DOCUMENT_SCOPE_PENALTY),
    }
}

fn nearest<'a>(
    document: &str,
    entity: &Entity,
    candidates: impl Iterator<Item = &'a TemporalExpression>,
) -> Option<(&'a TemporalExpression, usize)> {
    let span = (entity.position.start, entity.position.end);
    candidates
        .map(|expr| {
            let distance = gap(document, span, (expr.position.start, expr.position.end));
            (expr, distance)
        })
        // Ties go to the expression written before the entity.
        .min_by_key(|(expr, distance)| (*distance, expr.position.start > entity.position.start, expr.position.start))
}

/// Nearest dated expression for `entity`: first inside its own segment,
/// then anywhere in the document.
pub fn link<'a>(
    document: &str,
    entity: &Entity,
    segment: &Segment,
    expressions: &'a [TemporalExpression],
) -> Option<TemporalLink<'a>> {
    let dated = || expressions.iter().filter(|e| e.kind.is_dated());
    let in_segment = nearest(document, entity, dated().filter(|e| segment.position.contains(&e.position)))
        .map(|found| (found, LinkScope::Segment));
    let (found, scope) = match in_segment {
        Some(hit) => hit,
        None => (nearest(document, entity, dated())?, LinkScope::Document),
    };
    let (expression, distance) = found;
    Some(TemporalLink {
        expression,
        distance,
        scope,
        confidence: link_confidence(distance, scope),
    })
}

/// Frequency expression close enough to annotate a medication.
pub fn nearby_frequency<'a>(
    document: &str,
    entity: &Entity,
    expressions: &'a [TemporalExpression],
    max_chars: usize,
) -> Option<&'a TemporalExpression> {
    nearest(document, entity, expressions.iter().filter(|e| !e.kind.is_dated()))
        .filter(|(_, distance)| *distance <= max_chars)
        .map(|(expr, _)| expr)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{ContextType, EntityType, Position, ValidationStatus};
    use crate::pipeline::temporal::types::TemporalKind;
    use crate::pipeline::text::content_id;

    fn expr(text: &str, start: usize, kind: TemporalKind, segment_id: uuid::Uuid) -> TemporalExpression {
        TemporalExpression {
            id: content_id("temporal", &[text, &start.to_string()]),
            kind,
            subtype: "test".into(),
            text: text.into(),
            position: Position::new(start, start + text.len()),
            segment_id,
            resolved: None,
            resolved_end: None,
            confidence: 0.7,
            attributes: BTreeMap::new(),
        }
    }

    fn entity(start: usize, end: usize, segment_id: uuid::Uuid) -> Entity {
        Entity {
            id: content_id("entity", &[&start.to_string()]),
            entity_type: EntityType::Diagnosis,
            subtype: "dictionary".into(),
            text: "x".into(),
            normalized_text: "x".into(),
            value: None,
            unit: None,
            confidence: 0.8,
            position: Position::new(start, end),
            segment_id,
            context: String::new(),
            attributes: BTreeMap::new(),
            relations: Vec::new(),
            evidence: Vec::new(),
            validation_status: ValidationStatus::Plausible,
        }
    }

    fn segment(start: usize, end: usize) -> Segment {
        Segment {
            id: content_id("segment", &[&start.to_string(), &end.to_string()]),
            text: String::new(),
            source_index: 0,
            context_type: ContextType::General,
            medical_domain: None,
            confidence: 0.5,
            position: Position::new(start, end),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn gap_is_zero_for_overlap() {
        let doc = "a".repeat(100);
        assert_eq!(gap(&doc, (10, 20), (15, 30)), 0);
        assert_eq!(gap(&doc, (10, 20), (25, 30)), 5);
        assert_eq!(gap(&doc, (25, 30), (10, 20)), 5);
    }

    #[test]
    fn prefers_in_segment_expression() {
        let doc = "a".repeat(400);
        let seg = segment(100, 300);
        let other = segment(0, 100);
        let exprs = vec![
            expr("2024-01-01", 95, TemporalKind::Absolute, other.id),
            expr("2024-02-01", 200, TemporalKind::Absolute, seg.id),
        ];
        let e = entity(110, 115, seg.id);
        let link = link(&doc, &e, &seg, &exprs).unwrap();
        assert_eq!(link.expression.text, "2024-02-01");
        assert_eq!(link.scope, LinkScope::Segment);
        assert!((link.confidence - 0.7).abs() < 1e-9, "85 chars away");
    }

    #[test]
    fn falls_back_to_document_with_penalty() {
        let doc = "a".repeat(400);
        let seg = segment(100, 300);
        let other = segment(0, 100);
        let exprs = vec![expr("2024-01-01", 80, TemporalKind::Absolute, other.id)];
        let e = entity(110, 115, seg.id);
        let link = link(&doc, &e, &seg, &exprs).unwrap();
        assert_eq!(link.scope, LinkScope::Document);
        assert_eq!(link.distance, 20);
        assert!((link.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn tie_goes_to_preceding_expression() {
        let doc = "a".repeat(200);
        let seg = segment(0, 200);
        let exprs = vec![
            expr("2024-03-01", 120, TemporalKind::Absolute, seg.id),
            expr("2024-02-01", 80, TemporalKind::Absolute, seg.id),
        ];
        // entity 100..110: 10 chars to each
        let e = entity(100, 110, seg.id);
        assert_eq!(link(&doc, &e, &seg, &exprs).unwrap().expression.text, "2024-02-01");
    }

    #[test]
    fn frequency_is_never_a_date_link() {
        let doc = "a".repeat(100);
        let seg = segment(0, 100);
        let exprs = vec![expr("1일 3회", 20, TemporalKind::Frequency, seg.id)];
        let e = entity(10, 15, seg.id);
        assert!(link(&doc, &e, &seg, &exprs).is_none());
        assert!(nearby_frequency(&doc, &e, &exprs, 30).is_some());
        assert!(nearby_frequency(&doc, &e, &exprs, 2).is_none());
    }

    #[test]
    fn distance_counts_characters_not_bytes() {
        let doc = "가".repeat(100);
        // 10 Hangul chars = 30 bytes between the spans.
        assert_eq!(gap(&doc, (0, 30), (60, 90)), 10);
    }
}
