//! Pairwise relation discovery between extracted entities.

use crate::models::{Entity, EntityRelation, EntityType, RelationDirection, RelationType, Segment};
use crate::pipeline::text::{char_distance, clamp_unit};

/// A typed co-occurrence rule. The relation is recorded forward on the
/// source entity and backward on the target.
#[derive(Debug, Clone, Copy)]
pub struct RelationRule {
    pub source: EntityType,
    pub target: EntityType,
    pub relation: RelationType,
    /// Maximum gap between the two spans, in characters.
    pub max_chars: usize,
    pub confidence: f64,
}

pub const RELATION_RULES: &[RelationRule] = &[
    RelationRule {
        source: EntityType::Diagnosis,
        target: EntityType::Medication,
        relation: RelationType::TreatedBy,
        max_chars: 200,
        confidence: 0.6,
    },
    RelationRule {
        source: EntityType::Diagnosis,
        target: EntityType::Procedure,
        relation: RelationType::AddressedBy,
        max_chars: 150,
        confidence: 0.6,
    },
    RelationRule {
        source: EntityType::Diagnosis,
        target: EntityType::Anatomy,
        relation: RelationType::LocatedAt,
        max_chars: 30,
        confidence: 0.7,
    },
    RelationRule {
        source: EntityType::Procedure,
        target: EntityType::Anatomy,
        relation: RelationType::LocatedAt,
        max_chars: 30,
        confidence: 0.7,
    },
    RelationRule {
        source: EntityType::Procedure,
        target: EntityType::Value,
        relation: RelationType::MeasuredBy,
        max_chars: 80,
        confidence: 0.5,
    },
];

/// Test every entity pair against [`RELATION_RULES`]; O(n²) in the entity
/// count. Returns the number of relations found.
pub fn discover_relations(entities: &mut [Entity], segments: &[Segment]) -> usize {
    let mut found: Vec<(usize, usize, RelationType, f64)> = Vec::new();

    for i in 0..entities.len() {
        for j in 0..entities.len() {
            if i == j {
                continue;
            }
            let (source, target) = (&entities[i], &entities[j]);
            let Some(rule) = RELATION_RULES
                .iter()
                .find(|r| r.source == source.entity_type && r.target == target.entity_type)
            else {
                continue;
            };
            let Some(distance) = gap_in_shared_segment(source, target, segments) else {
                continue;
            };
            if distance > rule.max_chars {
                continue;
            }
            let decay = 1.0 - 0.5 * distance as f64 / rule.max_chars.max(1) as f64;
            found.push((i, j, rule.relation, clamp_unit(rule.confidence * decay)));
        }
    }

    for (i, j, relation_type, confidence) in &found {
        let (source_id, target_id) = (entities[*i].id, entities[*j].id);
        entities[*i].relations.push(EntityRelation {
            target_id,
            relation_type: *relation_type,
            direction: RelationDirection::Forward,
            confidence: *confidence,
        });
        entities[*j].relations.push(EntityRelation {
            target_id: source_id,
            relation_type: *relation_type,
            direction: RelationDirection::Backward,
            confidence: *confidence,
        });
    }
    found.len()
}

/// Character gap between two entities, measured in the first segment that
/// contains both. Overlapping spans have gap 0.
fn gap_in_shared_segment(a: &Entity, b: &Entity, segments: &[Segment]) -> Option<usize> {
    let segment = segments
        .iter()
        .find(|s| s.position.contains(&a.position) && s.position.contains(&b.position))?;
    let base = segment.position.start;
    let (first, second) = if a.position.start <= b.position.start { (a, b) } else { (b, a) };
    if second.position.start <= first.position.end {
        return Some(0);
    }
    Some(char_distance(
        &segment.text,
        first.position.end - base,
        second.position.start - base,
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use uuid::Uuid;

    use super::*;
    use crate::models::{ContextType, Position, ValidationStatus};

    fn segment(text: &str) -> Segment {
        Segment {
            id: Uuid::from_u128(99),
            text: text.to_string(),
            source_index: 0,
            context_type: ContextType::General,
            medical_domain: None,
            confidence: 0.5,
            position: Position::new(0, text.len()),
            metadata: BTreeMap::new(),
        }
    }

    fn entity(id: u128, entity_type: EntityType, text: &str, haystack: &str) -> Entity {
        let start = haystack.find(text).unwrap();
        Entity {
            id: Uuid::from_u128(id),
            entity_type,
            subtype: "test".into(),
            text: text.into(),
            normalized_text: text.into(),
            value: None,
            unit: None,
            confidence: 0.8,
            position: Position::new(start, start + text.len()),
            segment_id: Uuid::from_u128(99),
            context: String::new(),
            attributes: BTreeMap::new(),
            relations: Vec::new(),
            evidence: Vec::new(),
            validation_status: ValidationStatus::Validated,
        }
    }

    #[test]
    fn medication_treats_diagnosis_bidirectionally() {
        let text = "위궤양 진단 후 오메프라졸 처방";
        let segments = vec![segment(text)];
        let mut entities = vec![
            entity(1, EntityType::Diagnosis, "위궤양", text),
            entity(2, EntityType::Medication, "오메프라졸", text),
        ];
        assert_eq!(discover_relations(&mut entities, &segments), 1);

        let forward = &entities[0].relations[0];
        assert_eq!(forward.target_id, Uuid::from_u128(2));
        assert_eq!(forward.relation_type, RelationType::TreatedBy);
        assert_eq!(forward.direction, RelationDirection::Forward);

        let backward = &entities[1].relations[0];
        assert_eq!(backward.target_id, Uuid::from_u128(1));
        assert_eq!(backward.direction, RelationDirection::Backward);
        assert!(forward.confidence > 0.5 && forward.confidence <= 0.6);
    }

    #[test]
    fn distant_pair_not_related() {
        let text = format!("위궤양 진단. {} 우측 무릎", "경과 관찰 중. ".repeat(10));
        let segments = vec![segment(&text)];
        let mut entities = vec![
            entity(1, EntityType::Diagnosis, "위궤양", &text),
            entity(2, EntityType::Anatomy, "무릎", &text),
        ];
        assert_eq!(discover_relations(&mut entities, &segments), 0);
        assert!(entities.iter().all(|e| e.relations.is_empty()));
    }

    #[test]
    fn unrelated_types_not_related() {
        let text = "오메프라졸 20mg 혈당 126 mg/dL";
        let segments = vec![segment(text)];
        let mut entities = vec![
            entity(1, EntityType::Medication, "오메프라졸", text),
            entity(2, EntityType::Value, "혈당 126 mg/dL", text),
        ];
        assert_eq!(discover_relations(&mut entities, &segments), 0);
    }

    #[test]
    fn entities_in_different_segments_not_related() {
        let first = "위궤양 진단 받음";
        let second = "오메프라졸 처방";
        let mut seg_b = segment(second);
        seg_b.position = Position::new(100, 100 + second.len());
        let segments = vec![segment(first), seg_b];
        let mut entities = vec![entity(1, EntityType::Diagnosis, "위궤양", first), {
            let mut e = entity(2, EntityType::Medication, "오메프라졸", second);
            e.position = e.position.offset(100);
            e
        }];
        assert_eq!(discover_relations(&mut entities, &segments), 0);
    }
}
