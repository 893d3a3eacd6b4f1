//! Pairwise causal tagging between dated events.

use crate::models::{Event, RelationDirection, TemporalRelation, TemporalRelationType};
use crate::pipeline::text::clamp_unit;

use super::transforms::EventTransform;

pub struct CausalRule {
    pub source_prefix: &'static str,
    pub target_prefix: &'static str,
    pub relation: TemporalRelationType,
    /// Largest source-to-target gap, in days.
    pub window_days: i64,
    pub confidence: f64,
}

/// Checked in order; the first matching rule tags the pair.
pub const CAUSAL_RULES: &[CausalRule] = &[
    CausalRule {
        source_prefix: "diagnosis",
        target_prefix: "procedure",
        relation: TemporalRelationType::LeadsTo,
        window_days: 365,
        confidence: 0.6,
    },
    CausalRule {
        source_prefix: "diagnosis",
        target_prefix: "medication",
        relation: TemporalRelationType::TreatedBy,
        window_days: 180,
        confidence: 0.6,
    },
    CausalRule {
        source_prefix: "procedure",
        target_prefix: "medication",
        relation: TemporalRelationType::FollowedBy,
        window_days: 90,
        confidence: 0.5,
    },
    CausalRule {
        source_prefix: "procedure",
        target_prefix: "value",
        relation: TemporalRelationType::EvaluatedBy,
        window_days: 30,
        confidence: 0.4,
    },
];

fn prefix(event: &Event) -> &str {
    event.event_type.split(':').next().unwrap_or_default()
}

pub struct CausalAnalysis;

impl EventTransform for CausalAnalysis {
    fn name(&self) -> &'static str {
        "causal_analysis"
    }

    fn apply(&self, mut events: Vec<Event>) -> Vec<Event> {
        let mut found: Vec<(usize, usize, &CausalRule, i64)> = Vec::new();
        for (i, source) in events.iter().enumerate() {
            let Some(source_date) = source.normalized_date else { continue };
            for (j, target) in events.iter().enumerate() {
                if i == j {
                    continue;
                }
                let Some(target_date) = target.normalized_date else { continue };
                let gap = (target_date - source_date).num_days();
                let rule = CAUSAL_RULES.iter().find(|r| {
                    r.source_prefix == prefix(source)
                        && r.target_prefix == prefix(target)
                        && (0..=r.window_days).contains(&gap)
                });
                if let Some(rule) = rule {
                    found.push((i, j, rule, gap));
                }
            }
        }

        for (i, j, rule, gap) in found {
            let confidence = clamp_unit(rule.confidence * (1.0 - 0.5 * gap as f64 / rule.window_days as f64));
            let (source_id, target_id) = (events[i].id, events[j].id);
            events[i].temporal_relations.push(TemporalRelation {
                target_id,
                relation_type: rule.relation,
                direction: RelationDirection::Forward,
                confidence,
                gap_days: gap,
            });
            events[j].temporal_relations.push(TemporalRelation {
                target_id: source_id,
                relation_type: rule.relation,
                direction: RelationDirection::Backward,
                confidence,
                gap_days: gap,
            });
        }
        events
    }
}
