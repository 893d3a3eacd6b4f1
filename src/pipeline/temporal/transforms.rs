//! Pass-through event transforms run after synthesis.
//!
//! The list is fixed at construction from configuration flags. Each
//! transform takes the whole event list and returns it, possibly unchanged.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::causal::CausalAnalysis;
use super::events::evidence_record;
use crate::models::{Event, EvidenceType};
use crate::pipeline_config::PipelineConfig;

pub trait EventTransform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, events: Vec<Event>) -> Vec<Event>;
}

/// Inference (optional), timeline ordering, causal analysis (optional).
pub fn transforms_for(config: &PipelineConfig) -> Vec<Box<dyn EventTransform>> {
    let mut list: Vec<Box<dyn EventTransform>> = Vec::new();
    if config.enable_temporal_inference && config.max_inference_depth > 0 {
        list.push(Box::new(SequenceInference { max_depth: config.max_inference_depth }));
    }
    list.push(Box::new(TimelineOrdering));
    if config.enable_causal_analysis {
        list.push(Box::new(CausalAnalysis));
    }
    list
}

pub fn run_transforms(transforms: &[Box<dyn EventTransform>], events: Vec<Event>) -> Vec<Event> {
    transforms.iter().fold(events, |events, transform| {
        let events = transform.apply(events);
        debug!(transform = transform.name(), events = events.len(), "Applied event transform");
        events
    })
}

fn segment_of(event: &Event) -> Option<&str> {
    event.attributes.get("segmentId").and_then(|v| v.as_str())
}

// ───────────────────────────────────────────────────────────
// Sequence inference
// ───────────────────────────────────────────────────────────

/// Confidence multiplier for a date borrowed from a neighbour.
pub const INFERENCE_DECAY: f64 = 0.5;

/// Undated events borrow the date of an adjacent dated event in the same
/// segment. One hop per pass, at most `max_depth` passes.
pub struct SequenceInference {
    pub max_depth: u32,
}

impl EventTransform for SequenceInference {
    fn name(&self) -> &'static str {
        "sequence_inference"
    }

    fn apply(&self, mut events: Vec<Event>) -> Vec<Event> {
        let mut order: Vec<usize> = (0..events.len()).collect();
        order.sort_by_key(|&i| (events[i].position.start, events[i].position.end));

        for pass in 1..=self.max_depth {
            let snapshot: Vec<(Option<chrono::NaiveDate>, Option<String>, f64, Uuid)> = events
                .iter()
                .map(|e| (e.normalized_date, e.date.clone(), e.date_confidence, e.id))
                .collect();
            let mut changed = 0usize;

            for (rank, &i) in order.iter().enumerate() {
                if snapshot[i].0.is_some() {
                    continue;
                }
                let Some(segment) = segment_of(&events[i]).map(str::to_owned) else {
                    continue;
                };
                let same_segment = |j: usize| segment_of(&events[j]) == Some(segment.as_str());
                let previous = rank.checked_sub(1).map(|r| order[r]).filter(|&j| same_segment(j));
                let next = order.get(rank + 1).copied().filter(|&j| same_segment(j));
                let Some(source) = [previous, next]
                    .into_iter()
                    .flatten()
                    .find(|&j| snapshot[j].0.is_some())
                else {
                    continue;
                };

                let (date, text, confidence, source_id) = snapshot[source].clone();
                let event = &mut events[i];
                event.normalized_date = date;
                event.date = text;
                event.date_confidence = confidence * INFERENCE_DECAY;
                event.attributes.insert("inferred".into(), json!(true));
                event.attributes.insert("inferredFrom".into(), json!(source_id));
                event.attributes.insert("inferenceDepth".into(), json!(pass));
                let ordinal = event.evidence.len();
                event.evidence.push(evidence_record(
                    event.id,
                    ordinal,
                    EvidenceType::Inference,
                    format!("date borrowed from adjacent event {source_id}"),
                    None,
                    event.date_confidence,
                    format!("{} shares the date of its neighbour", event.description),
                ));
                changed += 1;
            }
            debug!(pass, inferred = changed, "Sequence inference pass");
            if changed == 0 {
                break;
            }
        }
        events
    }
}

// ───────────────────────────────────────────────────────────
// Timeline ordering
// ───────────────────────────────────────────────────────────

/// Stable sort by date; undated events trail.
pub struct TimelineOrdering;

impl EventTransform for TimelineOrdering {
    fn name(&self) -> &'static str {
        "timeline_ordering"
    }

    fn apply(&self, mut events: Vec<Event>) -> Vec<Event> {
        events.sort_by_key(|e| (e.normalized_date.is_none(), e.normalized_date));
        events
    }
}

/// Index of the first event out of timeline order, if any.
pub fn first_out_of_order(events: &[Event]) -> Option<usize> {
    let mut seen_undated = false;
    let mut last = None;
    for (i, event) in events.iter().enumerate() {
        match event.normalized_date {
            None => seen_undated = true,
            Some(date) => {
                if seen_undated || last.is_some_and(|prev| prev > date) {
                    return Some(i);
                }
                last = Some(date);
            }
        }
    }
    None
}
