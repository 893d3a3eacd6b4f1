use chrono::{NaiveDate, Utc};
use tracing::debug;

use super::events::synthesize;
use super::expressions::{derive_reference, resolve_all, scan, ResolveContext};
use super::patterns::{compile_patterns, TemporalPattern};
use super::transforms::{run_transforms, transforms_for, EventTransform};
use super::types::TemporalOutput;
use super::TemporalError;
use crate::models::{Entity, Segment};
use crate::pipeline_config::PipelineConfig;

/// Temporal stage. Built once per pipeline; `normalize` is read-only.
pub struct TemporalNormalizer {
    patterns: Vec<TemporalPattern>,
    transforms: Vec<Box<dyn EventTransform>>,
    configured_reference: Option<NaiveDate>,
    future_tolerance_days: i64,
}

impl TemporalNormalizer {
    pub fn new(config: &PipelineConfig) -> Result<Self, TemporalError> {
        Ok(Self {
            patterns: compile_patterns()?,
            transforms: transforms_for(config),
            configured_reference: config.reference_date,
            future_tolerance_days: config.future_date_tolerance_days,
        })
    }

    pub fn normalize(
        &self,
        document: &str,
        segments: &[Segment],
        entities: &[Entity],
    ) -> Result<TemporalOutput, TemporalError> {
        self.normalize_at(document, segments, entities, Utc::now().date_naive())
    }

    /// Same as [`normalize`](Self::normalize) with an explicit processing date.
    pub fn normalize_at(
        &self,
        document: &str,
        segments: &[Segment],
        entities: &[Entity],
        today: NaiveDate,
    ) -> Result<TemporalOutput, TemporalError> {
        for entity in entities {
            if entity.position.end > document.len() || entity.position.is_empty() {
                return Err(TemporalError::EntityOutOfBounds {
                    entity: entity.id,
                    start: entity.position.start,
                    end: entity.position.end,
                    len: document.len(),
                });
            }
        }

        let raw = scan(&self.patterns, segments);
        let (reference_date, reference_source) = derive_reference(&raw, self.configured_reference, today);
        debug!(
            expressions = raw.len(),
            reference = %reference_date,
            source = ?reference_source,
            "Derived reference date"
        );
        let ctx = ResolveContext {
            reference: reference_date,
            today,
            future_tolerance_days: self.future_tolerance_days,
        };
        let expressions = resolve_all(raw, &ctx);

        let events = synthesize(document, segments, entities, &expressions)?;
        let events = run_transforms(&self.transforms, events);
        debug!(
            events = events.len(),
            dated = events.iter().filter(|e| e.is_dated()).count(),
            "Temporal normalization complete"
        );

        Ok(TemporalOutput {
            events,
            expressions,
            reference_date,
            reference_source,
        })
    }
}
