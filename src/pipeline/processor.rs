//! Document pipeline orchestrator.
//!
//! Single entry point that drives one document through the four stages:
//! segmentation → entity extraction → temporal normalization → quality
//! scoring, then assembles and validates the case bundle.
//!
//! Stages run strictly in sequence. Each stage is built once from the
//! configuration and is read-only afterwards, so one pipeline can serve
//! many documents concurrently.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::{APP_VERSION, LEXICON_VERSION};
use crate::models::{CaseBundle, Evidence, EvidenceType};
use crate::pipeline::entities::{EntityExtractor, ExtractionError};
use crate::pipeline::quality::{QualityError, QualityScorer, ReferenceAnnotations, DATE_WARNINGS_KEY};
use crate::pipeline::segmentation::{PageLayout, SegmentationError, Segmenter};
use crate::pipeline::temporal::{
    ReferenceSource, TemporalError, TemporalExpression, TemporalNormalizer, TemporalOutput,
};
use crate::pipeline::text::content_id;
use crate::pipeline_config::{ConfigError, PipelineConfig};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Configuration,
    Segmentation,
    EntityExtraction,
    TemporalNormalization,
    QualityScoring,
    Assembly,
    Orchestration,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Segmentation => "segmentation",
            Self::EntityExtraction => "entity_extraction",
            Self::TemporalNormalization => "temporal_normalization",
            Self::QualityScoring => "quality_scoring",
            Self::Assembly => "assembly",
            Self::Orchestration => "orchestration",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one failure a caller sees: which stage failed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{stage} stage failed: {message}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::new(PipelineStage::Configuration, e.to_string())
    }
}

impl From<SegmentationError> for PipelineError {
    fn from(e: SegmentationError) -> Self {
        Self::new(PipelineStage::Segmentation, e.to_string())
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(e: ExtractionError) -> Self {
        Self::new(PipelineStage::EntityExtraction, e.to_string())
    }
}

impl From<TemporalError> for PipelineError {
    fn from(e: TemporalError) -> Self {
        Self::new(PipelineStage::TemporalNormalization, e.to_string())
    }
}

impl From<QualityError> for PipelineError {
    fn from(e: QualityError) -> Self {
        Self::new(PipelineStage::QualityScoring, e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One document: its pages and an optional caller-chosen case id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentInput {
    pub case_id: Option<String>,
    pub pages: Vec<String>,
}

impl DocumentInput {
    pub fn new(case_id: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            case_id: Some(case_id.into()),
            pages,
        }
    }
}

impl From<&str> for DocumentInput {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl From<String> for DocumentInput {
    fn from(text: String) -> Self {
        Self {
            case_id: None,
            pages: vec![text],
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct MedicalDocumentPipeline {
    config: PipelineConfig,
    segmenter: Segmenter,
    extractor: EntityExtractor,
    normalizer: TemporalNormalizer,
    scorer: QualityScorer,
}

impl MedicalDocumentPipeline {
    /// Validate the configuration and compile every stage's tables.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            segmenter: Segmenter::new(&config)?,
            extractor: EntityExtractor::new(&config)?,
            normalizer: TemporalNormalizer::new(&config)?,
            scorer: QualityScorer::new(),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process(&self, input: DocumentInput) -> Result<CaseBundle, PipelineError> {
        self.process_with_reference(input, None)
    }

    pub fn process_with_reference(
        &self,
        input: DocumentInput,
        reference: Option<&ReferenceAnnotations>,
    ) -> Result<CaseBundle, PipelineError> {
        self.process_at(input, reference, Utc::now().date_naive())
    }

    /// Run the pipeline with an explicit processing date (used for relative
    /// dates without an anchor and for future-date checks).
    pub fn process_at(
        &self,
        input: DocumentInput,
        reference: Option<&ReferenceAnnotations>,
        today: NaiveDate,
    ) -> Result<CaseBundle, PipelineError> {
        let started = Instant::now();
        let case_id = input
            .case_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let layout = PageLayout::join(&input.pages);
        if layout.text.len() > self.config.max_document_length {
            let e = SegmentationError::DocumentTooLarge {
                len: layout.text.len(),
                max: self.config.max_document_length,
            };
            tracing::warn!(case_id = %case_id, stage = "segmentation", error = %e, "Stage failed");
            return Err(e.into());
        }

        tracing::info!(
            case_id = %case_id,
            pages = input.pages.len(),
            text_length = layout.text.len(),
            "Processing: starting pipeline"
        );

        // Stage 1: segmentation
        let segments = self.segmenter.segment_layout(&layout);
        tracing::debug!(case_id = %case_id, stage = "segmentation", segments = segments.len(), "Stage complete");

        // Stage 2: entity extraction
        let entities = self.extractor.extract(&segments);
        tracing::debug!(case_id = %case_id, stage = "entity_extraction", entities = entities.len(), "Stage complete");

        // Stage 3: temporal normalization
        let temporal = self
            .normalizer
            .normalize_at(&layout.text, &segments, &entities, today)
            .inspect_err(|e| tracing::warn!(case_id = %case_id, stage = "temporal_normalization", error = %e, "Stage failed"))?;
        tracing::debug!(case_id = %case_id, stage = "temporal_normalization", events = temporal.events.len(), "Stage complete");

        // Assembly
        let mut bundle = CaseBundle::empty(case_id.clone(), layout.text.clone());
        bundle.evidence = document_evidence(&layout.text, &temporal);
        bundle.metadata = base_metadata(input.pages.len(), &temporal);
        let TemporalOutput { events, .. } = temporal;
        bundle.segments = segments;
        bundle.entities = entities;
        bundle.events = events;

        let violations = bundle.violations();
        if !violations.is_empty() {
            tracing::warn!(case_id = %case_id, stage = "assembly", violations = violations.len(), "Bundle failed validation");
            return Err(PipelineError::new(PipelineStage::Assembly, violations.join("; ")));
        }

        // Stage 4: quality scoring
        let report = self
            .scorer
            .score(&bundle, reference)
            .inspect_err(|e| tracing::warn!(case_id = %case_id, stage = "quality_scoring", error = %e, "Stage failed"))?;
        bundle
            .metadata
            .insert("qualityGate".into(), json!(report.quality_gate.as_str()));
        bundle.apply_quality(report);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        bundle.metadata.insert("processingTimeMs".into(), json!(elapsed_ms));

        tracing::info!(
            case_id = %case_id,
            segments = bundle.segments.len(),
            entities = bundle.entities.len(),
            events = bundle.events.len(),
            quality = bundle.quality_score,
            elapsed_ms,
            "Processing complete"
        );
        Ok(bundle)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn base_metadata(page_count: usize, temporal: &TemporalOutput) -> BTreeMap<String, serde_json::Value> {
    let mut metadata = BTreeMap::new();
    metadata.insert("appVersion".to_string(), json!(APP_VERSION));
    metadata.insert("lexiconVersion".to_string(), json!(LEXICON_VERSION));
    metadata.insert("pageCount".to_string(), json!(page_count));
    metadata.insert("referenceDate".to_string(), json!(temporal.reference_date));
    metadata.insert("referenceSource".to_string(), json!(temporal.reference_source));
    metadata.insert("temporalExpressionCount".to_string(), json!(temporal.expressions.len()));

    let warnings: Vec<serde_json::Value> = temporal
        .expressions
        .iter()
        .filter_map(|expr| {
            let reason = expr
                .invalid_reason()
                .or_else(|| expr.is_future().then_some("future_date"))?;
            Some(json!({ "text": expr.text, "reason": reason, "position": expr.position }))
        })
        .collect();
    if !warnings.is_empty() {
        metadata.insert(DATE_WARNINGS_KEY.to_string(), json!(warnings));
    }
    metadata
}

/// Document-level evidence: how the reference date was chosen, and one
/// record per temporal expression found.
fn document_evidence(text: &str, temporal: &TemporalOutput) -> Vec<Evidence> {
    let owner = content_id("document", &[text]).to_string();
    let anchor = temporal
        .expressions
        .iter()
        .find(|e| e.resolved == Some(temporal.reference_date))
        .filter(|_| temporal.reference_source == ReferenceSource::Document);

    let mut records = vec![Evidence {
        id: content_id("evidence", &[&owner, "0"]),
        evidence_type: EvidenceType::Rule,
        source: "temporal_normalizer".to_string(),
        content: format!(
            "reference date {} from {}",
            temporal.reference_date,
            match temporal.reference_source {
                ReferenceSource::Document => "first absolute date in document",
                ReferenceSource::Configured => "configured referenceDate",
                ReferenceSource::Clock => "processing date",
            }
        ),
        position: anchor.map(|e| e.position),
        confidence: anchor.map_or(0.5, |e| e.confidence),
        supported_claim: "anchor for relative dates".to_string(),
    }];
    records.extend(
        temporal
            .expressions
            .iter()
            .enumerate()
            .map(|(i, expr)| expression_evidence(&owner, i + 1, expr)),
    );
    records
}

fn expression_evidence(owner: &str, ordinal: usize, expr: &TemporalExpression) -> Evidence {
    let outcome = match (expr.resolved, expr.invalid_reason()) {
        (Some(date), _) => date.to_string(),
        (None, Some(reason)) => format!("unresolved ({reason})"),
        (None, None) => "no date".to_string(),
    };
    Evidence {
        id: content_id("evidence", &[owner, &ordinal.to_string()]),
        evidence_type: EvidenceType::Pattern,
        source: "temporal_normalizer".to_string(),
        content: format!("{}/{}: {}", expr.kind.as_str(), expr.subtype, expr.text),
        position: Some(expr.position),
        confidence: expr.confidence,
        supported_claim: outcome,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
