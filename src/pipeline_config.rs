//! Pipeline configuration record.
//!
//! One flat record drives all four stages. Every field has a default, so a
//! partial JSON record (or none at all) resolves through `Default`. That is the only
//! rule for missing options. Validation runs once, when the pipeline is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════
// Defaults
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_MIN_SEGMENT_LENGTH: usize = 20;
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 2000;
pub const DEFAULT_CONTEXT_WINDOW_SIZE: usize = 100;
pub const DEFAULT_MEDICAL_TERM_THRESHOLD: f64 = 0.3;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_MAX_INFERENCE_DEPTH: u32 = 3;
pub const DEFAULT_FUTURE_DATE_TOLERANCE_DAYS: i64 = 30;
pub const DEFAULT_MAX_DOCUMENT_LENGTH: usize = 5_000_000;

/// Upper bound on inference passes; deeper chains only dilute confidence.
const MAX_ALLOWED_INFERENCE_DEPTH: u32 = 16;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(String),

    #[error("minSegmentLength ({min}) must not exceed maxSegmentLength ({max})")]
    SegmentBounds { min: usize, max: usize },

    #[error("maxSegmentLength must be greater than zero")]
    ZeroMaxSegmentLength,

    #[error("{field} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f64 },

    #[error("maxInferenceDepth must be at most {max}, got {value}")]
    InferenceDepth { value: u32, max: u32 },

    #[error("futureDateToleranceDays must not be negative, got {0}")]
    NegativeTolerance(i64),

    #[error("maxDocumentLength must be greater than zero")]
    ZeroMaxDocumentLength,
}

/// Options recognised by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Segments shorter than this (in characters) are discarded.
    pub min_segment_length: usize,
    /// Fixed-length chunk size used when a window has no anchors.
    pub max_segment_length: usize,
    /// Characters of context kept on each side of an anchor.
    pub context_window_size: usize,
    /// Minimum keyword-coverage ratio for a medical domain to be assigned.
    pub medical_term_threshold: f64,
    /// Entities scoring below this confidence are dropped.
    pub confidence_threshold: f64,
    pub enable_temporal_inference: bool,
    pub enable_causal_analysis: bool,
    /// Number of propagation passes the sequence inference may run.
    pub max_inference_depth: u32,
    /// Anchor used when the document contains no absolute date.
    pub reference_date: Option<NaiveDate>,
    /// Resolved dates later than processing date + this many days are flagged.
    pub future_date_tolerance_days: i64,
    /// Documents whose joined text exceeds this many bytes are rejected.
    pub max_document_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_segment_length: DEFAULT_MIN_SEGMENT_LENGTH,
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            context_window_size: DEFAULT_CONTEXT_WINDOW_SIZE,
            medical_term_threshold: DEFAULT_MEDICAL_TERM_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            enable_temporal_inference: false,
            enable_causal_analysis: true,
            max_inference_depth: DEFAULT_MAX_INFERENCE_DEPTH,
            reference_date: None,
            future_date_tolerance_days: DEFAULT_FUTURE_DATE_TOLERANCE_DAYS,
            max_document_length: DEFAULT_MAX_DOCUMENT_LENGTH,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading & validation
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Parse a (possibly partial) JSON configuration record and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_segment_length == 0 {
            return Err(ConfigError::ZeroMaxSegmentLength);
        }
        if self.min_segment_length > self.max_segment_length {
            return Err(ConfigError::SegmentBounds {
                min: self.min_segment_length,
                max: self.max_segment_length,
            });
        }
        check_unit_interval("medicalTermThreshold", self.medical_term_threshold)?;
        check_unit_interval("confidenceThreshold", self.confidence_threshold)?;
        if self.max_inference_depth > MAX_ALLOWED_INFERENCE_DEPTH {
            return Err(ConfigError::InferenceDepth {
                value: self.max_inference_depth,
                max: MAX_ALLOWED_INFERENCE_DEPTH,
            });
        }
        if self.future_date_tolerance_days < 0 {
            return Err(ConfigError::NegativeTolerance(self.future_date_tolerance_days));
        }
        if self.max_document_length == 0 {
            return Err(ConfigError::ZeroMaxDocumentLength);
        }
        Ok(())
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { field, value });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
