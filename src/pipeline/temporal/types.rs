use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Event, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Absolute,
    Range,
    MedicalContextual,
    Relative,
    Frequency,
}

impl TemporalKind {
    /// Confidence before context and completeness adjustments.
    pub fn base_confidence(&self) -> f64 {
        match self {
            Self::Absolute => 0.70,
            Self::Range => 0.60,
            Self::MedicalContextual => 0.55,
            Self::Relative => 0.50,
            Self::Frequency => 0.30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Range => "range",
            Self::MedicalContextual => "medical_contextual",
            Self::Relative => "relative",
            Self::Frequency => "frequency",
        }
    }

    /// Whether the expression names a point in time (frequencies do not).
    pub fn is_dated(&self) -> bool {
        !matches!(self, Self::Frequency)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Calendar fields as written; not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: Option<i32>,
    pub month: u32,
    pub day: Option<u32>,
}

/// Parsed meaning of a temporal expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    /// Year may be missing (taken from the anchor); day may be missing (1st).
    Calendar(DateParts),
    Range { start: DateParts, end: DateParts },
    /// Signed offset from the document anchor.
    Offset { amount: i64, unit: OffsetUnit },
    /// Offset after a clinical event (surgery, admission) named in the text.
    AfterEvent { event: String, amount: i64, unit: OffsetUnit },
    Frequency { per_day: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    /// First absolute date found in the document.
    Document,
    /// `referenceDate` from the pipeline configuration.
    Configured,
    /// Processing date.
    Clock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalExpression {
    pub id: Uuid,
    pub kind: TemporalKind,
    pub subtype: String,
    pub text: String,
    pub position: Position,
    pub segment_id: Uuid,
    pub resolved: Option<NaiveDate>,
    /// End of a range expression.
    pub resolved_end: Option<NaiveDate>,
    pub confidence: f64,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl TemporalExpression {
    pub fn invalid_reason(&self) -> Option<&str> {
        self.attributes.get("invalid_reason").and_then(|v| v.as_str())
    }

    pub fn is_future(&self) -> bool {
        self.attributes
            .get("future_date")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Output of the temporal stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalOutput {
    /// Timeline order.
    pub events: Vec<Event>,
    pub expressions: Vec<TemporalExpression>,
    pub reference_date: NaiveDate,
    pub reference_source: ReferenceSource,
}
