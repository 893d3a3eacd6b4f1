//! Temporal stage: expressions, date anchoring, events and timeline.

pub mod causal;
pub mod events;
pub mod expressions;
pub mod linking;
pub mod normalizer;
pub mod patterns;
pub mod resolve;
pub mod transforms;
pub mod types;

pub use normalizer::TemporalNormalizer;
pub use types::{ReferenceSource, TemporalExpression, TemporalKind, TemporalOutput};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TemporalError {
    #[error("Failed to compile {family} temporal pattern: {source}")]
    Pattern {
        family: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Entity {entity} references unknown segment {segment}")]
    UnknownSegment { entity: Uuid, segment: Uuid },

    #[error("Entity {entity} span {start}..{end} lies outside the document ({len} bytes)")]
    EntityOutOfBounds {
        entity: Uuid,
        start: usize,
        end: usize,
        len: usize,
    },
}
