//! Entity extraction stage: typed clinical entities from segments.

pub mod confidence;
pub mod extractor;
pub mod lexicon;
pub mod patterns;
pub mod relations;

pub use extractor::EntityExtractor;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to compile {family} entity pattern: {source}")]
    Pattern {
        family: &'static str,
        #[source]
        source: regex::Error,
    },
}
