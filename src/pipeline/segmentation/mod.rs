//! Segmentation stage: raw pages to context-tagged segments.

pub mod anchors;
pub mod chunker;
pub mod domain;
pub mod normalize;
pub mod segmenter;

pub use normalize::{fold_digits, normalize_preserving_offsets};
pub use segmenter::Segmenter;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Failed to compile {family} anchor pattern: {source}")]
    Pattern {
        family: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Document is {len} bytes, above the {max} byte limit")]
    DocumentTooLarge { len: usize, max: usize },
}

/// Separator inserted between pages when they are joined into one document.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// A multi-page document joined into one text, with the byte offset at
/// which each page starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub text: String,
    pub page_starts: Vec<usize>,
}

impl PageLayout {
    pub fn join(pages: &[String]) -> Self {
        let mut text = String::new();
        let mut page_starts = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                text.push_str(PAGE_SEPARATOR);
            }
            page_starts.push(text.len());
            text.push_str(page);
        }
        Self { text, page_starts }
    }

    /// Index of the page containing byte `offset`.
    pub fn page_of(&self, offset: usize) -> usize {
        match self.page_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}
