//! OCR result ingest: JSON documents to per-page text.
//!
//! Accepted shapes, first match wins:
//! 1. `{"text": "..."}`
//! 2. `{"pages": [{"text": "...", "blocks": [{"text": "..."}]}]}`
//! 3. `{"blocks": [{"text": "...", "bbox": {"page": 0}}]}`
//!
//! Blocks are grouped by page number in ascending order. Page numbers that
//! carry no text produce no page.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::processor::DocumentInput;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Malformed OCR JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OcrDocument {
    text: Option<String>,
    pages: Vec<OcrPage>,
    blocks: Vec<OcrBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OcrPage {
    text: Option<String>,
    blocks: Vec<OcrBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OcrBlock {
    text: Option<String>,
    bbox: Option<BoundingBox>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BoundingBox {
    page: Option<u64>,
}

fn join_blocks(blocks: &[OcrBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.text.as_deref())
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page texts from an OCR JSON result. No text anywhere gives an empty list.
pub fn pages_from_ocr_json(json: &str) -> Result<Vec<String>, IngestError> {
    let doc: OcrDocument = serde_json::from_str(json)?;

    if let Some(text) = doc.text.filter(|t| !t.trim().is_empty()) {
        return Ok(vec![text]);
    }

    if !doc.pages.is_empty() {
        let pages: Vec<String> = doc
            .pages
            .iter()
            .map(|page| match page.text.as_deref().filter(|t| !t.trim().is_empty()) {
                Some(text) => text.to_string(),
                None => join_blocks(&page.blocks),
            })
            .collect();
        if pages.iter().any(|p| !p.trim().is_empty()) {
            return Ok(pages);
        }
    }

    if !doc.blocks.is_empty() {
        let mut grouped: BTreeMap<u64, Vec<&str>> = BTreeMap::new();
        for block in &doc.blocks {
            let page = block.bbox.as_ref().and_then(|bb| bb.page).unwrap_or(0);
            if let Some(text) = block.text.as_deref().filter(|t| !t.trim().is_empty()) {
                grouped.entry(page).or_default().push(text);
            }
        }
        if !grouped.is_empty() {
            return Ok(grouped.into_values().map(|texts| texts.join("\n")).collect());
        }
    }

    tracing::debug!("OCR document carries no text");
    Ok(Vec::new())
}

/// Build a pipeline input from an OCR JSON result.
pub fn document_from_ocr_json(case_id: Option<String>, json: &str) -> Result<DocumentInput, IngestError> {
    Ok(DocumentInput {
        case_id,
        pages: pages_from_ocr_json(json)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_text_wins() {
        let pages = pages_from_ocr_json(r#"{"text":"전체 본문","pages":[{"text":"무시"}]}"#).unwrap();
        assert_eq!(pages, vec!["전체 본문"]);
    }

    #[test]
    fn pages_with_text_or_blocks() {
        let json = r#"{"pages":[
            {"text":"1쪽"},
            {"blocks":[{"text":"2쪽 위"},{"text":"2쪽 아래"}]}
        ]}"#;
        let pages = pages_from_ocr_json(json).unwrap();
        assert_eq!(pages, vec!["1쪽".to_string(), "2쪽 위\n2쪽 아래".to_string()]);
    }

    #[test]
    fn blocks_grouped_by_page() {
        let json = r#"{"blocks":[
            {"text":"b1","bbox":{"page":1}},
            {"text":"a1"},
            {"text":"b2","bbox":{"page":1}},
            {"text":"a2","bbox":{"page":0}}
        ]}"#;
        let pages = pages_from_ocr_json(json).unwrap();
        assert_eq!(pages, vec!["a1\na2".to_string(), "b1\nb2".to_string()]);
    }

    #[test]
    fn sparse_and_extreme_page_numbers() {
        let json = r#"{"blocks":[
            {"text":"last","bbox":{"page":18446744073709551615}},
            {"text":"first","bbox":{"page":0}},
            {"text":"middle","bbox":{"page":4000000000}},
            {"text":"  ","bbox":{"page":7}}
        ]}"#;
        let pages = pages_from_ocr_json(json).unwrap();
        assert_eq!(pages, vec!["first", "middle", "last"]);
    }

    #[test]
    fn negative_page_is_malformed() {
        let json = r#"{"blocks":[{"text":"a","bbox":{"page":-1}}]}"#;
        assert!(matches!(pages_from_ocr_json(json), Err(IngestError::Json(_))));
    }

    #[test]
    fn no_text_is_empty() {
        assert!(pages_from_ocr_json("{}").unwrap().is_empty());
        assert!(pages_from_ocr_json(r#"{"pages":[{"text":"  "}]}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(pages_from_ocr_json("{oops"), Err(IngestError::Json(_))));
    }

    #[test]
    fn builds_document_input() {
        let input = document_from_ocr_json(Some("c1".into()), r#"{"text":"위궤양 진단"}"#).unwrap();
        assert_eq!(input.case_id.as_deref(), Some("c1"));
        assert_eq!(input.pages, vec!["위궤양 진단"]);
    }
}
