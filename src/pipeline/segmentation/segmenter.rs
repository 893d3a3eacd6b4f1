use std::collections::BTreeMap;

use serde_json::json;

use super::anchors::{Anchor, AnchorKind, AnchorSet};
use super::chunker::{chunk_span, is_oversized};
use super::domain::{best_domain, domain_scores, keyword_hits};
use super::normalize::normalize_preserving_offsets;
use super::{PageLayout, SegmentationError};
use crate::models::{ContextType, Position, Segment};
use crate::pipeline::text::{back_chars, char_distance, char_len, clamp_unit, content_id};
use crate::pipeline_config::PipelineConfig;

/// Segment length (in characters) at which the length factor saturates.
const FULL_LENGTH_CHARS: f64 = 300.0;
/// Keyword hits per 100 characters at which the density factor saturates.
const FULL_DENSITY_PER_100: f64 = 3.0;

pub struct Segmenter {
    anchors: AnchorSet,
    min_segment_length: usize,
    max_segment_length: usize,
    context_window: usize,
    domain_threshold: f64,
}

impl Segmenter {
    pub fn new(config: &PipelineConfig) -> Result<Self, SegmentationError> {
        Ok(Self {
            anchors: AnchorSet::new()?,
            min_segment_length: config.min_segment_length,
            max_segment_length: config.max_segment_length,
            context_window: config.context_window_size,
            domain_threshold: config.medical_term_threshold,
        })
    }

    /// Split pages into segments. Positions are byte offsets into the pages
    /// joined with [`super::PAGE_SEPARATOR`].
    pub fn segment(&self, pages: &[String]) -> Vec<Segment> {
        self.segment_layout(&PageLayout::join(pages))
    }

    pub fn segment_layout(&self, layout: &PageLayout) -> Vec<Segment> {
        let text = normalize_preserving_offsets(&layout.text);
        if text.trim().is_empty() {
            tracing::debug!("Empty document, no segments");
            return Vec::new();
        }

        let anchors = self.anchors.find(&text);
        let mut spans = Vec::new();
        for (start, end) in windows(&anchors, &layout.page_starts, text.len()) {
            spans.extend(self.split_window(&text, start, end, &anchors));
        }

        let mut segments: Vec<Segment> = spans
            .into_iter()
            .filter_map(|(s, e)| trim_span(&text, s, e))
            .filter(|(s, e)| char_len(&text[*s..*e]) >= self.min_segment_length)
            .map(|(s, e)| self.build(&text, layout, s, e, &anchors, false))
            .collect();

        if segments.is_empty() {
            // Short document: keep it whole rather than drop every character.
            if let Some((s, e)) = trim_span(&text, 0, text.len()) {
                tracing::debug!(chars = char_len(&text[s..e]), "Short document kept as one segment");
                segments.push(self.build(&text, layout, s, e, &anchors, true));
            }
        }

        segments.sort_by_key(|s| (s.position.start, s.position.end));
        segments.dedup_by_key(|s| s.position);

        tracing::debug!(
            segments = segments.len(),
            anchors = anchors.len(),
            pages = layout.page_starts.len(),
            "Segmentation complete"
        );
        segments
    }

    fn split_window(&self, text: &str, start: usize, end: usize, anchors: &[Anchor]) -> Vec<(usize, usize)> {
        let mut cuts: Vec<usize> = Vec::new();
        for anchor in anchors.iter().filter(|a| a.kind.is_cut()) {
            if anchor.start < start || anchor.start >= end {
                continue;
            }
            let far_enough = cuts
                .last()
                .map_or(true, |last| char_distance(text, *last, anchor.start) >= self.context_window);
            if far_enough {
                cuts.push(anchor.start);
            }
        }

        if cuts.is_empty() {
            return chunk_span(text, start, end, self.max_segment_length);
        }

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let first_context = back_chars(text, cuts[0], self.context_window).max(start);
        if first_context > start {
            pieces.push((start, cuts[0]));
        }
        for (i, cut) in cuts.iter().enumerate() {
            let piece_start = back_chars(text, *cut, self.context_window).max(start);
            let piece_end = cuts.get(i + 1).copied().unwrap_or(end);
            pieces.push((piece_start, piece_end));
        }

        pieces
            .into_iter()
            .flat_map(|(s, e)| {
                if is_oversized(text, s, e, self.max_segment_length) {
                    chunk_span(text, s, e, self.max_segment_length)
                } else {
                    vec![(s, e)]
                }
            })
            .collect()
    }

    fn build(
        &self,
        text: &str,
        layout: &PageLayout,
        start: usize,
        end: usize,
        anchors: &[Anchor],
        short_document: bool,
    ) -> Segment {
        let segment_text = &text[start..end];
        let inside: Vec<&Anchor> = anchors
            .iter()
            .filter(|a| a.start >= start && a.end <= end)
            .collect();

        let scores = domain_scores(segment_text);
        let medical_domain = best_domain(&scores, self.domain_threshold);

        let chars = char_len(segment_text);
        let hits = keyword_hits(segment_text);
        let length_factor = (chars as f64 / FULL_LENGTH_CHARS).min(1.0);
        let density = if chars == 0 { 0.0 } else { hits as f64 * 100.0 / chars as f64 };
        let confidence = clamp_unit(0.4 * length_factor + 0.6 * (density / FULL_DENSITY_PER_100).min(1.0));

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "anchors".to_string(),
            json!(inside
                .iter()
                .map(|a| json!({ "kind": a.kind.as_str(), "label": a.label }))
                .collect::<Vec<_>>()),
        );
        let nonzero: BTreeMap<&str, f64> = scores
            .iter()
            .filter(|(_, s)| **s > 0.0)
            .map(|(d, s)| (d.as_str(), *s))
            .collect();
        metadata.insert("domainScores".to_string(), json!(nonzero));
        metadata.insert("charLength".to_string(), json!(chars));
        metadata.insert("keywordHits".to_string(), json!(hits));
        if short_document {
            metadata.insert("shortDocument".to_string(), json!(true));
        }

        let source_index = layout.page_of(start);
        Segment {
            id: content_id("segment", &[&source_index.to_string(), &start.to_string(), &end.to_string()]),
            text: layout.text[start..end].to_string(),
            source_index,
            context_type: classify(&inside),
            medical_domain,
            confidence,
            position: Position::new(start, end),
            metadata,
        }
    }
}

/// Hospital anchors and page starts open a new window.
fn windows(anchors: &[Anchor], page_starts: &[usize], len: usize) -> Vec<(usize, usize)> {
    let mut starts: Vec<usize> = anchors
        .iter()
        .filter(|a| a.kind == AnchorKind::Hospital)
        .map(|a| a.start)
        .chain(page_starts.iter().copied())
        .chain(std::iter::once(0))
        .filter(|s| *s < len)
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
        .iter()
        .enumerate()
        .map(|(i, start)| (*start, starts.get(i + 1).copied().unwrap_or(len)))
        .collect()
}

fn trim_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let trimmed_start = start + (slice.len() - slice.trim_start().len());
    let trimmed_end = start + slice.trim_end().len();
    (trimmed_start < trimmed_end).then_some((trimmed_start, trimmed_end))
}

fn classify(anchors: &[&Anchor]) -> ContextType {
    let has = |kind: AnchorKind| anchors.iter().any(|a| a.kind == kind);
    if has(AnchorKind::Hospital) {
        ContextType::Hospital
    } else if has(AnchorKind::Procedure) {
        ContextType::Procedure
    } else if has(AnchorKind::Visit) || has(AnchorKind::Date) {
        ContextType::Visit
    } else if has(AnchorKind::Department) {
        ContextType::Department
    } else {
        ContextType::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicalDomain;

    fn segmenter() -> Segmenter {
        Segmenter::new(&PipelineConfig::default()).unwrap()
    }

    fn pages(text: &str) -> Vec<String> {
        vec![text.to_string()]
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(segmenter().segment(&[]).is_empty());
        assert!(segmenter().segment(&pages("")).is_empty());
        assert!(segmenter().segment(&pages("   \n\t  ")).is_empty());
    }

    #[test]
    fn short_document_kept_whole() {
        let segments = segmenter().segment(&pages("  5일 전 증상 시작 "));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "5일 전 증상 시작");
        assert_eq!(segments[0].metadata["shortDocument"], json!(true));
    }

    #[test]
    fn dated_visit_is_one_segment() {
        let text = "2024년 3월 15일 진료... 위궤양 진단";
        let segments = segmenter().segment(&pages(text));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].position, Position::new(0, text.len()));
        assert_eq!(segments[0].context_type, ContextType::Visit);
    }

    #[test]
    fn hospital_windows_split_document() {
        let text = format!(
            "[서울대학교병원] 소화기내과 외래 진료 기록입니다. {}\n[강남성모병원] 정형외과 재진 기록, 무릎 관절 통증 호소. {}",
            "위내시경 검사 시행. ".repeat(3),
            "경과 관찰. ".repeat(3)
        );
        let segments = segmenter().segment(&pages(&text));
        assert!(segments.len() >= 2);
        assert!(segments.iter().any(|s| s.text.contains("서울대학교병원")));
        assert!(segments.iter().any(|s| s.text.contains("강남성모병원")));
        let second = text.find("[강남성모병원]").unwrap();
        for s in &segments {
            if s.text.contains("서울대학교병원") {
                assert!(s.position.end <= second, "first hospital segment bleeds into second window");
            }
        }
        assert!(segments.iter().any(|s| s.context_type == ContextType::Hospital));
    }

    #[test]
    fn no_anchor_text_is_chunked() {
        let config = PipelineConfig {
            max_segment_length: 50,
            ..Default::default()
        };
        let text = "환자는 특이사항 없이 지내고 있음 ".repeat(10);
        let segments = Segmenter::new(&config).unwrap().segment(&pages(&text));
        assert!(segments.len() >= 3);
        for s in &segments {
            assert!(char_len(&s.text) <= 50);
            assert_eq!(s.context_type, ContextType::General);
        }
    }

    #[test]
    fn text_and_position_agree() {
        let text = "2024-01-10 외래 내원, 위염 소견으로 처방함.\n\n2024-02-20 재진 시 위내시경 검사 시행 후 위궤양 진단";
        let segments = segmenter().segment(&pages(text));
        assert!(!segments.is_empty());
        for s in &segments {
            assert_eq!(&text[s.position.start..s.position.end], s.text);
            assert!(s.confidence >= 0.0 && s.confidence <= 1.0);
        }
    }

    #[test]
    fn segments_are_sorted() {
        let text = format!(
            "2024-01-10 외래 {} 2024-02-20 재진 {} 2024-03-30 입원 {}",
            "위염 소견. ".repeat(20),
            "위궤양 소견. ".repeat(20),
            "수술 예정. ".repeat(20)
        );
        let segments = segmenter().segment(&pages(&text));
        assert!(segments.len() >= 3);
        for pair in segments.windows(2) {
            assert!(pair[0].position.start <= pair[1].position.start);
        }
    }

    #[test]
    fn gastro_segment_gets_domain() {
        let text = "외래 내원. 위내시경 결과 위궤양 및 역류성 식도염 소견 확인됨";
        let segments = segmenter().segment(&pages(text));
        assert_eq!(segments[0].medical_domain, Some(MedicalDomain::Gastroenterology));
        assert!(segments[0].metadata["domainScores"]["gastroenterology"].as_f64().unwrap() >= 0.3);
    }

    #[test]
    fn source_index_tracks_pages() {
        let first = "2024-01-10 외래 내원하여 위염 소견으로 약 처방함".to_string();
        let second = "2024-02-20 재진 시 위내시경 검사 시행 후 위궤양 진단".to_string();
        let segments = segmenter().segment(&[first, second]);
        assert!(segments.iter().any(|s| s.source_index == 0));
        assert!(segments.iter().any(|s| s.source_index == 1 && s.text.contains("위궤양")));
    }

    #[test]
    fn identical_input_identical_ids() {
        let text = pages("2024-01-10 외래 내원하여 위염 소견으로 약 처방함");
        let a = segmenter().segment(&text);
        let b = segmenter().segment(&text);
        assert_eq!(a, b);
    }

    #[test]
    fn control_characters_stay_in_segment_text() {
        let text = "2024-01-10\t외래 내원하여\r\n위염 소견으로 약 처방함";
        let segments = segmenter().segment(&pages(text));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, text);
    }

    #[test]
    fn id_depends_on_span_not_wording() {
        let a = segmenter().segment(&pages("2024-01-10 외래 내원하여 위염 소견으로 약 처방함"));
        let b = segmenter().segment(&pages("2024-01-10 외래 내원하여 장염 소견으로 약 처방함"));
        assert_eq!(a[0].position, b[0].position);
        assert_eq!(a[0].id, b[0].id);
    }
}
