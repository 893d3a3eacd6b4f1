//! Temporal expression scanning and resolution.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::patterns::{parse, TemporalPattern};
use super::resolve::{apply_offset, calendar_date, is_future, Implausible};
use super::types::{DateParts, ReferenceSource, TemporalExpression, TemporalKind, TemporalValue};
use crate::models::{Position, Segment};
use crate::pipeline::segmentation::domain::MEDICAL_KEYWORDS;
use crate::pipeline::segmentation::normalize_preserving_offsets;
use crate::pipeline::text::{clamp_unit, content_id, window_slice};

const KEYWORD_WINDOW_CHARS: usize = 50;
const KEYWORD_BONUS: f64 = 0.05;
const KEYWORD_BONUS_MAX: f64 = 0.15;
const FULL_YEAR_BONUS: f64 = 0.10;
const FULL_DATE_BONUS: f64 = 0.10;

/// A matched expression before any date arithmetic.
#[derive(Debug, Clone)]
pub struct RawExpression {
    pub kind: TemporalKind,
    pub subtype: &'static str,
    pub value: TemporalValue,
    pub text: String,
    pub position: Position,
    pub segment_id: Uuid,
    pub segment_span: Position,
    pub confidence: f64,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

fn adjacent_digit(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back().is_some_and(|c| c.is_numeric());
    let after = text[end..].chars().next().is_some_and(|c| c.is_numeric());
    before || after
}

fn keyword_bonus(segment_text: &str, start: usize, end: usize) -> f64 {
    let around = window_slice(segment_text, start, end, KEYWORD_WINDOW_CHARS);
    let distinct = MEDICAL_KEYWORDS.iter().filter(|k| around.contains(*k)).count();
    (distinct as f64 * KEYWORD_BONUS).min(KEYWORD_BONUS_MAX)
}

fn has_four_digit_year(value: &TemporalValue) -> bool {
    match value {
        TemporalValue::Calendar(parts) => parts.year.is_some(),
        TemporalValue::Range { start, .. } => start.year.is_some(),
        _ => false,
    }
}

/// Scan every segment, claiming spans family by family. Overlaps across
/// segment boundaries keep the earliest, longest match.
pub fn scan(patterns: &[TemporalPattern], segments: &[Segment]) -> Vec<RawExpression> {
    let mut found = Vec::new();
    for segment in segments {
        let normalized = normalize_preserving_offsets(&segment.text);
        let text = normalized.as_str();
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        for pattern in patterns {
            for caps in pattern.regex.captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                let (start, end) = (m.start(), m.end());
                if start == end || claimed.iter().any(|&(s, e)| start < e && s < end) {
                    continue;
                }
                if matches!(pattern.kind, TemporalKind::Absolute | TemporalKind::Range)
                    && adjacent_digit(text, start, end)
                {
                    continue;
                }
                let Some((value, extra)) = parse(pattern, &caps) else {
                    debug!(subtype = pattern.subtype, text = m.as_str(), "Skipping unreadable temporal match");
                    continue;
                };
                claimed.push((start, end));

                let mut confidence = pattern.kind.base_confidence() + keyword_bonus(text, start, end);
                if pattern.full_year || (pattern.kind == TemporalKind::Absolute && has_four_digit_year(&value)) {
                    confidence += FULL_YEAR_BONUS;
                }
                if pattern.full_date {
                    confidence += FULL_DATE_BONUS;
                }
                let mut attributes: BTreeMap<String, serde_json::Value> =
                    extra.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
                attributes.insert("pattern".into(), json!(pattern.subtype));

                found.push(RawExpression {
                    kind: pattern.kind,
                    subtype: pattern.subtype,
                    value,
                    text: segment.text[start..end].to_string(),
                    position: Position::new(start, end).offset(segment.position.start),
                    segment_id: segment.id,
                    segment_span: segment.position,
                    confidence: clamp_unit(confidence),
                    attributes,
                });
            }
        }
    }

    found.sort_by(|a, b| {
        a.position
            .start
            .cmp(&b.position.start)
            .then(b.position.end.cmp(&a.position.end))
    });
    let mut kept: Vec<RawExpression> = Vec::with_capacity(found.len());
    for expr in found {
        let overlaps = kept
            .last()
            .is_some_and(|last| expr.position.start < last.position.end);
        if !overlaps {
            kept.push(expr);
        }
    }
    kept
}

/// Absolute date carried by the expression itself, when it names a year.
fn own_absolute(expr: &RawExpression) -> Option<NaiveDate> {
    match &expr.value {
        TemporalValue::Calendar(parts @ DateParts { year: Some(y), .. }) => calendar_date(*parts, *y).ok(),
        TemporalValue::Range { start: parts @ DateParts { year: Some(y), .. }, .. } => calendar_date(*parts, *y).ok(),
        _ => None,
    }
}

/// Anchor for relative expressions: first resolvable absolute date in
/// document order, then the configured date, then the processing date.
pub fn derive_reference(
    raw: &[RawExpression],
    configured: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, ReferenceSource) {
    if let Some(date) = raw.iter().find_map(own_absolute) {
        return (date, ReferenceSource::Document);
    }
    match configured {
        Some(date) => (date, ReferenceSource::Configured),
        None => (today, ReferenceSource::Clock),
    }
}

pub struct ResolveContext {
    pub reference: NaiveDate,
    pub today: NaiveDate,
    pub future_tolerance_days: i64,
}

/// Resolve every raw expression to a calendar date where possible.
pub fn resolve_all(raw: Vec<RawExpression>, ctx: &ResolveContext) -> Vec<TemporalExpression> {
    let absolutes: Vec<Option<NaiveDate>> = raw.iter().map(own_absolute).collect();

    raw.iter()
        .enumerate()
        .map(|(i, expr)| {
            // Nearest preceding absolute date inside the same segment.
            let local_anchor = (0..i)
                .rev()
                .filter(|&j| raw[j].segment_id == expr.segment_id)
                .find_map(|j| absolutes[j]);
            resolve_one(expr, local_anchor, ctx)
        })
        .collect()
}

fn resolve_one(expr: &RawExpression, local_anchor: Option<NaiveDate>, ctx: &ResolveContext) -> TemporalExpression {
    let mut attributes = expr.attributes.clone();
    let mut confidence = expr.confidence;
    let fallback_year = local_anchor.unwrap_or(ctx.reference).year();

    let outcome: Result<(Option<NaiveDate>, Option<NaiveDate>), Implausible> = match &expr.value {
        TemporalValue::Calendar(parts) => calendar_date(*parts, fallback_year).map(|d| (Some(d), None)),
        TemporalValue::Range { start, end } => calendar_date(*start, fallback_year).and_then(|s| {
            let e = calendar_date(*end, s.year())?;
            if e < s {
                attributes.insert("range_reversed".into(), json!(true));
            }
            Ok((Some(s), Some(e)))
        }),
        TemporalValue::Offset { amount, unit } => {
            apply_offset(ctx.reference, *amount, *unit).map(|d| (Some(d), None))
        }
        TemporalValue::AfterEvent { event, amount, unit } => {
            attributes.insert("event".into(), json!(event));
            let anchor = match local_anchor {
                Some(date) => {
                    attributes.insert("anchor".into(), json!("segment_date"));
                    date
                }
                None => {
                    attributes.insert("anchor".into(), json!("reference_date"));
                    ctx.reference
                }
            };
            apply_offset(anchor, *amount, *unit).map(|d| (Some(d), None))
        }
        TemporalValue::Frequency { per_day } => {
            if let Some(n) = per_day {
                attributes.insert("perDay".into(), json!(n));
            }
            Ok((None, None))
        }
    };

    let (resolved, resolved_end) = match outcome {
        Ok(dates) => dates,
        Err(reason) => {
            warn!(text = %expr.text, reason = reason.as_str(), "Implausible temporal expression");
            attributes.insert("invalid_reason".into(), json!(reason.as_str()));
            confidence *= 0.5;
            (None, None)
        }
    };
    if let Some(date) = resolved.or(resolved_end) {
        let latest = resolved_end.map_or(date, |e| e.max(date));
        if is_future(latest, ctx.today, ctx.future_tolerance_days) {
            warn!(text = %expr.text, date = %latest, "Temporal expression resolves to the future");
            attributes.insert("future_date".into(), json!(true));
        }
    }

    TemporalExpression {
        id: content_id(
            "temporal",
            &[&expr.position.start.to_string(), &expr.position.end.to_string(), &expr.text],
        ),
        kind: expr.kind,
        subtype: expr.subtype.to_string(),
        text: expr.text.clone(),
        position: expr.position,
        segment_id: expr.segment_id,
        resolved,
        resolved_end,
        confidence: clamp_unit(confidence),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContextType;
    use crate::pipeline::temporal::patterns::compile_patterns;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn segment(text: &str, start: usize) -> Segment {
        Segment {
            id: content_id("segment", &[text, &start.to_string()]),
            text: text.to_string(),
            source_index: 0,
            context_type: ContextType::General,
            medical_domain: None,
            confidence: 0.5,
            position: Position::new(start, start + text.len()),
            metadata: BTreeMap::new(),
        }
    }

    fn run(text: &str, configured: Option<NaiveDate>) -> (Vec<TemporalExpression>, NaiveDate, ReferenceSource) {
        let patterns = compile_patterns().unwrap();
        let raw = scan(&patterns, &[segment(text, 0)]);
        let today = d(2024, 6, 1);
        let (reference, source) = derive_reference(&raw, configured, today);
        let ctx = ResolveContext { reference, today, future_tolerance_days: 30 };
        (resolve_all(raw, &ctx), reference, source)
    }

    #[test]
    fn relative_offset_resolves_against_configured_reference() {
        let (exprs, reference, source) = run("5일 전 증상 시작", Some(d(2024, 3, 15)));
        assert_eq!(source, ReferenceSource::Configured);
        assert_eq!(reference, d(2024, 3, 15));
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].resolved, Some(d(2024, 3, 10)));
        assert_eq!(exprs[0].kind, TemporalKind::Relative);
    }

    #[test]
    fn document_date_wins_over_configured() {
        let (exprs, reference, source) = run("2024.01.10 내원, 3일 후 재내원", Some(d(2020, 1, 1)));
        assert_eq!(source, ReferenceSource::Document);
        assert_eq!(reference, d(2024, 1, 10));
        assert_eq!(exprs[1].resolved, Some(d(2024, 1, 13)));
    }

    #[test]
    fn clock_is_last_resort() {
        let (exprs, reference, source) = run("어제 복통 발생", None);
        assert_eq!(source, ReferenceSource::Clock);
        assert_eq!(reference, d(2024, 6, 1));
        assert_eq!(exprs[0].resolved, Some(d(2024, 5, 31)));
    }

    #[test]
    fn absolute_confidence_gets_completeness_bonuses() {
        let (exprs, _, _) = run("2024년 3월 15일 외래 진료", None);
        let absolute = &exprs[0];
        assert_eq!(absolute.subtype, "korean");
        // 0.7 base + 0.05 keyword + 0.1 year + 0.1 full date
        assert!((absolute.confidence - 0.95).abs() < 1e-9, "got {}", absolute.confidence);
    }

    #[test]
    fn impossible_date_is_kept_unresolved() {
        let (exprs, _, source) = run("검사일 2025-03-45 결과", None);
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].resolved, None);
        assert_eq!(exprs[0].invalid_reason(), Some("invalid_day"));
        assert_eq!(source, ReferenceSource::Clock);
    }

    #[test]
    fn non_leap_february_29_rejected() {
        let (exprs, _, _) = run("2023-02-29 내원", None);
        assert_eq!(exprs[0].invalid_reason(), Some("invalid_day"));
    }

    #[test]
    fn future_dates_are_flagged() {
        let (exprs, _, _) = run("2030-01-01 예약", None);
        assert_eq!(exprs[0].resolved, Some(d(2030, 1, 1)));
        assert!(exprs[0].is_future());
    }

    #[test]
    fn surgery_offset_uses_preceding_date_in_segment() {
        let (exprs, _, _) = run("2024-02-01 수술 시행. 수술 후 7일째 실밥 제거", None);
        let contextual = exprs
            .iter()
            .find(|e| e.kind == TemporalKind::MedicalContextual)
            .expect("contextual expression");
        assert_eq!(contextual.resolved, Some(d(2024, 2, 8)));
        assert_eq!(contextual.attributes["anchor"], json!("segment_date"));
    }

    #[test]
    fn month_day_borrows_year_from_earlier_date() {
        let (exprs, _, _) = run("2023-12-20 입원, 12월 28일 퇴원", None);
        assert_eq!(exprs[1].subtype, "month_day");
        assert_eq!(exprs[1].resolved, Some(d(2023, 12, 28)));
    }

    #[test]
    fn range_resolves_both_ends() {
        let (exprs, _, _) = run("2024-03-01 ~ 2024-03-05 입원", None);
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].kind, TemporalKind::Range);
        assert_eq!(exprs[0].resolved, Some(d(2024, 3, 1)));
        assert_eq!(exprs[0].resolved_end, Some(d(2024, 3, 5)));
    }

    #[test]
    fn frequency_has_no_date() {
        let (exprs, _, _) = run("1일 3회 복용", None);
        assert_eq!(exprs[0].kind, TemporalKind::Frequency);
        assert_eq!(exprs[0].resolved, None);
        assert_eq!(exprs[0].attributes["perDay"], json!(3.0));
    }

    #[test]
    fn digits_glued_to_a_date_are_not_a_date() {
        let (exprs, _, _) = run("등록번호 12024-03-151 확인", None);
        assert!(exprs.iter().all(|e| e.kind != TemporalKind::Absolute));
    }

    #[test]
    fn positions_are_document_offsets() {
        let patterns = compile_patterns().unwrap();
        let text = "2024-03-15 진료";
        let raw = scan(&patterns, &[segment(text, 40)]);
        assert_eq!(raw[0].position, Position::new(40, 50));
    }

    #[test]
    fn overlapping_segments_do_not_duplicate() {
        let patterns = compile_patterns().unwrap();
        let doc = "xxxxx 2024-03-15 진료 yyyyy";
        let a = segment(&doc[..17], 0);
        let b = segment(&doc[6..], 6);
        let raw = scan(&patterns, &[a, b]);
        assert_eq!(raw.iter().filter(|e| e.text == "2024-03-15").count(), 1);
    }
}
