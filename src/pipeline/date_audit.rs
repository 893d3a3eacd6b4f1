//! Baseline date audit.
//!
//! Compares the full calendar dates (year, month and day) found in a
//! generated text against those in a hand-written baseline report. Dates are
//! keyed `YYYY-MM-DD` exactly as written, so an impossible date such as
//! `2025-03-45` still takes part in the comparison. Every date found on one
//! side only is classified and reported with the line it was written on.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ContextType, Position, Segment};
use crate::pipeline::segmentation::domain::MEDICAL_KEYWORDS;
use crate::pipeline::temporal::patterns::{compile_patterns, TemporalPattern};
use crate::pipeline::temporal::resolve::{calendar_date, is_future, MAX_YEAR, MIN_YEAR};
use crate::pipeline::temporal::types::{DateParts, TemporalValue};
use crate::pipeline::temporal::{expressions, TemporalError};

const HIGH_COVERAGE: f64 = 80.0;
const MEDIUM_COVERAGE: f64 = 60.0;

/// Non-digit characters allowed between the fields of a reformatted date.
const MAX_FIELD_GAP: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditGrade {
    High,
    Medium,
    Low,
}

impl AuditGrade {
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage >= HIGH_COVERAGE {
            Self::High
        } else if coverage >= MEDIUM_COVERAGE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Why a date was found on one side of the comparison only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateIssueKind {
    /// The other text carries the same digits split or in another format.
    Reformatted,
    /// A field no calendar has (month 13, day 45, year 2202): a misread digit.
    DigitMisread,
    /// Every field is in range but the day does not exist, e.g. `2023-02-29`.
    NotACalendarDate,
    /// Later than the audit date plus tolerance.
    Future,
    /// A real past date the other text never mentions.
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateIssue {
    pub date: String,
    /// True for a baseline date absent from the generated text.
    pub missing: bool,
    pub kind: DateIssueKind,
    /// The line the date was written on.
    pub line: String,
    /// Clinical keywords on that line.
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAudit {
    pub matched: Vec<String>,
    /// In the baseline but not in the generated text.
    pub missing: Vec<String>,
    /// In the generated text but not in the baseline.
    pub extra: Vec<String>,
    pub coverage: f64,
    pub precision: f64,
    pub grade: AuditGrade,
    /// Missing dates that do not exist on the calendar.
    pub impossible_missing: Vec<String>,
    /// Missing dates later than the audit date plus tolerance.
    pub future_missing: Vec<String>,
    /// Missing dates first, then extra ones, each in key order.
    pub issues: Vec<DateIssue>,
}

/// A full date and the byte offset of its first mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundDate {
    pub parts: DateParts,
    pub start: usize,
}

pub struct DateAuditor {
    patterns: Vec<TemporalPattern>,
    future_tolerance_days: i64,
}

impl DateAuditor {
    pub fn new(future_tolerance_days: i64) -> Result<Self, TemporalError> {
        Ok(Self {
            patterns: compile_patterns()?,
            future_tolerance_days,
        })
    }

    /// Full dates in `text`, keyed `YYYY-MM-DD` with their parts as written.
    pub fn extract_dates(&self, text: &str) -> BTreeMap<String, FoundDate> {
        let segment = Segment {
            id: Uuid::nil(),
            text: text.to_string(),
            source_index: 0,
            context_type: ContextType::General,
            medical_domain: None,
            confidence: 1.0,
            position: Position::new(0, text.len()),
            metadata: BTreeMap::new(),
        };
        let mut dates = BTreeMap::new();
        for raw in expressions::scan(&self.patterns, std::slice::from_ref(&segment)) {
            let start = raw.position.start;
            match raw.value {
                TemporalValue::Calendar(parts) => insert_full(&mut dates, parts, start),
                TemporalValue::Range { start: from, end: to } => {
                    insert_full(&mut dates, from, start);
                    insert_full(&mut dates, to, start);
                }
                _ => {}
            }
        }
        dates
    }

    pub fn audit(&self, generated: &str, baseline: &str) -> DateAudit {
        self.audit_at(generated, baseline, Utc::now().date_naive())
    }

    pub fn audit_at(&self, generated_text: &str, baseline_text: &str, today: NaiveDate) -> DateAudit {
        let generated = self.extract_dates(generated_text);
        let baseline = self.extract_dates(baseline_text);
        let generated_keys: BTreeSet<&String> = generated.keys().collect();
        let baseline_keys: BTreeSet<&String> = baseline.keys().collect();

        let matched: Vec<String> = baseline_keys.intersection(&generated_keys).map(|k| (*k).clone()).collect();
        let missing: Vec<String> = baseline_keys.difference(&generated_keys).map(|k| (*k).clone()).collect();
        let extra: Vec<String> = generated_keys.difference(&baseline_keys).map(|k| (*k).clone()).collect();

        let coverage = if baseline.is_empty() {
            100.0
        } else {
            matched.len() as f64 / baseline.len() as f64 * 100.0
        };
        let precision = if generated.is_empty() {
            0.0
        } else {
            matched.len() as f64 / generated.len() as f64 * 100.0
        };

        let issue = |key: &String, found: FoundDate, own: &str, other: &str, missing: bool| {
            let line = line_at(own, found.start);
            DateIssue {
                date: key.clone(),
                missing,
                kind: self.classify(found.parts, other, today),
                keywords: MEDICAL_KEYWORDS
                    .iter()
                    .filter(|k| line.contains(*k))
                    .map(|k| k.to_string())
                    .collect(),
                line: line.to_string(),
            }
        };
        let mut issues: Vec<DateIssue> = missing
            .iter()
            .filter_map(|k| baseline.get(k).map(|f| issue(k, *f, baseline_text, generated_text, true)))
            .collect();
        issues.extend(
            extra
                .iter()
                .filter_map(|k| generated.get(k).map(|f| issue(k, *f, generated_text, baseline_text, false))),
        );

        let mut impossible_missing = Vec::new();
        let mut future_missing = Vec::new();
        for key in &missing {
            let Some(found) = baseline.get(key) else { continue };
            let Some(year) = found.parts.year else { continue };
            match calendar_date(found.parts, year) {
                Ok(date) if is_future(date, today, self.future_tolerance_days) => future_missing.push(key.clone()),
                Ok(_) => {}
                Err(_) => impossible_missing.push(key.clone()),
            }
        }

        tracing::debug!(
            baseline = baseline.len(),
            generated = generated.len(),
            matched = matched.len(),
            issues = issues.len(),
            coverage,
            "Date audit complete"
        );

        DateAudit {
            matched,
            missing,
            extra,
            coverage,
            precision,
            grade: AuditGrade::from_coverage(coverage),
            impossible_missing,
            future_missing,
            issues,
        }
    }

    fn classify(&self, parts: DateParts, other_text: &str, today: NaiveDate) -> DateIssueKind {
        let (Some(year), Some(day)) = (parts.year, parts.day) else {
            return DateIssueKind::Unmatched;
        };
        if written_differently(year, parts.month, day, other_text) {
            return DateIssueKind::Reformatted;
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&parts.month) || !(1..=31).contains(&day) {
            return DateIssueKind::DigitMisread;
        }
        match calendar_date(parts, year) {
            Err(_) => DateIssueKind::NotACalendarDate,
            Ok(date) if is_future(date, today, self.future_tolerance_days) => DateIssueKind::Future,
            Ok(_) => DateIssueKind::Unmatched,
        }
    }
}

fn insert_full(dates: &mut BTreeMap<String, FoundDate>, parts: DateParts, start: usize) {
    if let (Some(year), Some(day)) = (parts.year, parts.day) {
        dates
            .entry(format!("{year:04}-{:02}-{day:02}", parts.month))
            .or_insert(FoundDate { parts, start });
    }
}

/// Whether `text` holds the year, month and day digits in order with only
/// short non-digit runs between them (`2024 03 15`, `2024-03\n-15`, `20240315`).
fn written_differently(year: i32, month: u32, day: u32, text: &str) -> bool {
    let pattern = format!(
        r"(?:^|\D){year}\D{{0,{MAX_FIELD_GAP}}}0?{month}\D{{0,{MAX_FIELD_GAP}}}0?{day}(?:\D|$)"
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
}

fn line_at(text: &str, at: usize) -> &str {
    let start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let end = text[at..].find('\n').map_or(text.len(), |i| at + i);
    text[start..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auditor() -> DateAuditor {
        DateAuditor::new(30).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn extracts_mixed_separators_as_one_key() {
        let dates = auditor().extract_dates("2024-03-15 내원, 2024년 3월 15일 재진, 2024.4.2 검사");
        let keys: Vec<_> = dates.keys().cloned().collect();
        assert_eq!(keys, ["2024-03-15", "2024-04-02"]);
    }

    #[test]
    fn year_month_only_is_not_a_full_date() {
        assert!(auditor().extract_dates("2024년 3월 외래").is_empty());
    }

    #[test]
    fn range_contributes_both_ends() {
        let dates = auditor().extract_dates("입원 2024-03-01 ~ 2024-03-09");
        assert!(dates.contains_key("2024-03-01"));
        assert!(dates.contains_key("2024-03-09"));
    }

    #[test]
    fn compares_sets() {
        let audit = auditor().audit_at(
            "2024-03-15 진료, 2024-05-01 검사",
            "2024-03-15 진료, 2024-04-10 수술",
            today(),
        );
        assert_eq!(audit.matched, ["2024-03-15"]);
        assert_eq!(audit.missing, ["2024-04-10"]);
        assert_eq!(audit.extra, ["2024-05-01"]);
        assert!((audit.coverage - 50.0).abs() < 1e-9);
        assert!((audit.precision - 50.0).abs() < 1e-9);
        assert_eq!(audit.grade, AuditGrade::Low);
    }

    #[test]
    fn empty_baseline_is_full_coverage() {
        let audit = auditor().audit_at("2024-03-15 진료", "소견 없음", today());
        assert!((audit.coverage - 100.0).abs() < 1e-9);
        assert_eq!(audit.grade, AuditGrade::High);
    }

    #[test]
    fn nothing_generated_has_zero_precision() {
        let audit = auditor().audit_at("", "2024-03-15 진료", today());
        assert_eq!(audit.precision, 0.0);
        assert_eq!(audit.coverage, 0.0);
        assert_eq!(audit.missing, ["2024-03-15"]);
    }

    #[test]
    fn flags_impossible_and_future_missing_dates() {
        let audit = auditor().audit_at("", "2025-03-45 기재, 2026-06-01 예약, 2023-02-29 기재", today());
        assert_eq!(audit.impossible_missing, ["2023-02-29", "2025-03-45"]);
        assert_eq!(audit.future_missing, ["2026-06-01"]);
    }

    fn issue<'a>(audit: &'a DateAudit, date: &str) -> &'a DateIssue {
        audit.issues.iter().find(|i| i.date == date).expect("issue for date")
    }

    #[test]
    fn split_digits_are_reformatted() {
        let audit = auditor().audit_at("검사일 2024-03\n15 내시경, 수술 2024 04 10", "2024-03-15 검사\n2024-04-10 수술", today());
        assert_eq!(audit.missing, ["2024-03-15", "2024-04-10"]);
        assert!(audit.issues.iter().all(|i| i.missing && i.kind == DateIssueKind::Reformatted));
    }

    #[test]
    fn out_of_range_field_is_a_digit_misread() {
        let audit = auditor().audit_at("", "투약 시작 2024-13-02\n수술 2024-03-45", today());
        assert_eq!(issue(&audit, "2024-13-02").kind, DateIssueKind::DigitMisread);
        assert_eq!(issue(&audit, "2024-03-45").kind, DateIssueKind::DigitMisread);
    }

    #[test]
    fn missing_calendar_day_is_not_a_date() {
        let audit = auditor().audit_at("", "2023-02-29 기재", today());
        assert_eq!(issue(&audit, "2023-02-29").kind, DateIssueKind::NotACalendarDate);
    }

    #[test]
    fn future_and_unmatched_dates() {
        let audit = auditor().audit_at("2024-05-01 재진", "2026-06-01 외래 예약\n2024-04-10 수술", today());
        let future = issue(&audit, "2026-06-01");
        assert_eq!(future.kind, DateIssueKind::Future);
        assert_eq!(future.keywords, ["외래"]);
        assert_eq!(issue(&audit, "2024-04-10").kind, DateIssueKind::Unmatched);
        let extra = issue(&audit, "2024-05-01");
        assert!(!extra.missing);
        assert_eq!(extra.kind, DateIssueKind::Unmatched);
    }

    #[test]
    fn issue_carries_its_line() {
        let baseline = "환자 기록\n  2024-04-10 위내시경 검사 시행  \n끝";
        let audit = auditor().audit_at("", baseline, today());
        let miss = issue(&audit, "2024-04-10");
        assert_eq!(miss.line, "2024-04-10 위내시경 검사 시행");
        assert_eq!(miss.keywords, ["검사"]);
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(AuditGrade::from_coverage(80.0), AuditGrade::High);
        assert_eq!(AuditGrade::from_coverage(79.9), AuditGrade::Medium);
        assert_eq!(AuditGrade::from_coverage(60.0), AuditGrade::Medium);
        assert_eq!(AuditGrade::from_coverage(59.9), AuditGrade::Low);
    }

    #[test]
    fn audit_serializes_camel_case() {
        let audit = auditor().audit_at("2024-03-15", "2024-03-15", today());
        let json = serde_json::to_value(&audit).unwrap();
        assert_eq!(json["grade"], "high");
        assert!(json.get("impossibleMissing").is_some());
        assert!(json["issues"].as_array().unwrap().is_empty());
    }
}
