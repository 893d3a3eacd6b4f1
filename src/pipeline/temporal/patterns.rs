//! Temporal pattern families. Claim order: range, absolute, medical
//! contextual, relative, frequency. ISO-like dates precede locale-ambiguous
//! forms.

use regex::{Captures, Regex};

use super::types::{DateParts, OffsetUnit, TemporalKind, TemporalValue};
use super::TemporalError;
use crate::pipeline::segmentation::fold_digits;

const SEP: &str = r"[-./．／－]";
const UNIT_KO: &str = "주일|개월|일|주|달|년";
const CLINICAL_EVENTS: &str = "수술|시술|입원|퇴원|발병|진단|치료|투약|내원";

/// Two-digit years up to this value are read as 20xx, later ones as 19xx.
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 50;

pub struct TemporalPattern {
    pub kind: TemporalKind,
    pub subtype: &'static str,
    pub regex: Regex,
    /// The pattern always carries a four-digit year.
    pub full_year: bool,
    /// The pattern always carries year, month and day.
    pub full_date: bool,
}

/// Kind, subtype, regex, always a four-digit year, always a full date.
type Spec = (TemporalKind, &'static str, String, bool, bool);

fn specs() -> Vec<Spec> {
    use TemporalKind::*;
    let ymd = |y: &str, m: &str, d: &str| {
        format!(r"(?P<{y}>\d{{4}})\s*{SEP}\s*(?P<{m}>\d{{1,2}})\s*{SEP}\s*(?P<{d}>\d{{1,2}})")
    };
    vec![
        (Range, "range_iso", format!(r"{}\s*(?:~|〜|～|부터|-)\s*{}(?:\s*까지)?", ymd("y1", "m1", "d1"), ymd("y2", "m2", "d2")), true, true),
        (Range, "range_korean", r"(?P<y1>\d{4})\s*년\s*(?P<m1>\d{1,2})\s*월\s*(?P<d1>\d{1,2})\s*일\s*(?:~|〜|～|부터)\s*(?:(?P<y2>\d{4})\s*년\s*)?(?:(?P<m2>\d{1,2})\s*월\s*)?(?P<d2>\d{1,2})\s*일(?:\s*까지)?".into(), true, true),
        (Absolute, "iso", ymd("y", "m", "d"), true, true),
        (Absolute, "korean", r"(?P<y>\d{4})\s*년\s*(?P<m>\d{1,2})\s*월\s*(?P<d>\d{1,2})\s*일".into(), true, true),
        (Absolute, "month_first", r"(?P<a>\d{1,2})/(?P<b>\d{1,2})/(?P<y>\d{4})".into(), true, true),
        (Absolute, "short_year", r"(?P<yy>\d{2})\s*[./]\s*(?P<m>\d{1,2})\s*[./]\s*(?P<d>\d{1,2})".into(), false, false),
        (Absolute, "year_month_korean", r"(?P<y>\d{4})\s*년\s*(?P<m>\d{1,2})\s*월".into(), true, false),
        (Absolute, "year_month", r"(?P<y>(?:19|20)\d{2})[-./](?P<m>\d{1,2})".into(), true, false),
        (Absolute, "month_day", r"(?P<m>\d{1,2})\s*월\s*(?P<d>\d{1,2})\s*일".into(), false, false),
        (MedicalContextual, "after_event", format!(r"(?P<event>{CLINICAL_EVENTS})\s*(?:후|뒤)\s*(?P<n>\d+)\s*(?P<unit>{UNIT_KO})(?:\s*(?:째|차))?"), false, false),
        (MedicalContextual, "event_offset", format!(r"(?P<event>{CLINICAL_EVENTS})\s*(?P<n>\d+)\s*(?P<unit>{UNIT_KO})\s*(?:째|차|후|뒤)"), false, false),
        (MedicalContextual, "postoperative_day", r"(?i)\b(?:POD|post-?op(?:erative)?\s*day)\s*#?\s*(?P<n>\d+)".into(), false, false),
        (Relative, "offset_korean", format!(r"(?P<n>\d+)\s*(?P<unit>{UNIT_KO})\s*(?P<dir>이전|이후|전|후|뒤)"), false, false),
        (Relative, "offset_english", r"(?i)\b(?P<n>\d+)\s*(?P<unit>days?|weeks?|months?|years?)\s+(?P<dir>ago|before|after|later)\b".into(), false, false),
        (Relative, "named_day", r"(?P<word>그저께|그제|어제|오늘|금일|내일|모레)|(?i:\b(?P<eng>yesterday|today|tomorrow)\b)".into(), false, false),
        (Relative, "named_period", r"(?P<word>작년|내년|전년|익년|지난달|다음달|전월|익월|지난주|다음주)".into(), false, false),
        (Frequency, "times_per_day", r"(?:1일|하루)\s*(?P<n>\d+)\s*(?:회|번)|(?P<m>\d+)\s*회\s*/\s*일".into(), false, false),
        (Frequency, "latin_abbreviation", r"(?i)\b(?P<abbr>bid|tid|qid|qd|prn|hs)\b".into(), false, false),
        (Frequency, "schedule_word", r"(?P<word>매일|격일|매주)".into(), false, false),
    ]
}

pub fn compile_patterns() -> Result<Vec<TemporalPattern>, TemporalError> {
    specs()
        .into_iter()
        .map(|(kind, subtype, pattern, full_year, full_date)| {
            let regex =
                Regex::new(&pattern).map_err(|source| TemporalError::Pattern { family: kind.as_str(), source })?;
            Ok(TemporalPattern { kind, subtype, regex, full_year, full_date })
        })
        .collect()
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name).and_then(|m| fold_digits(m.as_str()).parse().ok())
}

fn unit_of(raw: &str) -> Option<OffsetUnit> {
    let lower = raw.to_lowercase();
    match lower.trim_end_matches('s') {
        "일" | "day" => Some(OffsetUnit::Day),
        "주" | "주일" | "week" => Some(OffsetUnit::Week),
        "개월" | "달" | "month" => Some(OffsetUnit::Month),
        "년" | "year" => Some(OffsetUnit::Year),
        _ => None,
    }
}

fn direction_of(raw: &str) -> Option<i64> {
    match raw.to_lowercase().as_str() {
        "전" | "이전" | "ago" | "before" => Some(-1),
        "후" | "이후" | "뒤" | "after" | "later" => Some(1),
        _ => None,
    }
}

fn expand_two_digit_year(yy: i32) -> i32 {
    if yy <= TWO_DIGIT_YEAR_PIVOT {
        2000 + yy
    } else {
        1900 + yy
    }
}

/// Interpret a match. `None` means the captures could not be read (an
/// overflowing number, an unknown unit); the match is then skipped.
pub fn parse(pattern: &TemporalPattern, caps: &Captures<'_>) -> Option<(TemporalValue, Vec<(&'static str, serde_json::Value)>)> {
    let mut attrs = Vec::new();
    let value = match pattern.subtype {
        "range_iso" | "range_korean" => {
            let start = DateParts { year: num(caps, "y1"), month: num(caps, "m1")?, day: num(caps, "d1") };
            let end = DateParts {
                year: num(caps, "y2").or(start.year),
                month: num(caps, "m2").unwrap_or(start.month),
                day: num(caps, "d2"),
            };
            TemporalValue::Range { start, end }
        }
        "iso" | "korean" => TemporalValue::Calendar(DateParts {
            year: Some(num(caps, "y")?),
            month: num(caps, "m")?,
            day: Some(num(caps, "d")?),
        }),
        "month_first" => {
            let a: u32 = num(caps, "a")?;
            let b: u32 = num(caps, "b")?;
            let (month, day) = if a > 12 && b <= 12 {
                attrs.push(("day_first", serde_json::json!(true)));
                (b, a)
            } else {
                if a <= 12 && b <= 12 && a != b {
                    attrs.push(("ambiguous_order", serde_json::json!(true)));
                }
                (a, b)
            };
            TemporalValue::Calendar(DateParts { year: Some(num(caps, "y")?), month, day: Some(day) })
        }
        "short_year" => TemporalValue::Calendar(DateParts {
            year: Some(expand_two_digit_year(num(caps, "yy")?)),
            month: num(caps, "m")?,
            day: Some(num(caps, "d")?),
        }),
        "year_month_korean" | "year_month" => TemporalValue::Calendar(DateParts {
            year: Some(num(caps, "y")?),
            month: num(caps, "m")?,
            day: None,
        }),
        "month_day" => TemporalValue::Calendar(DateParts { year: None, month: num(caps, "m")?, day: Some(num(caps, "d")?) }),
        "after_event" | "event_offset" => TemporalValue::AfterEvent {
            event: caps.name("event")?.as_str().to_string(),
            amount: num(caps, "n")?,
            unit: unit_of(caps.name("unit")?.as_str())?,
        },
        "postoperative_day" => TemporalValue::AfterEvent {
            event: "수술".to_string(),
            amount: num(caps, "n")?,
            unit: OffsetUnit::Day,
        },
        "offset_korean" | "offset_english" => {
            let amount: i64 = num(caps, "n")?;
            let direction = direction_of(caps.name("dir")?.as_str())?;
            TemporalValue::Offset { amount: amount * direction, unit: unit_of(caps.name("unit")?.as_str())? }
        }
        "named_day" => {
            let word = caps.name("word").or_else(|| caps.name("eng"))?.as_str().to_lowercase();
            let amount = match word.as_str() {
                "그저께" | "그제" => -2,
                "어제" | "yesterday" => -1,
                "오늘" | "금일" | "today" => 0,
                "내일" | "tomorrow" => 1,
                "모레" => 2,
                _ => return None,
            };
            TemporalValue::Offset { amount, unit: OffsetUnit::Day }
        }
        "named_period" => {
            let (amount, unit) = match caps.name("word")?.as_str() {
                "작년" | "전년" => (-1, OffsetUnit::Year),
                "내년" | "익년" => (1, OffsetUnit::Year),
                "지난달" | "전월" => (-1, OffsetUnit::Month),
                "다음달" | "익월" => (1, OffsetUnit::Month),
                "지난주" => (-1, OffsetUnit::Week),
                "다음주" => (1, OffsetUnit::Week),
                _ => return None,
            };
            TemporalValue::Offset { amount, unit }
        }
        "times_per_day" => {
            let n: f64 = num(caps, "n").or_else(|| num(caps, "m"))?;
            TemporalValue::Frequency { per_day: Some(n) }
        }
        "latin_abbreviation" => {
            let per_day = match caps.name("abbr")?.as_str().to_lowercase().as_str() {
                "qd" | "hs" => Some(1.0),
                "bid" => Some(2.0),
                "tid" => Some(3.0),
                "qid" => Some(4.0),
                _ => None,
            };
            TemporalValue::Frequency { per_day }
        }
        "schedule_word" => {
            let per_day = match caps.name("word")?.as_str() {
                "매일" => 1.0,
                "격일" => 0.5,
                _ => 1.0 / 7.0,
            };
            TemporalValue::Frequency { per_day: Some(per_day) }
        }
        _ => return None,
    };
    Some((value, attrs))
}
