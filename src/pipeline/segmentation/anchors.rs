//! Structural anchors: hospital names, departments, visit and procedure
//! keywords, and date-like substrings.

use regex::Regex;

use super::SegmentationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnchorKind {
    Hospital,
    Department,
    Visit,
    Procedure,
    Date,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::Department => "department",
            Self::Visit => "visit",
            Self::Procedure => "procedure",
            Self::Date => "date",
        }
    }

    /// Anchors that start a new segment inside a hospital window.
    pub fn is_cut(&self) -> bool {
        matches!(self, Self::Visit | Self::Procedure | Self::Date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub start: usize,
    pub end: usize,
    pub label: String,
}

const HOSPITAL_SUFFIX: &str = "대학교병원|대학병원|한방병원|요양병원|병원|한의원|의원|의료원|클리닉|센터|보건소";

/// Longest first: alternation is leftmost-first.
pub const DEPARTMENTS: &[&str] = &[
    "진단검사의학과",
    "정신건강의학과",
    "혈액종양내과",
    "소아청소년과",
    "소화기내과",
    "순환기내과",
    "호흡기내과",
    "내분비내과",
    "가정의학과",
    "재활의학과",
    "영상의학과",
    "응급의학과",
    "비뇨의학과",
    "이비인후과",
    "신장내과",
    "정형외과",
    "신경외과",
    "흉부외과",
    "성형외과",
    "산부인과",
    "비뇨기과",
    "소아과",
    "피부과",
    "신경과",
    "안과",
    "내과",
    "외과",
];

pub const VISIT_KEYWORDS: &[&str] = &["응급실", "초진", "재진", "외래", "입원", "퇴원", "내원", "통원"];

pub const PROCEDURE_KEYWORDS: &[&str] = &["조직검사", "내시경", "수술", "시술", "생검", "검사"];

const DATE_PATTERN: &str = r"\d{4}\s*[-./．／－]\s*\d{1,2}\s*[-./．／－]\s*\d{1,2}|\d{4}\s*년\s*\d{1,2}\s*월(?:\s*\d{1,2}\s*일)?|\b\d{2}\s*[./]\s*\d{1,2}\s*[./]\s*\d{1,2}\b";

/// Compiled anchor patterns, applied as ordered passes.
pub struct AnchorSet {
    passes: Vec<(AnchorKind, Regex)>,
}

impl AnchorSet {
    pub fn new() -> Result<Self, SegmentationError> {
        let bracketed = format!(
            r"[\[【<(（]\s*([가-힣A-Za-z0-9][가-힣A-Za-z0-9 ]{{0,29}}?(?:{HOSPITAL_SUFFIX}))\s*[\]】>)）]"
        );
        let plain = format!(r"[가-힣]{{2,20}}(?:{HOSPITAL_SUFFIX})");
        let passes = vec![
            (AnchorKind::Hospital, compile("hospital_bracketed", &bracketed)?),
            (AnchorKind::Hospital, compile("hospital", &plain)?),
            (AnchorKind::Department, compile("department", &DEPARTMENTS.join("|"))?),
            (AnchorKind::Visit, compile("visit", &VISIT_KEYWORDS.join("|"))?),
            (AnchorKind::Procedure, compile("procedure", &PROCEDURE_KEYWORDS.join("|"))?),
            (AnchorKind::Date, compile("date", DATE_PATTERN)?),
        ];
        Ok(Self { passes })
    }

    /// All anchors in `text`, ordered by position. An earlier pass claims
    /// its span; later passes skip matches overlapping a claimed span.
    pub fn find(&self, text: &str) -> Vec<Anchor> {
        let mut anchors: Vec<Anchor> = Vec::new();
        for (kind, re) in &self.passes {
            for m in re.find_iter(text) {
                let overlaps = anchors.iter().any(|a| m.start() < a.end && a.start < m.end());
                if overlaps {
                    continue;
                }
                anchors.push(Anchor {
                    kind: *kind,
                    start: m.start(),
                    end: m.end(),
                    label: m.as_str().trim().to_string(),
                });
            }
        }
        anchors.sort_by_key(|a| (a.start, a.end));
        anchors
    }
}

fn compile(family: &'static str, pattern: &str) -> Result<Regex, SegmentationError> {
    Regex::new(pattern).map_err(|source| SegmentationError::Pattern { family, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(AnchorKind, String)> {
        AnchorSet::new()
            .unwrap()
            .find(text)
            .into_iter()
            .map(|a| (a.kind, a.label))
            .collect()
    }

    #[test]
    fn bracketed_hospital_found() {
        let found = kinds("[서울대학교병원] 소화기내과 외래");
        assert_eq!(found[0], (AnchorKind::Hospital, "[서울대학교병원]".to_string()));
        assert!(found.contains(&(AnchorKind::Department, "소화기내과".to_string())));
        assert!(found.contains(&(AnchorKind::Visit, "외래".to_string())));
    }

    #[test]
    fn plain_hospital_found() {
        let found = kinds("강남세브란스병원 진료기록");
        assert_eq!(found[0].0, AnchorKind::Hospital);
        assert_eq!(found[0].1, "강남세브란스병원");
    }

    #[test]
    fn longest_department_wins() {
        let found = kinds("소화기내과 진료");
        assert_eq!(found, vec![(AnchorKind::Department, "소화기내과".to_string())]);
    }

    #[test]
    fn dates_are_anchors() {
        let found = kinds("2024년 3월 15일 재진, 2024-04-02 검사");
        let dates: Vec<_> = found.iter().filter(|(k, _)| *k == AnchorKind::Date).collect();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].1, "2024년 3월 15일");
    }

    #[test]
    fn positions_are_ordered() {
        let anchors = AnchorSet::new().unwrap().find("검사 후 2024.01.02 입원");
        let starts: Vec<usize> = anchors.iter().map(|a| a.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn plain_text_has_no_anchors() {
        assert!(kinds("환자는 특이사항 없음").is_empty());
    }
}
