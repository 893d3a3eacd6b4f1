//! Clinical keyword tables used for medical-domain scoring and segment
//! confidence.

use std::collections::BTreeMap;

use crate::models::MedicalDomain;

/// Per-domain keyword lists. Score = distinct keywords present / list size.
pub const DOMAIN_KEYWORDS: &[(MedicalDomain, &[&str])] = &[
    (
        MedicalDomain::Gastroenterology,
        &["위궤양", "위염", "십이지장", "위내시경", "대장내시경", "역류성", "식도", "소화기", "대장", "헬리코박터"],
    ),
    (
        MedicalDomain::Orthopedics,
        &["골절", "관절", "척추", "디스크", "인대", "연골", "정형외과", "요추", "경추", "무릎"],
    ),
    (
        MedicalDomain::Cardiology,
        &["심장", "협심증", "심근경색", "부정맥", "고혈압", "관상동맥", "심전도", "스텐트", "순환기", "심부전"],
    ),
    (
        MedicalDomain::Oncology,
        &["종양", "악성", "전이", "항암", "방사선치료", "조직검사", "림프절", "선암", "암종", "종양표지자"],
    ),
    (
        MedicalDomain::Neurology,
        &["뇌경색", "뇌출혈", "두통", "어지럼", "신경과", "뇌졸중", "치매", "파킨슨", "경련", "마비"],
    ),
    (
        MedicalDomain::Endocrinology,
        &["당뇨", "갑상선", "인슐린", "혈당", "당화혈색소", "내분비", "고지혈증", "콜레스테롤", "호르몬", "비만"],
    ),
    (
        MedicalDomain::Respiratory,
        &["폐렴", "천식", "기관지", "호흡기", "만성폐쇄성", "결핵", "흉부", "기침", "객담", "폐기능"],
    ),
];

/// General clinical vocabulary; occurrence density drives segment confidence.
pub const MEDICAL_KEYWORDS: &[&str] = &[
    "진단", "검사", "수술", "처방", "투약", "치료", "입원", "퇴원", "외래", "응급", "수혈", "주사",
    "촬영", "판독", "내과", "외과", "정형외과", "신경외과", "산부인과", "소아과", "이비인후과", "CT",
    "MRI", "X-ray", "초음파", "혈액검사", "소변검사", "처방전", "진료기록", "소견서", "의견서",
    "진단서", "초진", "재진", "내원", "방문", "경과", "추적",
];

pub fn domain_scores(text: &str) -> BTreeMap<MedicalDomain, f64> {
    DOMAIN_KEYWORDS
        .iter()
        .map(|(domain, keywords)| {
            let hits = keywords.iter().filter(|k| text.contains(*k)).count();
            (*domain, hits as f64 / keywords.len() as f64)
        })
        .collect()
}

/// Best-scoring domain at or above `threshold`. Ties go to table order.
pub fn best_domain(scores: &BTreeMap<MedicalDomain, f64>, threshold: f64) -> Option<MedicalDomain> {
    let mut best: Option<(MedicalDomain, f64)> = None;
    for (domain, _) in DOMAIN_KEYWORDS {
        let score = scores.get(domain).copied().unwrap_or(0.0);
        if score < threshold || score <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((*domain, score));
        }
    }
    best.map(|(d, _)| d)
}

/// Total occurrences of general clinical keywords.
pub fn keyword_hits(text: &str) -> usize {
    MEDICAL_KEYWORDS.iter().map(|k| text.matches(k).count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gastro_text_scores_gastro() {
        let text = "위내시경 결과 위궤양 및 역류성 식도염 소견";
        let scores = domain_scores(text);
        assert!((scores[&MedicalDomain::Gastroenterology] - 0.4).abs() < 1e-9);
        assert_eq!(best_domain(&scores, 0.3), Some(MedicalDomain::Gastroenterology));
    }

    #[test]
    fn below_threshold_has_no_domain() {
        let scores = domain_scores("위염 소견");
        assert_eq!(best_domain(&scores, 0.3), None);
        assert_eq!(best_domain(&scores, 0.1), Some(MedicalDomain::Gastroenterology));
    }

    #[test]
    fn zero_threshold_still_requires_a_hit() {
        let scores = domain_scores("특이사항 없음");
        assert_eq!(best_domain(&scores, 0.0), None);
    }

    #[test]
    fn keyword_hits_count_occurrences() {
        assert_eq!(keyword_hits("혈액검사 후 재진, 검사 결과"), 4);
    }
}
