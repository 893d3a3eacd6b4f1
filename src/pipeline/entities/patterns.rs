//! Ordered pattern tables, one per entity family. Within a family the most
//! specific pattern comes first and claims its span.

use regex::Regex;

use super::lexicon::{ANATOMY_KO, DIAGNOSIS_KO, MEDICATION_KO, PROCEDURE_KO};
use super::ExtractionError;
use crate::models::EntityType;

/// How a candidate is checked against the family's lexicon and rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// KCD code index.
    KcdCode,
    /// Matched a lexicon alternation; always a dictionary hit.
    Dictionary,
    /// Korean word ending in a clinical suffix; must end at a word boundary.
    KoreanSuffix,
    /// Latin word; looked up (with OCR tolerance) in the Latin table.
    Latin,
    /// Any Latin word, kept only on a (possibly fuzzy) lexicon hit.
    LatinLexicon,
    /// Drug name followed by a dose.
    Dosage,
    /// Shape alone is the evidence (measurements, laterality, markers).
    Shape,
}

pub struct CompiledPattern {
    pub subtype: &'static str,
    pub regex: Regex,
    pub specificity: f64,
    pub validation: Validation,
}

pub struct FamilyPatterns {
    pub entity_type: EntityType,
    pub patterns: Vec<CompiledPattern>,
}

const DIAGNOSIS_SUFFIXES: &str =
    "증후군|궤양|종양|질환|장애|결석|골절|파열|협착|경색|출혈|부전|염|증|암|병";
const PROCEDURE_SUFFIXES: &str =
    "절제술|성형술|봉합술|치환술|고정술|유합술|삽입술|조영술|수술|시술|내시경|생검|촬영|검사|치료|주사";
const DOSAGE_FORMS: &str = "주사액|점안액|캡슐|시럽|연고|패치|정";
const DRUG_SUFFIXES: &str =
    "prazole|floxacin|sartan|statin|mycin|cillin|profen|formin|dipine|tidine|setron|azepam|oxetine|gliptin|parin|olol|pril";
const DOSE_UNITS: &str = "mcg|μg|㎎|mg|mL|ml|㎖|IU|g|정|캡슐|tab|cap";
const VALUE_UNITS: &str = r"mg/dL|g/dL|mmol/L|mEq/L|mmHg|IU/L|U/L|ng/mL|pg/mL|bpm|cm|mm|kg|%|℃|°C";

fn alternation(terms: &[&str]) -> String {
    let mut sorted: Vec<&str> = terms.to_vec();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    sorted.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|")
}

/// Subtype, regex, specificity bonus, validation rule.
type PatternSpec = (&'static str, String, f64, Validation);

fn diagnosis_specs() -> Vec<PatternSpec> {
    use Validation::*;
    vec![
        ("kcd_code", r"\b(?P<term>[A-Z]\d{2}(?:\.\d{1,2})?)\b".into(), 0.35, KcdCode),
        ("explicit_marker", r"(?:진단명|상병명|병명|Dx|diagnosis)\s*[:：]\s*(?P<term>[가-힣A-Za-z]{2,20})".into(), 0.3, Shape),
        ("dictionary", format!("(?P<term>{})", alternation(DIAGNOSIS_KO)), 0.25, Dictionary),
        ("korean_suffix", format!("(?P<term>[가-힣]{{1,12}}(?:{DIAGNOSIS_SUFFIXES}))"), 0.25, KoreanSuffix),
        ("latin_suffix", r"(?i)\b(?P<term>[a-z]{3,25}(?:itis|osis|emia|oma|pathy|ension))\b".into(), 0.2, Latin),
        ("latin_lexicon", r"\b(?P<term>[A-Za-z]{5,25})\b".into(), 0.15, LatinLexicon),
    ]
}

fn procedure_specs() -> Vec<PatternSpec> {
    use Validation::*;
    vec![
        ("imaging", r"(?P<term>PET-CT|X-ray|x-ray|MRI|PET|EKG|ECG|EGD|CT|초음파|엑스레이)".into(), 0.3, Shape),
        ("dictionary", format!("(?P<term>{})", alternation(PROCEDURE_KO)), 0.25, Dictionary),
        ("korean_suffix", format!("(?P<term>[가-힣]{{1,12}}(?:{PROCEDURE_SUFFIXES}))"), 0.25, KoreanSuffix),
        ("latin_suffix", r"(?i)\b(?P<term>[a-z]{3,25}(?:ectomy|otomy|ostomy|plasty|scopy|graphy|opsy))\b".into(), 0.2, Latin),
    ]
}

fn medication_specs() -> Vec<PatternSpec> {
    use Validation::*;
    vec![
        (
            "dosage",
            format!(r"(?P<term>[A-Za-z가-힣][A-Za-z가-힣\-]{{1,30}}?)\s*(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>{DOSE_UNITS})"),
            0.35,
            Dosage,
        ),
        ("dictionary", format!("(?P<term>{})", alternation(MEDICATION_KO)), 0.25, Dictionary),
        ("latin_suffix", format!(r"(?i)\b(?P<term>[a-z]{{2,20}}(?:{DRUG_SUFFIXES}))\b"), 0.25, Latin),
        ("dosage_form", format!("(?P<term>[가-힣]{{2,15}}(?:{DOSAGE_FORMS}))"), 0.2, KoreanSuffix),
        ("latin_lexicon", r"\b(?P<term>[A-Za-z]{5,25})\b".into(), 0.15, LatinLexicon),
    ]
}

fn anatomy_specs() -> Vec<PatternSpec> {
    use Validation::*;
    let organs = alternation(ANATOMY_KO);
    vec![
        ("lateral", format!("(?P<side>좌측|우측|양측)\\s*(?P<term>{organs})"), 0.3, Dictionary),
        ("organ", format!("(?P<term>{organs})"), 0.15, Dictionary),
        (
            "latin_organ",
            r"(?i)\b(?P<term>stomach|duodenum|esophagus|pancreas|shoulder|kidney|liver|heart|colon|spine|lung|knee)\b".into(),
            0.15,
            Latin,
        ),
    ]
}

fn value_specs() -> Vec<PatternSpec> {
    use Validation::*;
    vec![
        ("blood_pressure", r"(?P<name>BP|혈압)\s*[:：]?\s*(?P<value>\d{2,3}\s*/\s*\d{2,3})\s*(?P<unit>mmHg)?".into(), 0.35, Shape),
        (
            "named_measure",
            format!(r"(?P<name>[A-Za-z][A-Za-z0-9]{{0,10}}|[가-힣]{{2,10}})\s*[:：=]?\s*(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>{VALUE_UNITS})"),
            0.3,
            Shape,
        ),
        ("bare_measure", format!(r"(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>{VALUE_UNITS})"), 0.1, Shape),
    ]
}

/// All families in extraction order.
pub fn compile_all() -> Result<Vec<FamilyPatterns>, ExtractionError> {
    let families = [
        (EntityType::Diagnosis, diagnosis_specs()),
        (EntityType::Procedure, procedure_specs()),
        (EntityType::Medication, medication_specs()),
        (EntityType::Anatomy, anatomy_specs()),
        (EntityType::Value, value_specs()),
    ];
    families
        .into_iter()
        .map(|(entity_type, specs)| {
            let patterns = specs
                .into_iter()
                .map(|(subtype, pattern, specificity, validation)| {
                    Regex::new(&pattern)
                        .map(|regex| CompiledPattern { subtype, regex, specificity, validation })
                        .map_err(|source| ExtractionError::Pattern { family: entity_type.as_str(), source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FamilyPatterns { entity_type, patterns })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(entity_type: EntityType) -> FamilyPatterns {
        compile_all()
            .unwrap()
            .into_iter()
            .find(|f| f.entity_type == entity_type)
            .unwrap()
    }

    fn first_term(entity_type: EntityType, subtype: &str, text: &str) -> Option<String> {
        let fam = family(entity_type);
        let pattern = fam.patterns.iter().find(|p| p.subtype == subtype)?;
        let caps = pattern.regex.captures(text)?;
        caps.name("term").or_else(|| caps.get(0)).map(|m| m.as_str().to_string())
    }

    #[test]
    fn all_families_compile() {
        let families = compile_all().unwrap();
        assert_eq!(families.len(), 5);
        for f in &families {
            assert!(!f.patterns.is_empty());
            for pair in f.patterns.windows(2) {
                assert!(pair[0].specificity >= pair[1].specificity, "{:?} not ordered", f.entity_type);
            }
        }
    }

    #[test]
    fn korean_diagnosis_suffix() {
        assert_eq!(first_term(EntityType::Diagnosis, "korean_suffix", "내시경상 출혈성위궤양 소견").as_deref(), Some("출혈성위궤양"));
    }

    #[test]
    fn kcd_code_pattern() {
        assert_eq!(first_term(EntityType::Diagnosis, "kcd_code", "상병코드 K25.9 위궤양").as_deref(), Some("K25.9"));
    }

    #[test]
    fn dictionary_prefers_longest_term() {
        assert_eq!(first_term(EntityType::Diagnosis, "dictionary", "만성위염").as_deref(), Some("만성위염"));
    }

    #[test]
    fn procedure_suffix_finds_longest_stem() {
        assert_eq!(
            first_term(EntityType::Procedure, "korean_suffix", "복강경담낭절제술 시행").as_deref(),
            Some("복강경담낭절제술")
        );
    }

    #[test]
    fn dosage_captures_name_value_unit() {
        let fam = family(EntityType::Medication);
        let caps = fam.patterns[0].regex.captures("Omeprazole 20mg 1일 1회").unwrap();
        assert_eq!(&caps["term"], "Omeprazole");
        assert_eq!(&caps["value"], "20");
        assert_eq!(&caps["unit"], "mg");
    }

    #[test]
    fn blood_pressure_value() {
        let fam = family(EntityType::Value);
        let caps = fam.patterns[0].regex.captures("혈압 130/85 mmHg").unwrap();
        assert_eq!(&caps["value"], "130/85");
        assert_eq!(&caps["unit"], "mmHg");
    }

    #[test]
    fn named_measure_prefers_compound_unit() {
        let fam = family(EntityType::Value);
        let caps = fam.patterns[1].regex.captures("혈당 126 mg/dL").unwrap();
        assert_eq!(&caps["name"], "혈당");
        assert_eq!(&caps["unit"], "mg/dL");
    }

    #[test]
    fn lateral_anatomy() {
        let fam = family(EntityType::Anatomy);
        let caps = fam.patterns[0].regex.captures("우측 무릎 통증").unwrap();
        assert_eq!(&caps["side"], "우측");
        assert_eq!(&caps["term"], "무릎");
    }
}
