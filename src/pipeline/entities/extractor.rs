use std::collections::{BTreeMap, HashMap};

use regex::Captures;
use serde_json::json;

use super::confidence::{
    context_keywords, markers, post_adjust, ConfidenceSignals, CONTEXT_WINDOW_CHARS, CO_OCCURRENCE_CHARS,
    MARKER_AFTER_CHARS, MARKER_BEFORE_CHARS,
};
use super::lexicon::{
    kcd_lookup, lookup_ko, lookup_latin, LexiconMatch, ANATOMY_LATIN, DIAGNOSIS_KO, DIAGNOSIS_LATIN,
    MEDICATION_KO, MEDICATION_LATIN, PROCEDURE_KO, PROCEDURE_LATIN,
};
use super::patterns::{compile_all, CompiledPattern, FamilyPatterns, Validation};
use super::relations::discover_relations;
use super::ExtractionError;
use crate::models::{Entity, EntityType, Evidence, EvidenceType, Position, Segment, ValidationStatus};
use crate::pipeline::segmentation::normalize_preserving_offsets;
use crate::pipeline::text::{back_chars, char_len, content_id, forward_chars, window_slice};
use crate::pipeline_config::PipelineConfig;

/// Matches longer than this (in characters) are treated as malformed.
pub const MAX_MATCH_CHARS: usize = 80;
/// Characters of surrounding text stored on each entity.
const SNIPPET_CHARS: usize = 30;
/// Tolerance for float sums landing just under the threshold.
const SCORE_EPSILON: f64 = 1e-9;

const PARTICLES: &[&str] = &[
    "으로", "에서", "이며", "이고", "이나", "에게", "은", "는", "이", "가", "을", "를", "의", "로", "와", "과",
    "에", "도",
];
const CLINICAL_TRAILERS: &[&str] = &["진단", "소견", "의증", "의심", "환자", "수술", "치료", "검사", "시행", "처방", "및"];

/// Words ending in 정 that are not dosage forms.
const NON_DRUG_ENDINGS: &[&str] = &[
    "예정", "측정", "결정", "판정", "진정", "안정", "일정", "설정", "추정", "인정", "조정", "지정", "과정", "가정",
    "검정", "교정", "규정", "선정",
];
/// Words that precede a dose but are not drug names.
const NON_DRUG_NAMES: &[&str] = &[
    "처방", "투약", "복용", "투여", "하루", "매일", "총", "각각", "약", "용량", "1일", "일일", "회당",
];

pub struct EntityExtractor {
    families: Vec<FamilyPatterns>,
    confidence_threshold: f64,
}

#[derive(Debug, Default)]
struct ExtractionStats {
    candidates: usize,
    rejected: usize,
    skipped: usize,
}

/// A validated match before confidence scoring.
struct Candidate {
    start: usize,
    end: usize,
    normalized: String,
    value: Option<String>,
    unit: Option<String>,
    lexicon: LexiconMatch,
    rule: &'static str,
    attributes: BTreeMap<String, serde_json::Value>,
}

impl EntityExtractor {
    pub fn new(config: &PipelineConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            families: compile_all()?,
            confidence_threshold: config.confidence_threshold,
        })
    }

    /// Extract, deduplicate, re-score and relate entities across all segments.
    pub fn extract(&self, segments: &[Segment]) -> Vec<Entity> {
        let mut stats = ExtractionStats::default();
        let mut candidates = Vec::new();
        for segment in segments {
            self.extract_segment(segment, &mut candidates, &mut stats);
        }

        let mut entities = dedupe(candidates);
        let before_post = entities.len();
        self.post_process(&mut entities);
        let relations = discover_relations(&mut entities, segments);

        tracing::debug!(
            segments = segments.len(),
            candidates = stats.candidates,
            rejected = stats.rejected,
            skipped = stats.skipped,
            deduped = before_post,
            entities = entities.len(),
            relations,
            "Entity extraction complete"
        );
        entities
    }

    fn extract_segment(&self, segment: &Segment, out: &mut Vec<Entity>, stats: &mut ExtractionStats) {
        // Match on the normalized copy; spans are shared with `segment.text`.
        let scan = normalize_preserving_offsets(&segment.text);
        for family in &self.families {
            let mut claimed: Vec<(usize, usize)> = Vec::new();
            for pattern in &family.patterns {
                for caps in pattern.regex.captures_iter(&scan) {
                    stats.candidates += 1;
                    let Some((start, end)) = entity_span(&caps) else {
                        stats.skipped += 1;
                        tracing::debug!(subtype = pattern.subtype, "Skipped match without span");
                        continue;
                    };
                    if start >= end || char_len(&scan[start..end]) > MAX_MATCH_CHARS {
                        stats.skipped += 1;
                        tracing::debug!(
                            family = family.entity_type.as_str(),
                            subtype = pattern.subtype,
                            "Skipped malformed or overlong match"
                        );
                        continue;
                    }
                    if claimed.iter().any(|(s, e)| start < *e && *s < end) {
                        continue;
                    }

                    let Some(candidate) = validate(family.entity_type, pattern, &caps, &scan, start, end)
                    else {
                        stats.rejected += 1;
                        continue;
                    };

                    let entity = build_entity(family.entity_type, pattern, candidate, segment, &scan);
                    if entity.confidence + SCORE_EPSILON < self.confidence_threshold {
                        stats.rejected += 1;
                        continue;
                    }
                    claimed.push((start, end));
                    out.push(entity);
                }
            }
        }
    }

    /// Document-level re-scoring: repeated terms gain support, one-character
    /// terms lose some. Entities that fall below the threshold are dropped.
    fn post_process(&self, entities: &mut Vec<Entity>) {
        let mut occurrences: HashMap<(EntityType, String), usize> = HashMap::new();
        for e in entities.iter() {
            *occurrences.entry((e.entity_type, e.normalized_text.clone())).or_default() += 1;
        }
        for e in entities.iter_mut() {
            let count = occurrences
                .get(&(e.entity_type, e.normalized_text.clone()))
                .copied()
                .unwrap_or(1);
            e.confidence = post_adjust(e.confidence, count, char_len(&e.normalized_text));
            if count > 1 {
                e.attributes.insert("occurrences".to_string(), json!(count));
            }
        }
        entities.retain(|e| e.confidence + SCORE_EPSILON >= self.confidence_threshold);
    }
}

/// Exact-key deduplication; the most confident copy of each key survives.
fn dedupe(candidates: Vec<Entity>) -> Vec<Entity> {
    let mut best: HashMap<(EntityType, String, usize), Entity> = HashMap::new();
    for entity in candidates {
        let key = (entity.entity_type, entity.normalized_text.clone(), entity.position.start);
        match best.get(&key) {
            Some(existing) if existing.confidence >= entity.confidence => {}
            _ => {
                best.insert(key, entity);
            }
        }
    }
    let mut entities: Vec<Entity> = best.into_values().collect();
    entities.sort_by(|a, b| {
        (a.position.start, a.entity_type, &a.normalized_text, a.position.end)
            .cmp(&(b.position.start, b.entity_type, &b.normalized_text, b.position.end))
    });
    entities
}

/// Span of the entity within the match: the whole match for measurements,
/// doses and lateral anatomy, the `term` group otherwise.
fn entity_span(caps: &Captures<'_>) -> Option<(usize, usize)> {
    let whole = caps.get(0)?;
    if caps.name("value").is_some() || caps.name("side").is_some() {
        return Some((whole.start(), whole.end()));
    }
    let term = caps.name("term").unwrap_or(whole);
    Some((term.start(), term.end()))
}

fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// Whether a Korean word ends at `rest`: end of text, a non-Hangul
/// character, a particle, or a clinical trailer word.
pub fn ends_word(rest: &str) -> bool {
    let Some(first) = rest.chars().next() else {
        return true;
    };
    if !is_hangul(first) {
        return true;
    }
    if CLINICAL_TRAILERS.iter().any(|t| rest.starts_with(t)) {
        return true;
    }
    PARTICLES.iter().any(|p| {
        rest.strip_prefix(p)
            .is_some_and(|after| after.chars().next().map_or(true, |c| !is_hangul(c)))
    })
}

fn latin_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric()) && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

fn latin_table(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Diagnosis => DIAGNOSIS_LATIN,
        EntityType::Procedure => PROCEDURE_LATIN,
        EntityType::Medication => MEDICATION_LATIN,
        EntityType::Anatomy => ANATOMY_LATIN,
        EntityType::Value => &[],
    }
}

fn korean_table(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Diagnosis => DIAGNOSIS_KO,
        EntityType::Procedure => PROCEDURE_KO,
        EntityType::Medication => MEDICATION_KO,
        EntityType::Anatomy | EntityType::Value => &[],
    }
}

fn lookup_term(entity_type: EntityType, term: &str) -> LexiconMatch {
    if term.is_ascii() {
        lookup_latin(latin_table(entity_type), term)
    } else {
        lookup_ko(korean_table(entity_type), term)
    }
}

fn strip_dosage_form(name: &str) -> &str {
    ["캡슐", "정"]
        .iter()
        .find_map(|form| name.strip_suffix(form).filter(|s| !s.is_empty()))
        .unwrap_or(name)
}

/// Check a raw match against the family's rules. `None` rejects it.
fn validate(
    entity_type: EntityType,
    pattern: &CompiledPattern,
    caps: &Captures<'_>,
    text: &str,
    start: usize,
    end: usize,
) -> Option<Candidate> {
    let term = caps.name("term").map(|m| m.as_str()).unwrap_or(&text[start..end]);
    let rest = &text[end..];
    let mut attributes = BTreeMap::new();
    attributes.insert("pattern".to_string(), json!(pattern.subtype));

    let mut candidate = Candidate {
        start,
        end,
        normalized: term.trim().to_lowercase(),
        value: None,
        unit: None,
        lexicon: LexiconMatch::None,
        rule: "shape",
        attributes,
    };

    match pattern.validation {
        Validation::KcdCode => {
            let code = term.to_ascii_uppercase();
            candidate.normalized = code.clone();
            candidate.rule = "kcd_code_format";
            if let Some(entry) = kcd_lookup(&code) {
                candidate.lexicon = LexiconMatch::Exact;
                candidate.rule = "kcd_index";
                candidate.attributes.insert("kcdName".to_string(), json!(entry.name));
                if let Some(replacement) = entry.replaced_by {
                    candidate.attributes.insert("deprecated_code".to_string(), json!(true));
                    candidate.attributes.insert("replacementCode".to_string(), json!(replacement));
                }
            }
        }
        Validation::Dictionary => {
            if entity_type == EntityType::Anatomy {
                let single = term.chars().count() == 1;
                let before_hangul = text[..start].chars().next_back().is_some_and(is_hangul);
                let organ_end = caps.name("term").map_or(end, |m| m.end());
                if (single && before_hangul && caps.name("side").is_none()) || !ends_word(&text[organ_end..]) {
                    return None;
                }
                if let Some(side) = caps.name("side") {
                    candidate.attributes.insert("laterality".to_string(), json!(side.as_str()));
                }
            }
            candidate.lexicon = LexiconMatch::Exact;
            candidate.rule = "lexicon";
        }
        Validation::KoreanSuffix => {
            if !ends_word(rest) {
                return None;
            }
            if entity_type == EntityType::Medication && NON_DRUG_ENDINGS.iter().any(|w| term.ends_with(w)) {
                return None;
            }
            candidate.lexicon = lookup_ko(korean_table(entity_type), term);
            candidate.rule = "clinical_suffix";
        }
        Validation::Latin => {
            if !latin_bounded(text, start, end) {
                return None;
            }
            candidate.lexicon = lookup_latin(latin_table(entity_type), term);
            if entity_type == EntityType::Anatomy {
                candidate.lexicon = LexiconMatch::Exact;
            }
            candidate.rule = "latin_suffix";
        }
        Validation::LatinLexicon => {
            candidate.lexicon = lookup_latin(latin_table(entity_type), term);
            if candidate.lexicon == LexiconMatch::None {
                return None;
            }
            candidate.rule = "latin_lexicon";
        }
        Validation::Dosage => {
            let name = term.trim();
            if NON_DRUG_NAMES.iter().any(|w| name == *w || name.ends_with(w)) {
                return None;
            }
            let unit = caps.name("unit").map(|m| m.as_str()).unwrap_or_default();
            let unit_ok = if unit.is_ascii() {
                !rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '/')
            } else {
                ends_word(rest)
            };
            if !unit_ok {
                return None;
            }
            candidate.lexicon = lookup_term(entity_type, strip_dosage_form(name));
            candidate.normalized = name.to_lowercase();
            candidate.value = caps.name("value").map(|m| m.as_str().to_string());
            candidate.unit = Some(unit.to_string());
            candidate.rule = "dose_expression";
        }
        Validation::Shape => match entity_type {
            EntityType::Value => {
                let unit = caps.name("unit").map(|m| m.as_str());
                if let Some(u) = unit {
                    if u.chars().all(|c| c.is_ascii_alphabetic())
                        && rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                    {
                        return None;
                    }
                }
                let value: String = caps
                    .name("value")
                    .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
                    .unwrap_or_default();
                candidate.normalized = match (pattern.subtype, caps.name("name")) {
                    ("blood_pressure", _) => "blood_pressure".to_string(),
                    (_, Some(name)) => name.as_str().to_lowercase(),
                    (_, None) => format!("{value}{}", unit.unwrap_or_default().to_lowercase()),
                };
                candidate.unit = unit
                    .map(str::to_string)
                    .or_else(|| (pattern.subtype == "blood_pressure").then(|| "mmHg".to_string()));
                candidate.value = Some(value);
                candidate.rule = "measurement_shape";
            }
            EntityType::Procedure => {
                if term.is_ascii() && !latin_bounded(text, start, end) {
                    return None;
                }
                candidate.lexicon = LexiconMatch::Exact;
                candidate.rule = "imaging_abbreviation";
            }
            _ => {
                candidate.lexicon = lookup_term(entity_type, term);
                candidate.rule = "explicit_marker";
                candidate
                    .attributes
                    .insert("explicitMarker".to_string(), json!(true));
            }
        },
    }

    if let LexiconMatch::Fuzzy { term: corrected, distance } = candidate.lexicon {
        candidate.attributes.insert("lexiconTerm".to_string(), json!(corrected));
        candidate.attributes.insert("editDistance".to_string(), json!(distance));
        if pattern.validation != Validation::Dosage {
            candidate.normalized = corrected.to_string();
        }
    }
    candidate
        .attributes
        .insert("lexicon".to_string(), json!(candidate.lexicon.as_str()));
    Some(candidate)
}

fn find_marker(entity_type: EntityType, text: &str, start: usize, end: usize) -> Option<&'static str> {
    let before = text[back_chars(text, start, MARKER_BEFORE_CHARS)..start].to_lowercase();
    let after = text[end..forward_chars(text, end, MARKER_AFTER_CHARS)].to_lowercase();
    markers(entity_type)
        .iter()
        .find(|m| {
            let m = m.to_lowercase();
            before.contains(&m) || after.contains(&m)
        })
        .copied()
}

/// The text up to `chars` characters either side of `start..end`.
fn around(text: &str, start: usize, end: usize, chars: usize) -> (&str, &str) {
    (&text[back_chars(text, start, chars)..start], &text[end..forward_chars(text, end, chars)])
}

fn build_entity(
    entity_type: EntityType,
    pattern: &CompiledPattern,
    candidate: Candidate,
    segment: &Segment,
    text: &str,
) -> Entity {
    let (start, end) = (candidate.start, candidate.end);
    let marker = find_marker(entity_type, text, start, end);
    let signals = ConfidenceSignals {
        specificity: pattern.specificity,
        lexicon: candidate.lexicon,
        marker: marker.is_some() || candidate.attributes.contains_key("explicitMarker"),
        context_hits: {
            let (before, after) = around(text, start, end, CONTEXT_WINDOW_CHARS);
            let keywords = context_keywords(entity_type);
            keywords.iter().filter(|k| before.contains(*k) || after.contains(*k)).count()
        },
        co_occurrence: {
            let (before, after) = around(text, start, end, CO_OCCURRENCE_CHARS);
            before.chars().chain(after.chars()).any(|c| c.is_ascii_digit() || ('０'..='９').contains(&c))
        },
    };
    let confidence = signals.score();

    let position = Position::new(segment.position.start + start, segment.position.start + end);
    let id = content_id(
        "entity",
        &[entity_type.as_str(), &candidate.normalized, &position.start.to_string()],
    );
    let claim = format!("{}: {}", entity_type.as_str(), candidate.normalized);
    let matched = &segment.text[start..end];

    let mut evidence = vec![(
        EvidenceType::Pattern,
        format!("{}/{} matched \"{}\"", entity_type.as_str(), pattern.subtype, matched),
        pattern.specificity,
    )];
    evidence.push((
        EvidenceType::Rule,
        format!("{} ({})", candidate.rule, candidate.lexicon.as_str()),
        match candidate.lexicon {
            LexiconMatch::Exact => 1.0,
            LexiconMatch::Fuzzy { .. } => 0.5,
            LexiconMatch::None => 0.3,
        },
    ));
    let mut attributes = candidate.attributes;
    if let Some(m) = marker {
        attributes.insert("marker".to_string(), json!(m));
        evidence.push((EvidenceType::Textual, format!("marker \"{m}\" near term"), 0.8));
    }
    let evidence = evidence
        .into_iter()
        .enumerate()
        .map(|(i, (evidence_type, content, conf))| Evidence {
            id: content_id("evidence", &[&id.to_string(), &i.to_string()]),
            evidence_type,
            source: "entity_extractor".to_string(),
            content,
            position: Some(position),
            confidence: conf,
            supported_claim: claim.clone(),
        })
        .collect();

    let validation_status = match candidate.lexicon {
        LexiconMatch::Exact => ValidationStatus::Validated,
        LexiconMatch::Fuzzy { .. } => ValidationStatus::Plausible,
        LexiconMatch::None if pattern.subtype == "bare_measure" => ValidationStatus::Unverified,
        LexiconMatch::None => ValidationStatus::Plausible,
    };

    Entity {
        id,
        entity_type,
        subtype: pattern.subtype.to_string(),
        text: matched.to_string(),
        normalized_text: candidate.normalized,
        value: candidate.value,
        unit: candidate.unit,
        confidence,
        position,
        segment_id: segment.id,
        context: window_slice(text, start, end, SNIPPET_CHARS)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        attributes,
        relations: Vec::new(),
        evidence,
        validation_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationType;
    use crate::pipeline::segmentation::Segmenter;

    fn run(text: &str) -> Vec<Entity> {
        let config = PipelineConfig::default();
        let segments = Segmenter::new(&config).unwrap().segment(&[text.to_string()]);
        EntityExtractor::new(&config).unwrap().extract(&segments)
    }

    fn find<'a>(entities: &'a [Entity], entity_type: EntityType, needle: &str) -> Option<&'a Entity> {
        entities
            .iter()
            .find(|e| e.entity_type == entity_type && e.text.contains(needle))
    }

    #[test]
    fn dictionary_diagnosis_with_marker() {
        let entities = run("2024년 3월 15일 진료... 위궤양 진단");
        let dx = find(&entities, EntityType::Diagnosis, "위궤양").expect("diagnosis");
        assert_eq!(dx.normalized_text, "위궤양");
        assert_eq!(dx.validation_status, ValidationStatus::Validated);
        assert!(dx.confidence >= 0.9, "confidence {}", dx.confidence);
        assert_eq!(dx.attributes["marker"], json!("진단"));
        assert!(dx.evidence.iter().any(|e| e.evidence_type == EvidenceType::Pattern));
    }

    #[test]
    fn anatomy_not_split_out_of_diagnosis() {
        let entities = run("2024년 3월 15일 진료... 위궤양 진단");
        assert!(find(&entities, EntityType::Anatomy, "위").is_none());
    }

    #[test]
    fn dose_expression_captures_value_and_unit() {
        let entities = run("2024-03-15 외래 진료. 위궤양 진단 후 Omeprazole 20mg 1일 1회 처방");
        let med = find(&entities, EntityType::Medication, "Omeprazole").expect("medication");
        assert_eq!(med.subtype, "dosage");
        assert_eq!(med.normalized_text, "omeprazole");
        assert_eq!(med.value.as_deref(), Some("20"));
        assert_eq!(med.unit.as_deref(), Some("mg"));
        assert_eq!(med.validation_status, ValidationStatus::Validated);
    }

    #[test]
    fn ocr_damaged_drug_name_is_corrected() {
        let entities = run("2024-03-15 외래 진료. 당뇨병 진단, Metfonnin 처방 및 복용 지도");
        let med = find(&entities, EntityType::Medication, "Metfonnin").expect("medication");
        assert_eq!(med.normalized_text, "metformin");
        assert_eq!(med.attributes["lexiconTerm"], json!("metformin"));
        assert_eq!(med.validation_status, ValidationStatus::Plausible);
    }

    #[test]
    fn kcd_code_resolves_name() {
        let entities = run("2024-03-15 외래 진료. 상병코드 K25.9 위궤양 진단");
        let code = find(&entities, EntityType::Diagnosis, "K25.9").expect("kcd code");
        assert_eq!(code.subtype, "kcd_code");
        assert!(code.attributes["kcdName"].as_str().unwrap().contains("위궤양"));
    }

    #[test]
    fn retired_kcd_code_flagged() {
        let entities = run("2024-03-15 외래 진료. 상병코드 I84 치핵 진단");
        let code = find(&entities, EntityType::Diagnosis, "I84").expect("kcd code");
        assert_eq!(code.attributes["deprecated_code"], json!(true));
        assert_eq!(code.attributes["replacementCode"], json!("K64"));
    }

    #[test]
    fn blood_pressure_and_lab_values() {
        let entities = run("2024-03-15 외래 진료. 혈압 130/85 mmHg, 혈당 126 mg/dL 검사 결과 확인");
        let bp = entities
            .iter()
            .find(|e| e.entity_type == EntityType::Value && e.normalized_text == "blood_pressure")
            .expect("bp");
        assert_eq!(bp.value.as_deref(), Some("130/85"));
        assert_eq!(bp.unit.as_deref(), Some("mmHg"));
        let glucose = entities
            .iter()
            .find(|e| e.entity_type == EntityType::Value && e.normalized_text == "혈당")
            .expect("glucose");
        assert_eq!(glucose.value.as_deref(), Some("126"));
    }

    #[test]
    fn lateral_anatomy_records_side() {
        let entities = run("2024-03-15 정형외과 외래 진료. 우측 무릎 통증으로 검사 시행");
        let knee = find(&entities, EntityType::Anatomy, "무릎").expect("anatomy");
        assert_eq!(knee.normalized_text, "무릎");
        assert_eq!(knee.attributes["laterality"], json!("우측"));
    }

    #[test]
    fn plain_prose_yields_nothing() {
        let entities = run("환자는 오늘 기분이 좋다고 말하였고 특별한 호소는 없었음");
        assert!(entities.is_empty(), "{entities:?}");
    }

    #[test]
    fn no_duplicates_on_key() {
        let text = "2024-03-15 외래 진료 위궤양 진단. ".repeat(6);
        let entities = run(&text);
        let mut keys: Vec<_> = entities.iter().map(|e| e.dedup_key()).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn positions_point_at_entity_text() {
        let text = "2024-03-15 외래 진료. 위궤양 진단 후 Omeprazole 20mg 1일 1회 처방, 위내시경 검사 시행";
        for e in run(text) {
            assert_eq!(&text[e.position.start..e.position.end], e.text);
            assert!((0.0..=1.0).contains(&e.confidence));
        }
    }

    #[test]
    fn relation_links_diagnosis_and_medication() {
        let entities = run("2024-03-15 외래 진료. 위궤양 진단 후 오메프라졸 20mg 1일 1회 처방");
        let dx = find(&entities, EntityType::Diagnosis, "위궤양").unwrap();
        let med = find(&entities, EntityType::Medication, "오메프라졸").unwrap();
        assert!(dx
            .relations
            .iter()
            .any(|r| r.target_id == med.id && r.relation_type == RelationType::TreatedBy));
        assert!(med.relations.iter().any(|r| r.target_id == dx.id));
    }

    #[test]
    fn higher_threshold_filters_more() {
        let text = "2024-03-15 외래 진료. 위궤양 진단 후 오메프라졸 20mg 처방, 우측 무릎 통증";
        let segments = Segmenter::new(&PipelineConfig::default()).unwrap().segment(&[text.to_string()]);
        let loose = EntityExtractor::new(&PipelineConfig { confidence_threshold: 0.3, ..Default::default() })
            .unwrap()
            .extract(&segments);
        let strict = EntityExtractor::new(&PipelineConfig { confidence_threshold: 0.95, ..Default::default() })
            .unwrap()
            .extract(&segments);
        assert!(loose.len() >= strict.len());
        assert!(strict.iter().all(|e| e.confidence + 1e-9 >= 0.95));
    }

    #[test]
    fn word_end_rules() {
        assert!(ends_word(""));
        assert!(ends_word(" 진단"));
        assert!(ends_word("으로 치료"));
        assert!(ends_word("진단"));
        assert!(!ends_word("원"));
        assert!(!ends_word("가능성"));
    }
}
