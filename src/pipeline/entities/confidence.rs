use super::lexicon::LexiconMatch;
use crate::models::EntityType;
use crate::pipeline::text::clamp_unit;

/// Bonus weights for entity confidence fusion.
pub mod weights {
    /// Exact lexicon hit. A fuzzy hit earns half.
    pub const DICTIONARY: f64 = 0.30;

    /// Explicit family marker right before or after the term.
    pub const MARKER: f64 = 0.20;

    /// Family context keywords in the surrounding text, at full strength.
    pub const CONTEXT: f64 = 0.15;

    /// A number or date close to the term.
    pub const CO_OCCURRENCE: f64 = 0.10;

    /// Per repeated occurrence of the same term in the document.
    pub const REPEAT_SUPPORT: f64 = 0.05;
    pub const REPEAT_SUPPORT_MAX: f64 = 0.10;

    /// Single-character terms are weak evidence.
    pub const SHORT_TERM_PENALTY: f64 = 0.10;
}

/// Marker search distance, in characters.
pub const MARKER_BEFORE_CHARS: usize = 15;
pub const MARKER_AFTER_CHARS: usize = 8;
/// Context keyword search distance, in characters each side.
pub const CONTEXT_WINDOW_CHARS: usize = 120;
/// Number/date co-occurrence distance, in characters each side.
pub const CO_OCCURRENCE_CHARS: usize = 40;

/// Explicit markers per family.
pub fn markers(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Diagnosis => &["진단명", "상병명", "병명", "진단", "의증", "소견", "Dx", "diagnosis", "r/o", "impression"],
        EntityType::Procedure => &["수술명", "시술명", "시행", "실시", "받음", "예정", "하에", "procedure"],
        EntityType::Medication => &["약품명", "처방", "투약", "복용", "투여", "Rx", "medication"],
        EntityType::Anatomy => &["부위", "병변", "통증", "site"],
        EntityType::Value => &["결과", "수치", "측정", "result"],
    }
}

/// Context keywords per family.
pub fn context_keywords(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Diagnosis => &["진료", "진단", "소견", "질환", "치료", "병력", "입원", "외래"],
        EntityType::Procedure => &["수술", "시술", "검사", "마취", "입원", "결과", "소견"],
        EntityType::Medication => &["처방", "투약", "복용", "용법", "1일", "회", "약"],
        EntityType::Anatomy => &["통증", "부위", "검사", "소견", "병변", "수술"],
        EntityType::Value => &["검사", "수치", "결과", "정상", "혈액", "측정"],
    }
}

/// Signals collected for one candidate match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSignals {
    pub specificity: f64,
    pub lexicon: LexiconMatch,
    pub marker: bool,
    /// Distinct context keywords found.
    pub context_hits: usize,
    pub co_occurrence: bool,
}

impl ConfidenceSignals {
    pub fn score(&self) -> f64 {
        let dictionary = match self.lexicon {
            LexiconMatch::Exact => weights::DICTIONARY,
            LexiconMatch::Fuzzy { .. } => weights::DICTIONARY / 2.0,
            LexiconMatch::None => 0.0,
        };
        let marker = if self.marker { weights::MARKER } else { 0.0 };
        // Two distinct keywords saturate the context bonus.
        let context = weights::CONTEXT * (self.context_hits.min(2) as f64 / 2.0);
        let co = if self.co_occurrence { weights::CO_OCCURRENCE } else { 0.0 };
        clamp_unit(self.specificity + dictionary + marker + context + co)
    }
}

/// Document-level adjustment applied after deduplication.
pub fn post_adjust(confidence: f64, occurrences: usize, normalized_chars: usize) -> f64 {
    let support = (occurrences.saturating_sub(1) as f64 * weights::REPEAT_SUPPORT)
        .min(weights::REPEAT_SUPPORT_MAX);
    let penalty = if normalized_chars <= 1 { weights::SHORT_TERM_PENALTY } else { 0.0 };
    clamp_unit(confidence + support - penalty)
}
