use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ContextType, MedicalDomain};

/// Half-open byte span `[start, end)` into the original document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl Position {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, other: &Position) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Shift a segment-relative span into document coordinates.
    pub fn offset(&self, by: usize) -> Position {
        Position::new(self.start + by, self.end + by)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub text: String,
    /// Page the segment starts on.
    pub source_index: usize,
    pub context_type: ContextType,
    pub medical_domain: Option<MedicalDomain>,
    pub confidence: f64,
    pub position: Position,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_containment() {
        let outer = Position::new(10, 50);
        assert!(outer.contains(&Position::new(10, 50)));
        assert!(outer.contains(&Position::new(20, 30)));
        assert!(!outer.contains(&Position::new(5, 30)));
        assert!(!outer.contains(&Position::new(40, 51)));
    }

    #[test]
    fn position_offset_and_len() {
        let p = Position::new(3, 9).offset(100);
        assert_eq!(p, Position::new(103, 109));
        assert_eq!(p.len(), 6);
        assert!(Position::new(4, 4).is_empty());
    }

    #[test]
    fn segment_serializes_camel_case() {
        let segment = Segment {
            id: Uuid::nil(),
            text: "외래 진료".into(),
            source_index: 0,
            context_type: ContextType::Visit,
            medical_domain: None,
            confidence: 0.5,
            position: Position::new(0, 13),
            metadata: BTreeMap::new(),
        };
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["contextType"], "visit");
        assert_eq!(json["sourceIndex"], 0);
        assert_eq!(json["position"]["end"], 13);
        assert!(json["medicalDomain"].is_null());
    }
}
