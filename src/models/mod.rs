pub mod bundle;
pub mod entity;
pub mod enums;
pub mod event;
pub mod evidence;
pub mod quality;
pub mod segment;

pub use bundle::CaseBundle;
pub use entity::{Entity, EntityRelation};
pub use enums::*;
pub use event::{Event, TemporalRelation};
pub use evidence::Evidence;
pub use quality::{DimensionScore, QualityBreakdown, QualityGate, QualityReport};
pub use segment::{Position, Segment};
