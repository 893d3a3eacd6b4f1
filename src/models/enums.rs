use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serde wire value is the same literal as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ContextType {
    Hospital => "hospital",
    Department => "department",
    Visit => "visit",
    Procedure => "procedure",
    General => "general",
});

str_enum!(MedicalDomain {
    Gastroenterology => "gastroenterology",
    Orthopedics => "orthopedics",
    Cardiology => "cardiology",
    Oncology => "oncology",
    Neurology => "neurology",
    Endocrinology => "endocrinology",
    Respiratory => "respiratory",
});

str_enum!(EntityType {
    Diagnosis => "diagnosis",
    Procedure => "procedure",
    Medication => "medication",
    Anatomy => "anatomy",
    Value => "value",
});

str_enum!(EvidenceType {
    Textual => "textual",
    Pattern => "pattern",
    Rule => "rule",
    Inference => "inference",
});

// validated: exact lexicon hit; plausible: suffix/shape rule or fuzzy lexicon hit.
str_enum!(ValidationStatus {
    Validated => "validated",
    Plausible => "plausible",
    Unverified => "unverified",
});

str_enum!(RelationType {
    TreatedBy => "treated_by",
    AddressedBy => "addressed_by",
    LocatedAt => "located_at",
    MeasuredBy => "measured_by",
});

str_enum!(TemporalRelationType {
    LeadsTo => "leads_to",
    TreatedBy => "treated_by",
    FollowedBy => "followed_by",
    EvaluatedBy => "evaluated_by",
});

str_enum!(RelationDirection {
    Forward => "forward",
    Backward => "backward",
});
