//! Public API surface for the scheduling engine.
//!
//! This file consolidates the identifier newtypes and re-exports the
//! outcome DTO types defined next to their services. All types derive
//! Serialize/Deserialize for JSON serialization.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::conflict::{Conflict, ConflictKind, Placement};
pub use crate::db::{EntryQuery, IdentifierFilter};
pub use crate::services::compare::{AlgorithmReport, CompareRequest, ComparisonOutcome};
pub use crate::services::genetic::{
    FitnessReport, Gene, GeneticMetadata, GeneticOutcome, GeneticParams, GeneticRequest,
};
pub use crate::services::graph::{
    ColoringMetadata, ColoringOutcome, ColoringStrategy, GraphColoringRequest,
};
pub use crate::services::greedy::{GreedyOutcome, GreedyRequest, UnscheduledSession};
pub use crate::services::timetable::{EntryDraft, EntryPatch, Requester};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn value(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }
    };
}

string_id!(
    /// Course identifier.
    CourseId
);
string_id!(
    /// Student-group identifier.
    GroupId
);
string_id!(
    /// Teacher identifier.
    TeacherId
);
string_id!(
    /// Classroom identifier.
    ClassroomId
);
string_id!(
    /// Timetable-entry identifier.
    EntryId
);

impl EntryId {
    /// Mint a fresh identifier for a generated entry.
    pub fn generate() -> Self {
        EntryId(uuid::Uuid::new_v4().to_string())
    }
}
