//! Question Intent Classification.
//!
//! Maps a free-form question to one of a closed set of query archetypes
//! plus extracted filter slots, using a deterministic ordered rule list.

mod classifier;
mod types;

pub use classifier::IntentClassifier;
pub use types::{
    AggregateOp, Archetype, Classification, CompareOp, FilterPredicate, FilterValue, Intent,
    SortDirection,
};
