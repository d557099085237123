//! Relationship classification
//!
//! This module contains:
//! - `types`: the edge/embedding variant committed to the graph
//! - `classifier`: geometric rules and the alignment refinement

mod classifier;
mod types;

pub use classifier::{
    classify, pass_filters, place, ClassifiedCluster, Decision, PairContext, Placement,
    RelationshipClassifier,
};
pub use types::AssemblySequencesRelationship;
