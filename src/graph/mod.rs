//! Overlap graph
//!
//! This module contains:
//! - `vertex`: the two extremities of every read
//! - `edge`: overlap edges and their evidence
//! - `embedding`: containment records
//! - `assembly_graph`: the store mutated by the graph builder

mod assembly_graph;
mod edge;
mod embedding;
mod vertex;

pub use assembly_graph::{AssemblyGraph, CommitSummary};
pub use edge::{AssemblyEdge, OverlapEvidence};
pub use embedding::AssemblyEmbedded;
pub use vertex::{AssemblyVertex, VertexEnd};
