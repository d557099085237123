//! Graph construction pipeline
//!
//! This module contains:
//! - `builder`: the worker pool driver and the `GraphBuilder` trait
//! - `edges_finder`: the per-read search (seeding, clustering, classification)
//! - `workspace`: thread-local buffers reused across reads

pub mod builder;
pub mod edges_finder;
pub mod workspace;

pub use builder::{corpus_average, GraphBuilder, GraphBuilderFmIndex};
pub use edges_finder::{min_hits, KmerHitsEdgesFinder, QueryRelationships, SelfCalibration};
