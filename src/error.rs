//! Error types for graph construction.
//!
//! `GraphBuildError` values abort a build. `PairError` values describe why a
//! single (query, subject) pair produced no relationship; they are logged by
//! the worker and never leave it.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphBuildError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Configuration(Vec<String>),

    #[error("worker pool did not drain within {budget:?}: {completed} of {total} sequences processed")]
    PoolTimeout {
        budget: Duration,
        completed: usize,
        total: usize,
    },

    #[error("worker for sequence {sequence_id} stopped without reporting completion")]
    WorkerLost { sequence_id: usize },

    #[error("failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("no sequences to build a graph from")]
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    #[error("alignment failed for query {query} against subject {subject}: {reason}")]
    AlignmentFailure {
        query: usize,
        subject: usize,
        reason: String,
    },

    #[error(
        "inconsistent geometry for query {query} (length {query_length}) against subject {subject} \
         (length {subject_length}): predicted subject window {start}..{end}"
    )]
    InconsistentGeometry {
        query: usize,
        subject: usize,
        query_length: usize,
        subject_length: usize,
        start: i64,
        end: i64,
    },
}
