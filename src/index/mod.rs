//! Read-only full-text index over every input read.

pub mod bwt;
pub mod fm_index;
pub mod sequence_index;

pub use sequence_index::SequenceIndex;

/// One exact occurrence of a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexHit {
    pub sequence_id: u32,
    /// Offset of the occurrence inside its sequence (forward strand).
    pub start: u32,
}

/// Exact-match seed lookups shared by all worker threads.
///
/// Implementations are immutable once built. Seeds are 2-bit encoded; a seed
/// containing an ambiguous code has no occurrences.
pub trait SeedIndex: Sync {
    /// Number of occurrences of `seed`, without locating them.
    fn count(&self, seed: &[u8]) -> usize;

    /// Every occurrence of `seed`, sorted by (sequence id, start).
    fn search(&self, seed: &[u8]) -> Vec<IndexHit>;
}
