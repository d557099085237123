//! Core data types for seeding.

use std::collections::BTreeMap;

/// A seed taken from the query at `query_pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    /// Position in the query (in the orientation that was searched)
    pub query_pos: u32,
    /// 2-bit packed seed, used for deduplication
    pub kmer: u64,
}

/// One occurrence of a query seed inside a subject read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerHit {
    pub subject_id: u32,
    /// Start of the occurrence in the subject (forward strand)
    pub subject_pos: u32,
    /// Start of the seed in the query
    pub query_pos: u32,
    /// Occurrences of the seed in other reads, self match excluded
    pub total_hits: u32,
}

impl KmerHit {
    /// Subject coordinate where the query would start if this hit were exact.
    #[inline]
    pub fn predicted_start(&self) -> i64 {
        self.subject_pos as i64 - self.query_pos as i64
    }
}

/// Hits of one query orientation, grouped by subject.
#[derive(Debug, Default)]
pub struct HitTable {
    /// Hits on subjects with a smaller id than the query
    pub hits_by_subject: BTreeMap<u32, Vec<KmerHit>>,
    /// Hits of the forward query on itself
    pub self_hits: Vec<KmerHit>,
    /// Number of distinct seeds extracted from the query
    pub num_seeds: usize,
    /// Non-repetitive seeds with at least one hit on a smaller id
    pub informative_seeds: usize,
    /// Seeds skipped as too repetitive
    pub repetitive_seeds: usize,
    /// Average hits per seed over this query
    pub average_hits: f64,
    /// Multiplicity used to weight hits and to compute the repetitive cutoff
    pub reference_hits: f64,
}

impl HitTable {
    /// Number of distinct query seeds hitting `subject_id`.
    pub fn distinct_query_seeds(&self, subject_id: u32) -> usize {
        let Some(hits) = self.hits_by_subject.get(&subject_id) else {
            return 0;
        };
        let mut positions: Vec<u32> = hits.iter().map(|h| h.query_pos).collect();
        positions.sort_unstable();
        positions.dedup();
        positions.len()
    }

    /// Remove and return the hits of one subject.
    pub fn take_subject_hits(&mut self, subject_id: u32) -> Vec<KmerHit> {
        self.hits_by_subject.remove(&subject_id).unwrap_or_default()
    }

    /// Subjects whose distinct seed count reaches `min_hits`, best first.
    ///
    /// Ties are broken by the lower subject id.
    pub fn filter_and_sort_subjects(&self, min_hits: usize) -> Vec<u32> {
        let mut scored: Vec<(usize, u32)> = self
            .hits_by_subject
            .keys()
            .map(|&id| (self.distinct_query_seeds(id), id))
            .filter(|&(count, _)| count >= min_hits)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, id)| id).collect()
    }

    pub fn total_hits(&self) -> usize {
        self.hits_by_subject.values().map(Vec::len).sum()
    }
}
