//! Cluster of seed hits between one query orientation and one subject.

use crate::seeding::KmerHit;
use crate::utils::{mean_and_sd, sorted_median};

/// Alignment statistics estimated from the seed chain of a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulatedAlignment {
    /// Query bases covered by at least one seed
    pub coverage: usize,
    /// Covered bases, each seed weighted by its multiplicity
    pub weighted_coverage: usize,
    /// Sum of offset changes between consecutive seeds
    pub indels: usize,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub subject_id: u32,
    pub query_length: usize,
    pub subject_length: usize,
    pub seed_length: usize,
    /// One hit per query seed, sorted by query position
    hits: Vec<KmerHit>,
    /// Per-hit weight, parallel to `hits`
    weights: Vec<f64>,

    pub num_different_kmers: usize,
    pub weighted_count: f64,
    pub raw_kmer_hits: usize,
    pub raw_kmer_hits_start_sd: f64,

    /// Predicted window on the subject; the end is inclusive and either end
    /// may fall outside the subject
    pub subject_predicted_start: i64,
    pub subject_predicted_end: i64,
    /// Predicted window on the query, clipped to the query
    pub query_predicted_start: i64,
    pub query_predicted_end: i64,

    /// Matched spans, half-open
    pub query_evidence_start: usize,
    pub query_evidence_end: usize,
    pub subject_evidence_start: usize,
    pub subject_evidence_end: usize,

    pub predicted_overlap: i64,
    pub average_predicted_overlap: i64,
    pub median_predicted_overlap: i64,
    pub from_limits_predicted_overlap: i64,
    /// Standard deviation of the per-hit predicted subject start
    pub predicted_start_sd: f64,
}

impl Cluster {
    /// Build a cluster from hits already reduced to one per query seed.
    ///
    /// `raw` are all hits that fell in the cluster band, used for the raw
    /// statistics. `reference_hits` is the multiplicity at which a seed
    /// still gets full weight. Returns `None` for an empty hit list.
    pub fn from_hits(
        subject_id: u32,
        query_length: usize,
        subject_length: usize,
        seed_length: usize,
        mut hits: Vec<KmerHit>,
        raw: &[KmerHit],
        reference_hits: f64,
    ) -> Option<Self> {
        if hits.is_empty() {
            return None;
        }
        hits.sort_by_key(|h| (h.query_pos, h.subject_pos));
        let first = hits[0];
        let last = hits[hits.len() - 1];
        let qlen = query_length as i64;
        let slen = subject_length as i64;

        let subject_predicted_start = first.predicted_start();
        let subject_predicted_end = last.subject_pos as i64 + (qlen - last.query_pos as i64) - 1;
        let query_predicted_start = (first.query_pos as i64 - first.subject_pos as i64).max(0);
        let query_predicted_end =
            (last.query_pos as i64 + (slen - 1 - last.subject_pos as i64)).min(qlen - 1);

        let k = seed_length;
        let query_evidence_start = first.query_pos as usize;
        let query_evidence_end = (last.query_pos as usize + k).min(query_length);
        let subject_evidence_start = hits.iter().map(|h| h.subject_pos).min().unwrap_or(0) as usize;
        let subject_evidence_end = hits
            .iter()
            .map(|h| h.subject_pos as usize + k)
            .max()
            .unwrap_or(0)
            .min(subject_length);

        let mut overlaps: Vec<i64> = hits
            .iter()
            .map(|h| {
                let ps = h.predicted_start();
                ((ps + qlen).min(slen) - ps.max(0)).max(0)
            })
            .collect();
        let (mean_overlap, _) = mean_and_sd(overlaps.iter().map(|&o| o as f64));
        overlaps.sort_unstable();
        let median_predicted_overlap = sorted_median(&overlaps).unwrap_or(0);
        let from_limits_predicted_overlap =
            ((subject_predicted_end + 1).min(slen) - subject_predicted_start.max(0)).max(0);

        let (_, predicted_start_sd) = mean_and_sd(hits.iter().map(|h| h.predicted_start() as f64));
        let (_, raw_kmer_hits_start_sd) = mean_and_sd(raw.iter().map(|h| h.predicted_start() as f64));

        let weights: Vec<f64> = hits
            .iter()
            .map(|h| {
                let n = h.total_hits as f64;
                if n <= reference_hits {
                    1.0
                } else {
                    reference_hits / n
                }
            })
            .collect();
        let weighted_count = weights.iter().sum();

        Some(Cluster {
            subject_id,
            query_length,
            subject_length,
            seed_length,
            num_different_kmers: hits.len(),
            weighted_count,
            raw_kmer_hits: raw.len(),
            raw_kmer_hits_start_sd,
            subject_predicted_start,
            subject_predicted_end,
            query_predicted_start,
            query_predicted_end,
            query_evidence_start,
            query_evidence_end,
            subject_evidence_start,
            subject_evidence_end,
            predicted_overlap: from_limits_predicted_overlap,
            average_predicted_overlap: mean_overlap.round() as i64,
            median_predicted_overlap,
            from_limits_predicted_overlap,
            predicted_start_sd,
            hits,
            weights,
        })
    }

    pub fn hits(&self) -> &[KmerHit] {
        &self.hits
    }

    #[inline]
    pub fn query_evidence_length(&self) -> usize {
        self.query_evidence_end - self.query_evidence_start
    }

    #[inline]
    pub fn subject_evidence_length(&self) -> usize {
        self.subject_evidence_end - self.subject_evidence_start
    }

    /// Release the hit list. Summary statistics stay valid.
    pub fn dispose_hits(&mut self) {
        self.hits = Vec::new();
        self.weights = Vec::new();
    }

    pub fn is_disposed(&self) -> bool {
        self.hits.is_empty()
    }

    /// Estimate alignment statistics from the seed chain.
    ///
    /// Must be called before `dispose_hits`.
    pub fn simulate_alignment(&self) -> SimulatedAlignment {
        let k = self.seed_length;
        let mut result = SimulatedAlignment::default();
        let mut covered_end = 0usize;
        let mut weighted = 0.0;
        let mut previous: Option<&KmerHit> = None;
        for (hit, &w) in self.hits.iter().zip(self.weights.iter()) {
            let start = (hit.query_pos as usize).max(covered_end);
            let end = hit.query_pos as usize + k;
            if end > start {
                result.coverage += end - start;
                weighted += (end - start) as f64 * w;
            }
            covered_end = covered_end.max(end);
            if let Some(prev) = previous {
                let dq = hit.query_pos as i64 - prev.query_pos as i64;
                let ds = hit.subject_pos as i64 - prev.subject_pos as i64;
                result.indels += (ds - dq).unsigned_abs() as usize;
            }
            previous = Some(hit);
        }
        result.weighted_coverage = weighted.round() as usize;
        result
    }
}
