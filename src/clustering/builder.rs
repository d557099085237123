//! Offset-band clustering of seed hits.
//!
//! Every hit predicts where the query starts on the subject
//! (`subject_pos - query_pos`). Hits whose predictions fall in a band of
//! width `max(tolerance, tolerance_fraction * query_length)` are taken as one
//! consistent placement. The densest band becomes the primary cluster; a
//! second band is only kept when it looks like the other end of the subject.

use super::types::Cluster;
use crate::graph_opt::ClusteringParams;
use crate::seeding::KmerHit;

/// Share of the raw hits the primary cluster must hold to skip the second pass.
const PRIMARY_MAJORITY: f64 = 0.8;

pub struct ClusterBuilder<'a> {
    params: &'a ClusteringParams,
    seed_length: usize,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(params: &'a ClusteringParams, seed_length: usize) -> Self {
        Self {
            params,
            seed_length,
        }
    }

    fn band_width(&self, query_length: usize) -> i64 {
        let scaled = (self.params.tolerance_fraction * query_length as f64).round() as i64;
        self.params.tolerance.max(scaled)
    }

    /// All clusters found in `hits`, primary first. At most two are built.
    pub fn cluster_hits(
        &self,
        subject_id: u32,
        query_length: usize,
        subject_length: usize,
        mut hits: Vec<KmerHit>,
        reference_hits: f64,
    ) -> Vec<Cluster> {
        let mut clusters = Vec::with_capacity(2);
        if hits.is_empty() {
            return clusters;
        }
        let total = hits.len();
        let band = self.band_width(query_length);
        hits.sort_by_key(|h| (h.predicted_start(), h.query_pos, h.subject_pos));

        let (lo, hi) = densest_band(&hits, band);
        let Some(primary) =
            self.build(subject_id, query_length, subject_length, &hits[lo..hi], reference_hits)
        else {
            return clusters;
        };
        clusters.push(primary);
        if (hi - lo) as f64 > PRIMARY_MAJORITY * total as f64 {
            return clusters;
        }

        // Unclaimed hits keep their sort order
        hits.drain(lo..hi);
        if hits.is_empty() {
            return clusters;
        }
        let (lo2, hi2) = densest_band(&hits, band);
        if let Some(second) =
            self.build(subject_id, query_length, subject_length, &hits[lo2..hi2], reference_hits)
        {
            clusters.push(second);
        }
        clusters
    }

    /// Primary cluster plus, when it qualifies, a second cluster with
    /// comparable support that places the query at the opposite subject end.
    pub fn build_clusters(
        &self,
        subject_id: u32,
        query_length: usize,
        subject_length: usize,
        hits: Vec<KmerHit>,
        reference_hits: f64,
    ) -> Vec<Cluster> {
        let mut clusters =
            self.cluster_hits(subject_id, query_length, subject_length, hits, reference_hits);
        if clusters.len() < 2 {
            return clusters;
        }
        let keep_second = {
            let (first, second) = (&clusters[0], &clusters[1]);
            let query_before = first.subject_predicted_start < 0;
            second.num_different_kmers as f64
                > self.params.second_cluster_ratio * first.num_different_kmers as f64
                && query_before != (second.subject_predicted_start < 0)
        };
        if !keep_second {
            clusters.truncate(1);
        }
        clusters
    }

    // Function to reduce band hits to one per query seed: the hit whose
    // predicted start is closest to the band median
    fn build(
        &self,
        subject_id: u32,
        query_length: usize,
        subject_length: usize,
        band_hits: &[KmerHit],
        reference_hits: f64,
    ) -> Option<Cluster> {
        if band_hits.is_empty() {
            return None;
        }
        let median = band_hits[(band_hits.len() - 1) / 2].predicted_start();
        let mut by_query: Vec<KmerHit> = band_hits.to_vec();
        by_query.sort_by_key(|h| {
            (
                h.query_pos,
                (h.predicted_start() - median).unsigned_abs(),
                h.subject_pos,
            )
        });
        by_query.dedup_by_key(|h| h.query_pos);
        Cluster::from_hits(
            subject_id,
            query_length,
            subject_length,
            self.seed_length,
            by_query,
            band_hits,
            reference_hits,
        )
    }
}

// Function to find the half-open range of hits (sorted by predicted start)
// holding the most hits within `band`; ties keep the leftmost range
fn densest_band(sorted: &[KmerHit], band: i64) -> (usize, usize) {
    let mut best = (0, 0);
    let mut lo = 0;
    for hi in 0..sorted.len() {
        while sorted[hi].predicted_start() - sorted[lo].predicted_start() > band {
            lo += 1;
        }
        if hi + 1 - lo > best.1 - best.0 {
            best = (lo, hi + 1);
        }
    }
    best
}
