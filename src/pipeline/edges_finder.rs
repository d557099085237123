//! Per-read relationship search.
//!
//! For one query read the finder collects seed hits in both orientations,
//! calibrates the minimum hit count on the read's own self cluster, ranks
//! the candidate subjects and classifies their clusters. Only the read-only
//! index and the thread-local workspace are touched; the graph is not.

use crate::clustering::{Cluster, ClusterBuilder};
use crate::defaults::{DEF_MIN_HITS, INTERLEAVED_CANDIDATES, MIN_CLUSTER_SIZE_DIVISOR};
use crate::graph::OverlapEvidence;
use crate::graph_opt::{ClassifierParams, ClusteringParams, GraphOpt, SeedingParams};
use crate::index::SeedIndex;
use crate::relationships::{AssemblySequencesRelationship, PairContext, RelationshipClassifier};
use crate::seeding::{HitCollector, HitTable};
use crate::sequence::ReadSequence;
use crate::utils::{encode_into, reverse_complement_into};

use super::workspace::OverlapWorkspace;

/// Statistics of a read against itself, stored on its same-sequence edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfCalibration {
    pub evidence: OverlapEvidence,
    pub overlap_sd: f64,
}

/// Everything one query produced, ready to be committed.
#[derive(Debug, Clone, Default)]
pub struct QueryRelationships {
    pub query_id: usize,
    pub relationships: Vec<AssemblySequencesRelationship>,
    pub calibration: Option<SelfCalibration>,
    /// Pairs dropped with a logged `PairError`
    pub pair_errors: usize,
    /// The search stopped on a conclusive embedding
    pub stopped_early: bool,
}

/// Minimum distinct seeds a subject must share with the query to be
/// clustered.
///
/// Starts from `self_hits * min_proportion_overlap`, is capped by the same
/// proportion of the self cluster seeds, and never drops below
/// `DEF_MIN_HITS`. Early-exit search doubles it.
pub fn min_hits(
    self_hits: usize,
    self_cluster_kmers: Option<usize>,
    min_proportion_overlap: f64,
    extensive_search: bool,
) -> usize {
    let mut min_hits = ((self_hits as f64 * min_proportion_overlap) as usize).max(DEF_MIN_HITS);
    if let Some(kmers) = self_cluster_kmers {
        min_hits = min_hits.min((min_proportion_overlap * kmers as f64) as usize);
        min_hits = min_hits.max(DEF_MIN_HITS);
    }
    if !extensive_search {
        min_hits *= 2;
    }
    min_hits
}

// Query-side state threaded through the candidate loop
struct QueryState<'w> {
    query_id: usize,
    forward: &'w [u8],
    reverse: &'w [u8],
    forward_seeds: usize,
    reverse_seeds: usize,
    subject_codes: &'w mut Vec<u8>,
    dp: &'w mut crate::alignment::DpBuffers,
    min_cluster_size: usize,
    result: QueryRelationships,
}

pub struct KmerHitsEdgesFinder<'a, I: SeedIndex + ?Sized> {
    index: &'a I,
    sequences: &'a [ReadSequence],
    seeding: SeedingParams,
    clustering: ClusteringParams,
    classifier: ClassifierParams,
    extensive_search: bool,
    corpus_average: Option<f64>,
}

impl<'a, I: SeedIndex + ?Sized> KmerHitsEdgesFinder<'a, I> {
    pub fn new(
        index: &'a I,
        sequences: &'a [ReadSequence],
        opt: &GraphOpt,
        corpus_average: Option<f64>,
    ) -> Self {
        Self {
            index,
            sequences,
            seeding: opt.seeding_params(),
            clustering: opt.clustering_params(),
            classifier: opt.classifier_params(),
            extensive_search: opt.extensive_search,
            corpus_average,
        }
    }

    /// Relationships between `query_id` and reads with a smaller id.
    pub fn infer_relationships(&self, query_id: usize, ws: &mut OverlapWorkspace) -> QueryRelationships {
        ws.clear();
        let mut result = QueryRelationships {
            query_id,
            ..QueryRelationships::default()
        };
        let Some(query) = self.sequences.get(query_id) else {
            return result;
        };
        let qlen = query.len();
        let k = self.seeding.seed_length;
        if qlen < k {
            log::debug!("Query {query_id} shorter than the seed length ({qlen} < {k})");
            return result;
        }

        encode_into(&query.characters, &mut ws.encoded_query);
        reverse_complement_into(&ws.encoded_query, &mut ws.encoded_query_rc);
        let collector = HitCollector::new(self.index, &self.seeding, self.corpus_average);
        let mut forward = collector.collect(query_id, &ws.encoded_query, false, &mut ws.seeds, &mut ws.counts);
        let mut reverse = collector.collect(query_id, &ws.encoded_query_rc, true, &mut ws.seeds, &mut ws.counts);

        let builder = ClusterBuilder::new(&self.clustering, k);
        let self_hits = std::mem::take(&mut forward.self_hits);
        let self_hits_count = self_hits.len();
        let self_cluster = builder
            .cluster_hits(query_id as u32, qlen, qlen, self_hits, forward.reference_hits)
            .into_iter()
            .max_by_key(|c| c.num_different_kmers);
        let self_kmers = self_cluster.as_ref().map(|c| c.num_different_kmers);
        result.calibration = self_cluster.as_ref().map(|c| {
            let sim = c.simulate_alignment();
            SelfCalibration {
                evidence: OverlapEvidence {
                    num_shared_kmers: c.num_different_kmers,
                    raw_kmer_hits: c.raw_kmer_hits,
                    raw_kmer_hits_start_sd: c.raw_kmer_hits_start_sd,
                    coverage_shared_kmers: sim.coverage,
                    weighted_coverage_shared_kmers: sim.weighted_coverage,
                    ..OverlapEvidence::default()
                },
                overlap_sd: c.predicted_start_sd,
            }
        });
        drop(self_cluster);

        let min_hits = min_hits(
            self_hits_count,
            self_kmers,
            self.classifier.min_proportion_overlap,
            self.extensive_search,
        );
        let subjects_forward = forward.filter_and_sort_subjects(min_hits);
        let subjects_reverse = reverse.filter_and_sort_subjects(min_hits);
        log::debug!(
            "Query {} length {}: seeds {}/{}, average hits {:.2}, reference hits {:.2}, repetitive {}/{}, \
             self hits {}, min hits {}, candidates {}+{}",
            query_id,
            qlen,
            forward.num_seeds,
            reverse.num_seeds,
            forward.average_hits,
            forward.reference_hits,
            forward.repetitive_seeds,
            reverse.repetitive_seeds,
            self_hits_count,
            min_hits,
            subjects_forward.len(),
            subjects_reverse.len()
        );
        if subjects_forward.is_empty() && subjects_reverse.is_empty() {
            return result;
        }

        let mut state = QueryState {
            query_id,
            forward: &ws.encoded_query,
            reverse: &ws.encoded_query_rc,
            forward_seeds: forward.informative_seeds,
            reverse_seeds: reverse.informative_seeds,
            subject_codes: &mut ws.encoded_subject,
            dp: &mut ws.dp,
            min_cluster_size: DEF_MIN_HITS,
            result,
        };
        if self.extensive_search {
            self.extensive(
                &mut state,
                &builder,
                &mut forward,
                &mut reverse,
                &subjects_forward,
                &subjects_reverse,
                min_hits,
            );
        } else {
            self.early_exit(&mut state, &builder, &mut forward, &mut reverse, &subjects_forward, &subjects_reverse);
        }
        log::debug!(
            "Query {} relationships {} pair errors {}{}",
            query_id,
            state.result.relationships.len(),
            state.result.pair_errors,
            if state.result.stopped_early { " (conclusive embedding)" } else { "" }
        );
        state.result
    }

    fn clusters_for(
        &self,
        builder: &ClusterBuilder<'_>,
        table: &mut HitTable,
        subject_id: u32,
        qlen: usize,
    ) -> Vec<Cluster> {
        let hits = table.take_subject_hits(subject_id);
        let slen = self.sequences.get(subject_id as usize).map_or(0, ReadSequence::len);
        builder.build_clusters(subject_id, qlen, slen, hits, table.reference_hits)
    }

    // Every candidate of both orientations is clustered before any is classified
    #[allow(clippy::too_many_arguments)]
    fn extensive(
        &self,
        state: &mut QueryState<'_>,
        builder: &ClusterBuilder<'_>,
        forward: &mut HitTable,
        reverse: &mut HitTable,
        subjects_forward: &[u32],
        subjects_reverse: &[u32],
        min_hits: usize,
    ) {
        let qlen = state.forward.len();
        let mut clusters: Vec<(bool, Cluster)> = Vec::new();
        for &subject_id in subjects_forward {
            clusters.extend(self.clusters_for(builder, forward, subject_id, qlen).into_iter().map(|c| (false, c)));
        }
        for &subject_id in subjects_reverse {
            clusters.extend(self.clusters_for(builder, reverse, subject_id, qlen).into_iter().map(|c| (true, c)));
        }
        let max_kmers = clusters.iter().map(|(_, c)| c.num_different_kmers).max().unwrap_or(0);
        state.min_cluster_size = min_hits.max(max_kmers / MIN_CLUSTER_SIZE_DIVISOR);
        for (is_rev, mut cluster) in clusters {
            self.process(state, is_rev, &mut cluster);
        }
    }

    // Forward and reverse candidates alternate for the best ranks; a
    // conclusive embedding ends the search
    fn early_exit(
        &self,
        state: &mut QueryState<'_>,
        builder: &ClusterBuilder<'_>,
        forward: &mut HitTable,
        reverse: &mut HitTable,
        subjects_forward: &[u32],
        subjects_reverse: &[u32],
    ) {
        let qlen = state.forward.len();
        let interleaved = subjects_forward
            .len()
            .min(subjects_reverse.len())
            .min(INTERLEAVED_CANDIDATES);
        for i in 0..interleaved {
            for (is_rev, table, subject_id) in [
                (false, &mut *forward, subjects_forward[i]),
                (true, &mut *reverse, subjects_reverse[i]),
            ] {
                for mut cluster in self.clusters_for(builder, table, subject_id, qlen) {
                    if self.process(state, is_rev, &mut cluster) {
                        state.result.stopped_early = true;
                        return;
                    }
                    state.min_cluster_size = state
                        .min_cluster_size
                        .max(cluster.num_different_kmers / MIN_CLUSTER_SIZE_DIVISOR);
                }
            }
        }
        // The remainder keeps the threshold reached by the interleaved ranks
        if interleaved == INTERLEAVED_CANDIDATES {
            return;
        }
        let remaining = subjects_forward[interleaved..]
            .iter()
            .map(|&id| (false, id))
            .chain(subjects_reverse[interleaved..].iter().map(|&id| (true, id)));
        for (is_rev, subject_id) in remaining {
            let table = if is_rev { &mut *reverse } else { &mut *forward };
            for mut cluster in self.clusters_for(builder, table, subject_id, qlen) {
                if self.process(state, is_rev, &mut cluster) {
                    state.result.stopped_early = true;
                    return;
                }
            }
        }
    }

    // Function to classify one cluster and record the outcome. Returns true
    // when the search for this query can stop.
    fn process(&self, state: &mut QueryState<'_>, is_rev: bool, cluster: &mut Cluster) -> bool {
        let subject_id = cluster.subject_id as usize;
        let subject_codes: &[u8] = if self.classifier.complete_alignment {
            match self.sequences.get(subject_id) {
                Some(subject) => {
                    encode_into(&subject.characters, state.subject_codes);
                    state.subject_codes.as_slice()
                }
                None => &[],
            }
        } else {
            &[]
        };
        let ctx = PairContext {
            query_id: state.query_id,
            query_codes: if is_rev { state.reverse } else { state.forward },
            reverse: is_rev,
            subject_codes,
            num_query_seeds: if is_rev { state.reverse_seeds } else { state.forward_seeds },
        };
        let classifier = RelationshipClassifier::new(&self.classifier);
        let mut conclusive = false;
        match classifier.process_cluster(&ctx, cluster, state.min_cluster_size, state.dp) {
            Ok(Some(classified)) => {
                conclusive = classified.conclusive && !self.extensive_search;
                state.result.relationships.push(classified.relationship);
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!("{err}");
                state.result.pair_errors += 1;
            }
        }
        conclusive
    }
}
