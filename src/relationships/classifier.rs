//! Turns one cluster into an edge, an embedding or nothing.
//!
//! The geometric decision (`classify`) is a pure function of the cluster and
//! the two read lengths. `RelationshipClassifier` wraps it with relationship
//! construction and, when complete alignment is enabled, with a banded local
//! alignment that refines the coordinates before the decision is re-taken.

use super::types::AssemblySequencesRelationship;
use crate::alignment::{band_within_budget, BandedPairWiseSW, DpBuffers, LocalAlignment};
use crate::clustering::{Cluster, SimulatedAlignment};
use crate::defaults::{MAX_BAND_WIDTH, MIN_EDGE_EVIDENCE_RATIO, MIN_QUERY_COVERAGE};
use crate::error::PairError;
use crate::graph::{AssemblyEdge, AssemblyEmbedded, AssemblyVertex, OverlapEvidence};
use crate::graph_opt::ClassifierParams;

/// Where the query falls relative to the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Embedded,
    /// The query runs past the subject end
    QueryAfterSubject,
    /// The query starts before the subject start
    QueryBeforeSubject,
    /// The query runs past both subject ends
    Inconsistent,
}

/// Placement of a predicted subject window `start..=end`.
pub fn place(start: i64, end: i64, subject_length: usize) -> Placement {
    let slen = subject_length as i64;
    match (start >= 0, end < slen) {
        (true, true) => Placement::Embedded,
        (true, false) => Placement::QueryAfterSubject,
        (false, true) => Placement::QueryBeforeSubject,
        (false, false) => Placement::Inconsistent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Rejected,
    Embedded { host_start: i64, host_end: i64 },
    QueryAfterSubject { overlap: usize },
    QueryBeforeSubject { overlap: usize },
    Inconsistent { start: i64, end: i64 },
}

/// Seed support, overlap size and evidence span checks applied to every cluster.
pub fn pass_filters(cluster: &Cluster, min_cluster_size: usize, params: &ClassifierParams) -> bool {
    if cluster.num_different_kmers < min_cluster_size {
        return false;
    }
    let overlap = cluster.predicted_overlap as f64;
    if overlap <= 0.0 {
        return false;
    }
    if overlap < params.min_proportion_overlap * cluster.query_length as f64
        || overlap < params.min_proportion_overlap * cluster.subject_length as f64
    {
        return false;
    }
    cluster.query_evidence_length() as f64 >= params.min_proportion_evidence * overlap
        && cluster.subject_evidence_length() as f64 >= params.min_proportion_evidence * overlap
}

/// Geometric decision for a cluster that passed the filters.
///
/// `num_query_seeds` is the number of non-repetitive query seeds that hit
/// any candidate subject; the weighted share of them found in the cluster
/// must reach twice the minimum k-mer percentage for a containment call.
pub fn classify(
    cluster: &Cluster,
    simulated: &SimulatedAlignment,
    num_query_seeds: usize,
    params: &ClassifierParams,
) -> Decision {
    decide(
        cluster.subject_predicted_start,
        cluster.subject_predicted_end,
        cluster,
        cluster.query_evidence_length(),
        simulated.coverage,
        num_query_seeds,
        params,
    )
}

fn weighted_percentage(cluster: &Cluster, num_query_seeds: usize) -> f64 {
    if num_query_seeds == 0 {
        return 0.0;
    }
    100.0 * cluster.weighted_count / num_query_seeds as f64
}

fn decide(
    start: i64,
    end: i64,
    cluster: &Cluster,
    query_evidence_length: usize,
    coverage: usize,
    num_query_seeds: usize,
    params: &ClassifierParams,
) -> Decision {
    let qlen = cluster.query_length;
    let slen = cluster.subject_length;
    let edge_supported =
        |overlap: usize| overlap > 0 && query_evidence_length as f64 > MIN_EDGE_EVIDENCE_RATIO * overlap as f64;
    match place(start, end, slen) {
        Placement::Embedded => {
            let supported = weighted_percentage(cluster, num_query_seeds) >= 2.0 * params.min_kmer_percentage
                && coverage as f64 >= MIN_QUERY_COVERAGE * qlen as f64;
            if supported {
                Decision::Embedded {
                    host_start: start,
                    host_end: end,
                }
            } else {
                Decision::Rejected
            }
        }
        Placement::QueryAfterSubject => {
            let overlap = (slen as i64 - start).clamp(0, qlen.min(slen) as i64) as usize;
            if edge_supported(overlap) {
                Decision::QueryAfterSubject { overlap }
            } else {
                Decision::Rejected
            }
        }
        Placement::QueryBeforeSubject => {
            let overlap = (end + 1).clamp(0, qlen.min(slen) as i64) as usize;
            if edge_supported(overlap) {
                Decision::QueryBeforeSubject { overlap }
            } else {
                Decision::Rejected
            }
        }
        Placement::Inconsistent => Decision::Inconsistent { start, end },
    }
}

/// The two reads of one pair, as seen by the classifier.
#[derive(Debug, Clone, Copy)]
pub struct PairContext<'a> {
    pub query_id: usize,
    /// Query codes in the searched orientation
    pub query_codes: &'a [u8],
    pub reverse: bool,
    /// Subject codes, forward strand
    pub subject_codes: &'a [u8],
    /// Non-repetitive query seeds with hits on candidate subjects
    pub num_query_seeds: usize,
}

/// A relationship together with the early-exit signal it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedCluster {
    pub relationship: AssemblySequencesRelationship,
    /// A containment call strong enough to stop evaluating candidates
    pub conclusive: bool,
}

// Evidence of one pair with query coordinates in the searched orientation
#[derive(Debug, Clone, Copy)]
struct PairEvidence {
    query_start: usize,
    query_end: usize,
    subject_start: usize,
    subject_end: usize,
    num_mismatches: usize,
    num_indels: usize,
    coverage: usize,
    weighted_coverage: usize,
}

impl PairEvidence {
    fn from_seeds(cluster: &Cluster, simulated: &SimulatedAlignment) -> Self {
        Self {
            query_start: cluster.query_evidence_start,
            query_end: cluster.query_evidence_end,
            subject_start: cluster.subject_evidence_start,
            subject_end: cluster.subject_evidence_end,
            num_mismatches: 0,
            num_indels: simulated.indels,
            coverage: simulated.coverage,
            weighted_coverage: simulated.weighted_coverage,
        }
    }

    fn from_alignment(cluster: &Cluster, aln: &LocalAlignment, window_start: usize) -> Self {
        let aligned = aln.aligned_query_length();
        let matches = aligned.saturating_sub(aln.insertion_bases + aln.num_mismatches);
        let weight = if cluster.num_different_kmers > 0 {
            (cluster.weighted_count / cluster.num_different_kmers as f64).min(1.0)
        } else {
            0.0
        };
        Self {
            query_start: aln.query_start,
            query_end: aln.query_end,
            subject_start: window_start + aln.target_start,
            subject_end: window_start + aln.target_end,
            num_mismatches: aln.num_mismatches,
            num_indels: aln.indel_bases(),
            coverage: matches,
            weighted_coverage: (matches as f64 * weight).round() as usize,
        }
    }

    fn query_length(&self) -> usize {
        self.query_end - self.query_start
    }
}

// Function to mirror a half-open span of a reverse-complemented read back to the forward strand
#[inline]
fn forward_span(start: usize, end: usize, length: usize, reverse: bool) -> (usize, usize) {
    if reverse {
        (length - end, length - start)
    } else {
        (start, end)
    }
}

pub struct RelationshipClassifier<'a> {
    params: &'a ClassifierParams,
    aligner: BandedPairWiseSW,
}

impl<'a> RelationshipClassifier<'a> {
    pub fn new(params: &'a ClassifierParams) -> Self {
        Self {
            params,
            aligner: BandedPairWiseSW::new(&params.alignment),
        }
    }

    /// Classify one cluster and release its hits.
    ///
    /// `Ok(None)` means the cluster did not pass the filters or lacked the
    /// support its placement requires.
    pub fn process_cluster(
        &self,
        ctx: &PairContext<'_>,
        cluster: &mut Cluster,
        min_cluster_size: usize,
        buffers: &mut DpBuffers,
    ) -> Result<Option<ClassifiedCluster>, PairError> {
        let outcome = self.evaluate(ctx, cluster, min_cluster_size, buffers);
        cluster.dispose_hits();
        outcome
    }

    fn evaluate(
        &self,
        ctx: &PairContext<'_>,
        cluster: &Cluster,
        min_cluster_size: usize,
        buffers: &mut DpBuffers,
    ) -> Result<Option<ClassifiedCluster>, PairError> {
        if !pass_filters(cluster, min_cluster_size, self.params) {
            return Ok(None);
        }
        let simulated = cluster.simulate_alignment();
        let decision = classify(cluster, &simulated, ctx.num_query_seeds, self.params);
        if decision == Decision::Rejected {
            return Ok(None);
        }

        let (decision, evidence) = if self.params.complete_alignment {
            let (aln, window_start) = self.align(ctx, cluster, buffers)?;
            let evidence = PairEvidence::from_alignment(cluster, &aln, window_start);
            let first = (window_start + aln.target_start) as i64;
            let last = (window_start + aln.target_end) as i64 - 1;
            let start = first - aln.soft_clip_start() as i64;
            let end = last + aln.soft_clip_end() as i64;
            log::trace!(
                "Query {} subject {}: alignment {}..{} clips {}/{} cigar {}",
                ctx.query_id,
                cluster.subject_id,
                first,
                last,
                aln.soft_clip_start(),
                aln.soft_clip_end(),
                crate::alignment::cigar::to_string(&aln.cigar)
            );
            let refined = decide(
                start,
                end,
                cluster,
                evidence.query_length(),
                evidence.coverage,
                ctx.num_query_seeds,
                self.params,
            );
            (refined, evidence)
        } else {
            (decision, PairEvidence::from_seeds(cluster, &simulated))
        };

        match decision {
            Decision::Rejected => Ok(None),
            Decision::Embedded {
                host_start,
                host_end,
            } => {
                let embedded = self.embedded(ctx, cluster, host_start, host_end, &evidence);
                let conclusive = self.is_conclusive(&embedded);
                Ok(Some(ClassifiedCluster {
                    relationship: AssemblySequencesRelationship::Embedded(embedded),
                    conclusive,
                }))
            }
            Decision::QueryAfterSubject { overlap } => Ok(Some(ClassifiedCluster {
                relationship: AssemblySequencesRelationship::Edge(self.edge(ctx, cluster, overlap, true, &evidence)),
                conclusive: false,
            })),
            Decision::QueryBeforeSubject { overlap } => Ok(Some(ClassifiedCluster {
                relationship: AssemblySequencesRelationship::Edge(self.edge(ctx, cluster, overlap, false, &evidence)),
                conclusive: false,
            })),
            Decision::Inconsistent { start, end } => Err(PairError::InconsistentGeometry {
                query: ctx.query_id,
                subject: cluster.subject_id as usize,
                query_length: cluster.query_length,
                subject_length: cluster.subject_length,
                start,
                end,
            }),
        }
    }

    /// Containment call that makes further candidates for the query unnecessary.
    pub fn is_conclusive(&self, embedded: &AssemblyEmbedded) -> bool {
        embedded.evidence_proportion() > self.params.conclusive_embedding_proportion
            && embedded.indels_per_kbp() < self.params.conclusive_max_indels_per_kbp
            && embedded.evidence.weighted_coverage_shared_kmers as f64 > 0.5 * embedded.sequence_length as f64
    }

    // Function to align the query against the subject window predicted by the cluster
    fn align(
        &self,
        ctx: &PairContext<'_>,
        cluster: &Cluster,
        buffers: &mut DpBuffers,
    ) -> Result<(LocalAlignment, usize), PairError> {
        let failure = |reason: String| PairError::AlignmentFailure {
            query: ctx.query_id,
            subject: cluster.subject_id as usize,
            reason,
        };
        let alignment = &self.params.alignment;
        let qlen = ctx.query_codes.len();
        let slen = ctx.subject_codes.len() as i64;
        let band = alignment
            .band_width
            .max((alignment.band_width_fraction * qlen as f64).round() as usize)
            .min(MAX_BAND_WIDTH);
        let band = band_within_budget(qlen, band);

        let window_start = (cluster.subject_predicted_start - band as i64).clamp(0, slen);
        let window_end = (cluster.subject_predicted_end + 1 + band as i64).clamp(window_start, slen);
        if window_end <= window_start {
            return Err(failure("empty subject window".to_string()));
        }
        let target = &ctx.subject_codes[window_start as usize..window_end as usize];
        let diagonal = cluster.subject_predicted_start - window_start;

        let aln = self
            .aligner
            .scalar_banded_swa(ctx.query_codes, target, diagonal, band, buffers)
            .ok_or_else(|| failure("no positive scoring alignment".to_string()))?;
        if aln.score <= 0 {
            return Err(failure(format!("score {}", aln.score)));
        }
        let indels_per_kbp = aln.indels_per_kbp();
        if indels_per_kbp > self.params.fallback_max_indels_per_kbp {
            return Err(failure(format!("{indels_per_kbp:.1} indel bases per kbp")));
        }
        Ok((aln, window_start as usize))
    }

    fn shared_evidence(cluster: &Cluster, evidence: &PairEvidence) -> OverlapEvidence {
        OverlapEvidence {
            num_shared_kmers: cluster.num_different_kmers,
            raw_kmer_hits: cluster.raw_kmer_hits,
            raw_kmer_hits_start_sd: cluster.raw_kmer_hits_start_sd,
            num_mismatches: evidence.num_mismatches,
            num_indels: evidence.num_indels,
            coverage_shared_kmers: evidence.coverage,
            weighted_coverage_shared_kmers: evidence.weighted_coverage,
        }
    }

    fn embedded(
        &self,
        ctx: &PairContext<'_>,
        cluster: &Cluster,
        host_start: i64,
        host_end: i64,
        evidence: &PairEvidence,
    ) -> AssemblyEmbedded {
        let (sequence_evidence_start, sequence_evidence_end) =
            forward_span(evidence.query_start, evidence.query_end, cluster.query_length, ctx.reverse);
        AssemblyEmbedded {
            sequence_id: ctx.query_id,
            sequence_length: cluster.query_length,
            host_id: cluster.subject_id as usize,
            reverse: ctx.reverse,
            host_start,
            host_end,
            host_start_sd: cluster.predicted_start_sd,
            host_evidence_start: evidence.subject_start,
            host_evidence_end: evidence.subject_end,
            sequence_evidence_start,
            sequence_evidence_end,
            evidence: Self::shared_evidence(cluster, evidence),
        }
    }

    // Function to build an edge. With `query_after` the subject end meets the
    // query; otherwise the query meets the subject start.
    fn edge(
        &self,
        ctx: &PairContext<'_>,
        cluster: &Cluster,
        overlap: usize,
        query_after: bool,
        evidence: &PairEvidence,
    ) -> AssemblyEdge {
        let subject_id = cluster.subject_id as usize;
        let query_span = forward_span(evidence.query_start, evidence.query_end, cluster.query_length, ctx.reverse);
        let subject_span = (evidence.subject_start, evidence.subject_end);

        // The forward query enters after the subject through its start
        let query_vertex_is_start = query_after != ctx.reverse;
        let query_vertex = if query_vertex_is_start {
            AssemblyVertex::start(ctx.query_id)
        } else {
            AssemblyVertex::end(ctx.query_id)
        };

        let (vertex1, vertex2, span1, span2, len1, len2) = if query_after {
            (
                AssemblyVertex::end(subject_id),
                query_vertex,
                subject_span,
                query_span,
                cluster.subject_length,
                cluster.query_length,
            )
        } else {
            (
                query_vertex,
                AssemblyVertex::start(subject_id),
                query_span,
                subject_span,
                cluster.query_length,
                cluster.subject_length,
            )
        };

        let mut edge = AssemblyEdge::new(vertex1, vertex2, overlap, len1, len2);
        edge.vertex1_evidence_start = span1.0;
        edge.vertex1_evidence_end = span1.1;
        edge.vertex2_evidence_start = span2.0;
        edge.vertex2_evidence_end = span2.1;
        edge.evidence = Self::shared_evidence(cluster, evidence);
        edge.average_overlap = cluster.average_predicted_overlap;
        edge.median_overlap = cluster.median_predicted_overlap;
        edge.from_limits_overlap = cluster.from_limits_predicted_overlap;
        edge.overlap_sd = cluster.predicted_start_sd;
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_opt::GraphOpt;
    use crate::seeding::KmerHit;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn hits(offset: i64, query_range: std::ops::Range<u32>, step: usize) -> Vec<KmerHit> {
        query_range
            .step_by(step)
            .map(|q| KmerHit {
                subject_id: 0,
                subject_pos: (q as i64 + offset) as u32,
                query_pos: q,
                total_hits: 1,
            })
            .collect()
    }

    fn cluster(qlen: usize, slen: usize, hits: Vec<KmerHit>) -> Cluster {
        Cluster::from_hits(0, qlen, slen, 15, hits.clone(), &hits, 1.0).unwrap()
    }

    fn params() -> ClassifierParams {
        GraphOpt::default().classifier_params()
    }

    fn random_codes(rng: &mut StdRng, n: usize) -> Vec<u8> {
        (0..n).map(|_| rng.gen_range(0..4u8)).collect()
    }

    #[test]
    fn test_place() {
        assert_eq!(place(0, 999, 1000), Placement::Embedded);
        assert_eq!(place(500, 1499, 1000), Placement::QueryAfterSubject);
        assert_eq!(place(-500, 499, 1000), Placement::QueryBeforeSubject);
        assert_eq!(place(-10, 1000, 1000), Placement::Inconsistent);
    }

    #[test]
    fn test_classify_embedded() {
        let c = cluster(1000, 1000, hits(0, 0..986, 2));
        let sim = c.simulate_alignment();
        let d = classify(&c, &sim, c.num_different_kmers, &params());
        assert_eq!(
            d,
            Decision::Embedded {
                host_start: 0,
                host_end: 999
            }
        );
    }

    #[test]
    fn test_classify_embedded_needs_seed_support() {
        // Query shares every seed but the cluster holds a small share of the query seeds
        let c = cluster(1000, 2000, hits(100, 0..986, 2));
        let sim = c.simulate_alignment();
        let d = classify(&c, &sim, c.num_different_kmers * 10, &params());
        assert_eq!(d, Decision::Rejected);
    }

    #[test]
    fn test_classify_edges() {
        let p = params();
        let after = cluster(1000, 1000, hits(500, 0..486, 2));
        let sim = after.simulate_alignment();
        assert_eq!(
            classify(&after, &sim, 493, &p),
            Decision::QueryAfterSubject { overlap: 500 }
        );

        let before = cluster(1000, 1000, hits(-500, 500..986, 2));
        let sim = before.simulate_alignment();
        assert_eq!(
            classify(&before, &sim, 493, &p),
            Decision::QueryBeforeSubject { overlap: 500 }
        );
    }

    #[test]
    fn test_pass_filters() {
        let p = params();
        let c = cluster(1000, 1000, hits(500, 0..486, 2));
        assert!(pass_filters(&c, 50, &p));
        assert!(!pass_filters(&c, c.num_different_kmers + 1, &p));
        // 20 bp overlap on reads of 1000 is below 5%
        let small = cluster(1000, 1000, hits(980, 0..6, 1));
        assert!(!pass_filters(&small, 1, &p));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let p = params();
        let c1 = cluster(1000, 1200, hits(300, 0..880, 3));
        let c2 = cluster(1000, 1200, hits(300, 0..880, 3));
        let d1 = classify(&c1, &c1.simulate_alignment(), 300, &p);
        let d2 = classify(&c2, &c2.simulate_alignment(), 300, &p);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_edge_orientation_and_mirroring() {
        let p = params();
        let classifier = RelationshipClassifier::new(&p);
        let mut rng = StdRng::seed_from_u64(3);
        let subject = random_codes(&mut rng, 1000);
        let query = random_codes(&mut rng, 1000);
        let mut buffers = DpBuffers::new();

        let ctx = PairContext {
            query_id: 1,
            query_codes: &query,
            reverse: true,
            subject_codes: &subject,
            num_query_seeds: 493,
        };
        let mut c = cluster(1000, 1000, hits(500, 0..486, 2));
        let result = classifier
            .process_cluster(&ctx, &mut c, 50, &mut buffers)
            .unwrap()
            .unwrap();
        assert!(c.is_disposed());
        let AssemblySequencesRelationship::Edge(edge) = result.relationship else {
            panic!("expected an edge");
        };
        assert_eq!(edge.vertex1, AssemblyVertex::end(0));
        // Reverse complemented query runs past the subject end with its own end
        assert_eq!(edge.vertex2, AssemblyVertex::end(1));
        assert_eq!(edge.overlap, 500);
        assert_eq!(edge.cost, 1500);
        // Seeds end at query 499, mirrored onto the forward strand
        assert_eq!((edge.vertex2_evidence_start, edge.vertex2_evidence_end), (501, 1000));
        assert_eq!((edge.vertex1_evidence_start, edge.vertex1_evidence_end), (500, 999));
    }

    #[test]
    fn test_conclusive_embedding() {
        let p = params();
        let classifier = RelationshipClassifier::new(&p);
        let mut rng = StdRng::seed_from_u64(5);
        let subject = random_codes(&mut rng, 1000);
        let mut buffers = DpBuffers::new();
        let ctx = PairContext {
            query_id: 1,
            query_codes: &subject,
            reverse: false,
            subject_codes: &subject,
            num_query_seeds: 494,
        };
        let mut c = cluster(1000, 1000, hits(0, 0..986, 2));
        let result = classifier
            .process_cluster(&ctx, &mut c, 50, &mut buffers)
            .unwrap()
            .unwrap();
        assert!(result.conclusive);
        let AssemblySequencesRelationship::Embedded(emb) = result.relationship else {
            panic!("expected an embedding");
        };
        assert_eq!((emb.host_start, emb.host_end), (0, 999));
        assert_eq!(emb.host_id, 0);
    }

    #[test]
    fn test_inconsistent_geometry_without_alignment() {
        let p = params();
        let classifier = RelationshipClassifier::new(&p);
        let codes = vec![0u8; 600];
        let mut buffers = DpBuffers::new();
        let ctx = PairContext {
            query_id: 1,
            query_codes: &codes,
            reverse: false,
            subject_codes: &codes[..400],
            num_query_seeds: 300,
        };
        // Subject of 400 placed in the middle of a query of 600
        let mut c = cluster(600, 400, hits(-100, 100..486, 2));
        let err = classifier
            .process_cluster(&ctx, &mut c, 50, &mut buffers)
            .unwrap_err();
        assert!(matches!(err, PairError::InconsistentGeometry { start: -100, .. }));
    }

    #[test]
    fn test_complete_alignment_refines_embedding() {
        let mut p = params();
        p.complete_alignment = true;
        let classifier = RelationshipClassifier::new(&p);
        let mut rng = StdRng::seed_from_u64(9);
        let subject = random_codes(&mut rng, 2000);
        // Query = subject[500..1300]; seeds only cover its first half
        let query = subject[500..1300].to_vec();
        let mut buffers = DpBuffers::new();
        let ctx = PairContext {
            query_id: 1,
            query_codes: &query,
            reverse: false,
            subject_codes: &subject,
            num_query_seeds: 200,
        };
        let mut c = cluster(800, 2000, hits(500, 0..400, 2));
        let result = classifier
            .process_cluster(&ctx, &mut c, 50, &mut buffers)
            .unwrap()
            .unwrap();
        let AssemblySequencesRelationship::Embedded(emb) = result.relationship else {
            panic!("expected an embedding");
        };
        assert_eq!((emb.host_start, emb.host_end), (500, 1299));
        assert_eq!((emb.host_evidence_start, emb.host_evidence_end), (500, 1300));
        assert_eq!(emb.evidence.num_mismatches, 0);
        assert_eq!(emb.evidence.num_indels, 0);
    }
}
