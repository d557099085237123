// End-to-end graph construction on synthetic reads

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ferrous_overlap::graph::{AssemblyEdge, AssemblyGraph, AssemblyVertex};
use ferrous_overlap::index::{IndexHit, SeedIndex, SequenceIndex};
use ferrous_overlap::seeding::extract_seeds;
use ferrous_overlap::utils::{encode_sequence, reverse_complement_sequence};
use ferrous_overlap::{GraphBuildError, GraphBuilder, GraphBuilderFmIndex, GraphOpt, ReadSequence};

fn random_bases(rng: &mut StdRng, n: usize) -> Vec<u8> {
    (0..n).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

fn reverse_complement_bases(bases: &[u8]) -> Vec<u8> {
    reverse_complement_sequence(&encode_sequence(bases))
        .into_iter()
        .map(|c| b"ACGTN"[c as usize])
        .collect()
}

fn opt(threads: usize) -> GraphOpt {
    GraphOpt {
        n_threads: threads,
        ..GraphOpt::default()
    }
}

fn build(reads: Vec<ReadSequence>, opt: GraphOpt) -> AssemblyGraph {
    GraphBuilderFmIndex::new(opt).build_assembly_graph(reads).unwrap()
}

// Reads tiling a random genome every 400 bp; odd reads are reverse complemented
fn tiled_reads(seed: u64) -> Vec<ReadSequence> {
    let mut rng = StdRng::seed_from_u64(seed);
    let genome = random_bases(&mut rng, 6000);
    (0..=12)
        .map(|i| {
            let start = 400 * i;
            let segment = &genome[start..start + 1200];
            let bases = if i % 2 == 1 {
                reverse_complement_bases(segment)
            } else {
                segment.to_vec()
            };
            ReadSequence::unnamed(i, bases)
        })
        .collect()
}

fn edge_lengths(graph: &AssemblyGraph, edge: &AssemblyEdge) -> (usize, usize) {
    (
        graph.sequence_length(edge.vertex1.sequence_id),
        graph.sequence_length(edge.vertex2.sequence_id),
    )
}

fn check_invariants(graph: &AssemblyGraph) {
    let n = graph.num_sequences();
    assert_eq!(graph.edges().filter(|e| e.is_same_sequence_edge()).count(), n);
    for id in 0..n {
        let own = graph.same_sequence_edge(id).expect("self edge");
        assert_eq!(own.overlap, graph.sequence_length(id));
    }

    let mut pairs = HashSet::new();
    for edge in graph.overlap_edges() {
        let (len1, len2) = edge_lengths(graph, edge);
        assert!(edge.overlap > 0);
        assert!(edge.overlap <= len1.min(len2));
        assert_eq!(edge.cost, len1 + len2 - edge.overlap);
        let (a, b) = (edge.vertex1.sequence_id, edge.vertex2.sequence_id);
        assert!(pairs.insert((a.min(b), a.max(b))), "two relationships for {a} and {b}");
    }
    for emb in graph.embeddings() {
        let host_length = graph.sequence_length(emb.host_id) as i64;
        assert!(emb.host_start >= 0);
        assert!(emb.host_end <= host_length);
        let (a, b) = (emb.sequence_id, emb.host_id);
        assert!(pairs.insert((a.min(b), a.max(b))), "two relationships for {a} and {b}");
    }
}

#[test]
fn test_identical_reads_are_embedded() {
    let mut rng = StdRng::seed_from_u64(17);
    let bases = random_bases(&mut rng, 1000);
    let reads = vec![ReadSequence::unnamed(0, bases.clone()), ReadSequence::unnamed(1, bases.clone())];

    let graph = build(reads, opt(1));
    assert_eq!(graph.overlap_edges().count(), 0);
    let embeddings = graph.embeddings_of_sequence(1);
    assert_eq!(embeddings.len(), 1);
    let emb = &embeddings[0];
    assert_eq!(emb.host_id, 0);
    assert!(!emb.reverse);
    assert_eq!(emb.host_start, 0);
    assert_eq!(emb.host_end, 999);

    let mut seeds = Vec::new();
    let opt = GraphOpt::default();
    extract_seeds(&encode_sequence(&bases), opt.seed_length, opt.seed_spacing, &mut seeds);
    assert_eq!(emb.evidence.num_shared_kmers, seeds.len());
    assert!(!graph.is_embedded(0));
}

#[test]
fn test_dovetail_reads_share_one_edge() {
    let mut rng = StdRng::seed_from_u64(23);
    let a = random_bases(&mut rng, 1000);
    let mut b = a[500..].to_vec();
    b.extend(random_bases(&mut rng, 500));
    let graph = build(vec![ReadSequence::unnamed(0, a), ReadSequence::unnamed(1, b)], opt(1));

    let edges: Vec<&AssemblyEdge> = graph.overlap_edges().collect();
    assert_eq!(edges.len(), 1);
    let edge = edges[0];
    assert_eq!(edge.vertex1, AssemblyVertex::end(0));
    assert_eq!(edge.vertex2, AssemblyVertex::start(1));
    assert!(edge.overlap.abs_diff(500) <= 10, "overlap {}", edge.overlap);
    assert!(edge.cost.abs_diff(1500) <= 10, "cost {}", edge.cost);
    assert_eq!(graph.num_embeddings(), 0);
}

// Index that reports 49 extra occurrences for every seed of `inflated`
struct InflatedIndex {
    inner: SequenceIndex,
    inflated: HashSet<Vec<u8>>,
    junk_subjects: u32,
}

const JUNK_HITS: usize = 49;

impl SeedIndex for InflatedIndex {
    fn count(&self, seed: &[u8]) -> usize {
        let extra = if self.inflated.contains(seed) { JUNK_HITS } else { 0 };
        self.inner.count(seed) + extra
    }

    fn search(&self, seed: &[u8]) -> Vec<IndexHit> {
        let mut hits = self.inner.search(seed);
        if self.inflated.contains(seed) {
            hits.extend((0..JUNK_HITS).map(|j| IndexHit {
                sequence_id: j as u32 % self.junk_subjects,
                start: (j as u32 * 13) % 900,
            }));
            hits.sort_unstable();
        }
        hits
    }
}

#[test]
fn test_repetitive_read_is_excluded() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut reads: Vec<ReadSequence> = (0..30)
        .map(|i| ReadSequence::unnamed(i, random_bases(&mut rng, 1000)))
        .collect();
    let repeat_id = reads.len();
    reads.push(ReadSequence::unnamed(repeat_id, reads[0].characters.clone()));

    let opt = opt(2);
    let k = opt.seed_length;
    let codes = encode_sequence(&reads[repeat_id].characters);
    let inflated: HashSet<Vec<u8>> = codes.windows(k).map(|w| w.to_vec()).collect();
    let index = InflatedIndex {
        inner: SequenceIndex::build(&reads, &opt.index_params()),
        inflated,
        junk_subjects: 30,
    };

    let graph = GraphBuilderFmIndex::new(opt)
        .build_with_index(Arc::from(reads), Arc::new(index))
        .unwrap();
    assert!(graph.embeddings_of_sequence(repeat_id).is_empty());
    assert!(graph.embeddings_of_host(repeat_id).is_empty());
    for vertex in [AssemblyVertex::start(repeat_id), AssemblyVertex::end(repeat_id)] {
        assert!(graph.edges_of(vertex).iter().all(|e| e.is_same_sequence_edge()));
    }
}

#[test]
fn test_tiled_reads_link_neighbours() {
    let reads = tiled_reads(41);
    let n = reads.len();
    let graph = build(reads, opt(2));
    check_invariants(&graph);

    let linked: BTreeSet<(usize, usize)> = graph
        .overlap_edges()
        .map(|e| {
            let (a, b) = (e.vertex1.sequence_id, e.vertex2.sequence_id);
            (a.min(b), a.max(b))
        })
        .collect();
    for i in 0..n - 1 {
        assert!(linked.contains(&(i, i + 1)), "no edge between {} and {}", i, i + 1);
    }
    for edge in graph.overlap_edges() {
        let (a, b) = (edge.vertex1.sequence_id, edge.vertex2.sequence_id);
        if a.abs_diff(b) == 1 {
            assert!(edge.overlap.abs_diff(800) <= 20, "overlap {} for {a}-{b}", edge.overlap);
        }
    }
}

#[test]
fn test_extensive_search_keeps_invariants() {
    let reads = tiled_reads(43);
    let graph = build(
        reads,
        GraphOpt {
            extensive_search: true,
            ..opt(3)
        },
    );
    check_invariants(&graph);
    assert!(graph.overlap_edges().count() >= graph.num_sequences() - 1);
}

#[test]
fn test_rebuild_is_identical() {
    let mut reads = tiled_reads(47);
    let mut rng = StdRng::seed_from_u64(5);
    // A contained read gives the second build an embedding to reproduce
    let inner = reads[4].characters[100..900].to_vec();
    reads.push(ReadSequence::unnamed(reads.len(), inner));
    reads.push(ReadSequence::unnamed(reads.len(), random_bases(&mut rng, 700)));

    let first = build(reads.clone(), opt(2));
    let second = build(reads, opt(2));
    check_invariants(&first);

    let first_edges: Vec<&AssemblyEdge> = first.edges().collect();
    let second_edges: Vec<&AssemblyEdge> = second.edges().collect();
    assert_eq!(first_edges, second_edges);
    let first_embeddings: Vec<_> = first.embeddings().collect();
    let second_embeddings: Vec<_> = second.embeddings().collect();
    assert_eq!(first_embeddings, second_embeddings);
    assert!(!first_embeddings.is_empty());
}

#[test]
fn test_complete_alignment_on_tiled_reads() {
    let reads = tiled_reads(53);
    let n = reads.len();
    let graph = build(
        reads,
        GraphOpt {
            complete_alignment: true,
            ..opt(2)
        },
    );
    check_invariants(&graph);
    for edge in graph.overlap_edges() {
        assert_eq!(edge.evidence.num_mismatches, 0);
        assert_eq!(edge.evidence.num_indels, 0);
    }
    assert!(graph.overlap_edges().count() >= n - 1);
}

// Read 1 repeats the last 500 bp of read 0 with 60 foreign bases inserted
// after its first 250 bp
fn overlap_with_insertion() -> Vec<ReadSequence> {
    let mut rng = StdRng::seed_from_u64(61);
    let a = random_bases(&mut rng, 1000);
    let mut b = a[500..750].to_vec();
    b.extend(random_bases(&mut rng, 60));
    b.extend_from_slice(&a[750..]);
    b.extend(random_bases(&mut rng, 500));
    vec![ReadSequence::unnamed(0, a), ReadSequence::unnamed(1, b)]
}

#[test]
fn test_alignment_with_too_many_indels_drops_pair() {
    let strict = GraphOpt {
        complete_alignment: true,
        ..opt(1)
    };
    let graph = build(overlap_with_insertion(), strict.clone());
    assert_eq!(graph.overlap_edges().count(), 0);
    assert_eq!(graph.num_embeddings(), 0);

    // 60 indel bases over about 560 aligned bases pass a looser threshold
    let relaxed = GraphOpt {
        fallback_max_indels_per_kbp: 200.0,
        ..strict
    };
    let graph = build(overlap_with_insertion(), relaxed);
    let edges: Vec<&AssemblyEdge> = graph.overlap_edges().collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].vertex1, AssemblyVertex::end(0));
    assert_eq!(edges[0].vertex2, AssemblyVertex::start(1));
    assert!(edges[0].evidence.num_indels > 0);
}

#[test]
fn test_pool_budget_exceeded_is_fatal() {
    let mut rng = StdRng::seed_from_u64(67);
    let reads: Vec<ReadSequence> = (0..200)
        .map(|i| ReadSequence::unnamed(i, random_bases(&mut rng, 2000)))
        .collect();
    let builder = GraphBuilderFmIndex::new(GraphOpt {
        pool_seconds_per_sequence: 1e-9,
        min_pool_timeout_secs: 0,
        ..opt(1)
    });
    match builder.build_assembly_graph(reads) {
        Err(GraphBuildError::PoolTimeout { completed, total, .. }) => {
            assert_eq!(total, 200);
            assert!(completed < total);
        }
        other => panic!("expected a pool timeout, got {:?}", other.map(|g| g.num_edges())),
    }
}

// The only forward candidates of read 2 are a long overlap with read 0 and a
// short one with read 1; the short one is still evaluated after the long one
#[test]
fn test_remaining_candidates_keep_initial_cluster_size() {
    let mut rng = StdRng::seed_from_u64(71);
    let q = random_bases(&mut rng, 2000);
    let mut long = random_bases(&mut rng, 500);
    long.extend_from_slice(&q[..1500]);
    let mut short = q[1700..].to_vec();
    short.extend(random_bases(&mut rng, 1700));
    let reads = vec![
        ReadSequence::unnamed(0, long),
        ReadSequence::unnamed(1, short),
        ReadSequence::unnamed(2, q),
    ];

    let graph = build(reads, opt(1));
    let edges: Vec<&AssemblyEdge> = graph.overlap_edges().collect();
    assert_eq!(edges.len(), 2);
    assert!(edges
        .iter()
        .any(|e| e.vertex1 == AssemblyVertex::end(0) && e.vertex2 == AssemblyVertex::start(2)));
    let short_edge = edges
        .iter()
        .find(|e| e.vertex1 == AssemblyVertex::end(2) && e.vertex2 == AssemblyVertex::start(1))
        .expect("edge between read 2 and read 1");
    assert!(short_edge.overlap.abs_diff(300) <= 10, "overlap {}", short_edge.overlap);
}
