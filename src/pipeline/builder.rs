//! Graph construction driver.
//!
//! One task per read is spawned on a fixed-size rayon pool. Tasks search the
//! shared read-only index, then commit their batch under the graph mutex and
//! report completion on a channel. The driver waits on that channel with a
//! deadline proportional to the number of reads; missing the deadline is
//! fatal, and tasks that have not started yet are skipped.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError};
use rayon::prelude::*;

use super::edges_finder::KmerHitsEdgesFinder;
use super::workspace::with_workspace;
use crate::defaults::PROGRESS_INTERVAL;
use crate::error::GraphBuildError;
use crate::graph::AssemblyGraph;
use crate::graph_opt::{GraphOpt, SeedingParams};
use crate::index::{SeedIndex, SequenceIndex};
use crate::seeding::seed_multiplicity_stats;
use crate::sequence::ReadSequence;
use crate::utils::encode_sequence;

/// Builds an overlap graph from an ordered read collection.
pub trait GraphBuilder {
    fn build_assembly_graph(&self, sequences: Vec<ReadSequence>) -> Result<AssemblyGraph, GraphBuildError>;
}

/// Graph builder backed by an FM-index over all reads.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilderFmIndex {
    opt: GraphOpt,
}

// Read-only state shared by every task
struct TaskContext<I: ?Sized> {
    sequences: Arc<[ReadSequence]>,
    opt: GraphOpt,
    corpus_average: f64,
    index: Arc<I>,
    /// Set once the build has been abandoned
    cancelled: AtomicBool,
}

fn lock(graph: &Mutex<AssemblyGraph>) -> MutexGuard<'_, AssemblyGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Mean multiplicity of forward seeds over the whole corpus, self match excluded.
pub fn corpus_average<I: SeedIndex + ?Sized>(index: &I, sequences: &[ReadSequence], params: &SeedingParams) -> f64 {
    let (total, count) = sequences
        .par_iter()
        .filter(|s| s.len() >= params.seed_length)
        .map(|s| seed_multiplicity_stats(index, &encode_sequence(&s.characters), params))
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

impl GraphBuilderFmIndex {
    pub fn new(opt: GraphOpt) -> Self {
        Self { opt }
    }

    pub fn opt(&self) -> &GraphOpt {
        &self.opt
    }

    fn check(&self, sequences: &[ReadSequence]) -> Result<(), GraphBuildError> {
        self.opt.validate().map_err(GraphBuildError::Configuration)?;
        if sequences.is_empty() {
            return Err(GraphBuildError::EmptyInput);
        }
        Ok(())
    }

    /// Build the graph against an index that was constructed elsewhere.
    pub fn build_with_index<I>(
        &self,
        sequences: Arc<[ReadSequence]>,
        index: Arc<I>,
    ) -> Result<AssemblyGraph, GraphBuildError>
    where
        I: SeedIndex + Send + Sync + 'static,
    {
        self.check(&sequences)?;
        self.run(sequences, index)
    }

    fn run<I>(&self, sequences: Arc<[ReadSequence]>, index: Arc<I>) -> Result<AssemblyGraph, GraphBuildError>
    where
        I: SeedIndex + Send + Sync + 'static,
    {
        let start_time = Instant::now();
        let total = sequences.len();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.opt.n_threads.max(1))
            .thread_name(|i| format!("overlap-worker-{i}"))
            .panic_handler(|payload| {
                log::error!("Worker thread panicked: {}", panic_message(payload.as_ref()));
            })
            .build()?;
        log::info!(
            "Building overlap graph. Sequences: {}. Threads: {}. Extensive search: {}. Complete alignment: {}",
            total,
            pool.current_num_threads(),
            self.opt.extensive_search,
            self.opt.complete_alignment
        );

        let seeding = self.opt.seeding_params();
        let corpus_average = pool.install(|| corpus_average(index.as_ref(), &sequences, &seeding));
        log::info!("Average seed multiplicity over the corpus: {:.3}", corpus_average);

        let graph = Arc::new(Mutex::new(AssemblyGraph::new(Arc::clone(&sequences))));
        let context = Arc::new(TaskContext {
            sequences,
            opt: self.opt.clone(),
            corpus_average,
            index,
            cancelled: AtomicBool::new(false),
        });

        let (sender, receiver) = unbounded::<usize>();
        for sequence_id in 0..total {
            let context = Arc::clone(&context);
            let graph = Arc::clone(&graph);
            let sender = sender.clone();
            pool.spawn(move || {
                if !process_sequence(&context, &graph, sequence_id) {
                    log::trace!("Skipped sequence {} after cancellation", sequence_id);
                }
                drop(graph);
                drop(context);
                let _ = sender.send(sequence_id);
            });
        }
        drop(sender);

        let budget = self.opt.pool_timeout(total).unwrap_or(Duration::MAX);
        let deadline = start_time.checked_add(budget);
        if deadline.is_none() {
            log::warn!("Pool budget {:?} is out of range; waiting without a deadline", budget);
        }
        let mut done = vec![false; total];
        let mut completed = 0usize;
        while completed < total {
            let received = match deadline {
                Some(deadline) => receiver.recv_deadline(deadline),
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(sequence_id) => {
                    if !std::mem::replace(&mut done[sequence_id], true) {
                        completed += 1;
                    }
                    if completed % PROGRESS_INTERVAL == 0 {
                        let edges = lock(&graph).num_edges();
                        log::info!("Processed {} sequences. Edges: {}", completed, edges);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    context.cancelled.store(true, Ordering::Relaxed);
                    log::error!(
                        "Worker pool did not finish within {:?}. Completed {} of {} sequences",
                        budget,
                        completed,
                        total
                    );
                    return Err(GraphBuildError::PoolTimeout {
                        budget,
                        completed,
                        total,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let sequence_id = done.iter().position(|d| !d).unwrap_or(total);
                    return Err(GraphBuildError::WorkerLost { sequence_id });
                }
            }
        }

        let mut graph = std::mem::take(&mut *lock(&graph));
        log::info!(
            "Built graph. Edges: {}. Embeddings: {}. Time: {:.2}s",
            graph.num_edges(),
            graph.num_embeddings(),
            start_time.elapsed().as_secs_f64()
        );
        graph.prune_embedded_sequences();
        Ok(graph)
    }
}

impl GraphBuilder for GraphBuilderFmIndex {
    fn build_assembly_graph(&self, sequences: Vec<ReadSequence>) -> Result<AssemblyGraph, GraphBuildError> {
        self.check(&sequences)?;
        let sequences: Arc<[ReadSequence]> = Arc::from(sequences);
        let index = Arc::new(SequenceIndex::build(&sequences, &self.opt.index_params()));
        self.run(sequences, index)
    }
}

// Function to search one read and commit what it found. Returns false when
// the build was cancelled before the task started.
fn process_sequence<I: SeedIndex + ?Sized>(
    context: &TaskContext<I>,
    graph: &Mutex<AssemblyGraph>,
    sequence_id: usize,
) -> bool {
    if context.cancelled.load(Ordering::Relaxed) {
        return false;
    }
    let finder = KmerHitsEdgesFinder::new(
        context.index.as_ref(),
        &context.sequences,
        &context.opt,
        Some(context.corpus_average),
    );
    let found = with_workspace(|ws| finder.infer_relationships(sequence_id, ws));
    let commit = context.opt.commit_params();

    let mut graph = lock(graph);
    if let Some(calibration) = found.calibration {
        graph.set_self_calibration(sequence_id, calibration.evidence, calibration.overlap_sd);
    }
    let summary = graph.add_relationships(sequence_id, found.relationships, &commit);
    drop(graph);

    log::trace!(
        "Sequence {}: committed {} edges, {} embeddings, discarded {}",
        sequence_id,
        summary.edges,
        summary.embeddings,
        summary.discarded
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexHit;

    // Index that answers every seed with no hits
    struct EmptyIndex;

    impl SeedIndex for EmptyIndex {
        fn count(&self, _seed: &[u8]) -> usize {
            0
        }

        fn search(&self, _seed: &[u8]) -> Vec<IndexHit> {
            Vec::new()
        }
    }

    fn reads(n: usize) -> Vec<ReadSequence> {
        (0..n).map(|i| ReadSequence::unnamed(i, b"ACGTACGTTTGACCA".repeat(4))).collect()
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let builder = GraphBuilderFmIndex::default();
        let err = builder.build_assembly_graph(Vec::new()).unwrap_err();
        assert!(matches!(err, GraphBuildError::EmptyInput));
    }

    #[test]
    fn test_invalid_configuration_is_rejected_before_work() {
        let opt = GraphOpt {
            seed_length: 0,
            ..GraphOpt::default()
        };
        let builder = GraphBuilderFmIndex::new(opt);
        let err = builder.build_assembly_graph(reads(2)).unwrap_err();
        assert!(matches!(err, GraphBuildError::Configuration(_)));
    }

    #[test]
    fn test_no_hits_gives_bare_graph() {
        let builder = GraphBuilderFmIndex::new(GraphOpt {
            n_threads: 2,
            ..GraphOpt::default()
        });
        let graph = builder
            .build_with_index(Arc::from(reads(5)), Arc::new(EmptyIndex))
            .unwrap();
        assert_eq!(graph.num_sequences(), 5);
        assert_eq!(graph.num_edges(), 5);
        assert_eq!(graph.num_embeddings(), 0);
    }

    // Index that counts the searches it answers
    struct CountingIndex {
        inner: SequenceIndex,
        searches: std::sync::atomic::AtomicUsize,
    }

    impl SeedIndex for CountingIndex {
        fn count(&self, seed: &[u8]) -> usize {
            self.inner.count(seed)
        }

        fn search(&self, seed: &[u8]) -> Vec<IndexHit> {
            self.searches.fetch_add(1, Ordering::Relaxed);
            self.inner.search(seed)
        }
    }

    fn counting_context(seqs: Vec<ReadSequence>) -> TaskContext<CountingIndex> {
        let opt = GraphOpt::default();
        let inner = SequenceIndex::build(&seqs, &opt.index_params());
        TaskContext {
            sequences: Arc::from(seqs),
            opt,
            // No seed is repetitive against this reference
            corpus_average: 100.0,
            index: Arc::new(CountingIndex {
                inner,
                searches: std::sync::atomic::AtomicUsize::new(0),
            }),
            cancelled: AtomicBool::new(false),
        }
    }

    #[test]
    fn test_cancelled_task_skips_search_and_commit() {
        let context = counting_context(reads(3));
        let graph = Mutex::new(AssemblyGraph::new(Arc::clone(&context.sequences)));

        assert!(process_sequence(&context, &graph, 2));
        let searches = context.index.searches.load(Ordering::Relaxed);
        assert!(searches > 0);

        context.cancelled.store(true, Ordering::Relaxed);
        let edges_before = lock(&graph).num_edges();
        assert!(!process_sequence(&context, &graph, 1));
        assert_eq!(context.index.searches.load(Ordering::Relaxed), searches);
        assert_eq!(lock(&graph).num_edges(), edges_before);
    }

    #[test]
    fn test_out_of_range_budget_waits_without_deadline() {
        let opt = GraphOpt {
            pool_seconds_per_sequence: 1e19,
            ..GraphOpt::default()
        };
        assert_eq!(opt.pool_timeout(3), None);
        let builder = GraphBuilderFmIndex::new(GraphOpt {
            pool_seconds_per_sequence: 1e19,
            ..GraphOpt::default()
        });
        let graph = builder
            .build_with_index(Arc::from(reads(3)), Arc::new(EmptyIndex))
            .unwrap();
        assert_eq!(graph.num_edges(), 3);
    }

    #[test]
    fn test_infinite_budget_is_a_configuration_error() {
        let builder = GraphBuilderFmIndex::new(GraphOpt {
            pool_seconds_per_sequence: f64::INFINITY,
            ..GraphOpt::default()
        });
        let err = builder.build_assembly_graph(reads(2)).unwrap_err();
        assert!(matches!(err, GraphBuildError::Configuration(_)));
    }

    #[test]
    fn test_corpus_average() {
        let seqs = reads(3);
        let index = SequenceIndex::build(&seqs, &GraphOpt::default().index_params());
        let avg = corpus_average(&index, &seqs, &GraphOpt::default().seeding_params());
        // Every seed occurs in the three identical reads and repeats inside each read
        assert!(avg >= 2.0);
        assert_eq!(corpus_average(&EmptyIndex, &seqs, &GraphOpt::default().seeding_params()), 0.0);
    }
}
