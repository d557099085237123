//! The shared graph store.
//!
//! Edges are keyed by the unordered pair of vertex indices and kept in
//! ordered maps so that iteration order does not depend on the order in
//! which worker threads committed their batches.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::edge::{AssemblyEdge, OverlapEvidence};
use super::embedding::AssemblyEmbedded;
use super::vertex::{AssemblyVertex, VertexEnd};
use crate::graph_opt::CommitParams;
use crate::relationships::AssemblySequencesRelationship;
use crate::sequence::ReadSequence;

/// What one batch commit kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub edges: usize,
    pub embeddings: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone)]
pub struct AssemblyGraph {
    sequences: Arc<[ReadSequence]>,
    edges: BTreeMap<(usize, usize), AssemblyEdge>,
    /// Edge keys per vertex index
    adjacency: Vec<BTreeSet<(usize, usize)>>,
    embedded_by_host: BTreeMap<usize, Vec<AssemblyEmbedded>>,
    embedded_by_sequence: BTreeMap<usize, Vec<AssemblyEmbedded>>,
}

impl Default for AssemblyGraph {
    fn default() -> Self {
        Self::new(Arc::from(Vec::new()))
    }
}

impl AssemblyGraph {
    /// Graph with two vertices and one same-sequence edge per read.
    pub fn new(sequences: Arc<[ReadSequence]>) -> Self {
        let n = sequences.len();
        let mut graph = Self {
            sequences,
            edges: BTreeMap::new(),
            adjacency: vec![BTreeSet::new(); 2 * n],
            embedded_by_host: BTreeMap::new(),
            embedded_by_sequence: BTreeMap::new(),
        };
        for id in 0..n {
            let length = graph.sequences[id].len();
            graph.add_edge(AssemblyEdge::same_sequence(id, length));
        }
        if n > 0 {
            log::info!("Created graph vertices. Vertices: {}. Edges: {}", 2 * n, graph.num_edges());
        }
        graph
    }

    pub fn sequences(&self) -> &Arc<[ReadSequence]> {
        &self.sequences
    }

    pub fn sequence(&self, id: usize) -> Option<&ReadSequence> {
        self.sequences.get(id)
    }

    pub fn sequence_length(&self, id: usize) -> usize {
        self.sequences.get(id).map_or(0, ReadSequence::len)
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges, same-sequence edges included.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_embeddings(&self) -> usize {
        self.embedded_by_sequence.values().map(Vec::len).sum()
    }

    pub fn vertex(&self, sequence_id: usize, end: VertexEnd) -> Option<AssemblyVertex> {
        (sequence_id < self.num_sequences()).then(|| AssemblyVertex::new(sequence_id, end))
    }

    /// Insert an edge unless one already joins the same two vertices.
    pub fn add_edge(&mut self, edge: AssemblyEdge) -> bool {
        let key = edge.key();
        if key.1 >= self.adjacency.len() || self.edges.contains_key(&key) {
            return false;
        }
        self.adjacency[key.0].insert(key);
        self.adjacency[key.1].insert(key);
        self.edges.insert(key, edge);
        true
    }

    pub fn add_embedded(&mut self, embedded: AssemblyEmbedded) {
        self.embedded_by_host
            .entry(embedded.host_id)
            .or_default()
            .push(embedded.clone());
        self.embedded_by_sequence
            .entry(embedded.sequence_id)
            .or_default()
            .push(embedded);
    }

    fn remove_edge(&mut self, key: (usize, usize)) -> Option<AssemblyEdge> {
        let edge = self.edges.remove(&key)?;
        self.adjacency[key.0].remove(&key);
        self.adjacency[key.1].remove(&key);
        Some(edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = &AssemblyEdge> {
        self.edges.values()
    }

    /// Edges between different reads.
    pub fn overlap_edges(&self) -> impl Iterator<Item = &AssemblyEdge> {
        self.edges.values().filter(|e| !e.is_same_sequence_edge())
    }

    pub fn edges_of(&self, vertex: AssemblyVertex) -> Vec<&AssemblyEdge> {
        self.adjacency
            .get(vertex.index())
            .map(|keys| keys.iter().filter_map(|k| self.edges.get(k)).collect())
            .unwrap_or_default()
    }

    pub fn edge_between(&self, v1: AssemblyVertex, v2: AssemblyVertex) -> Option<&AssemblyEdge> {
        let (a, b) = (v1.index(), v2.index());
        self.edges.get(&(a.min(b), a.max(b)))
    }

    pub fn same_sequence_edge(&self, sequence_id: usize) -> Option<&AssemblyEdge> {
        self.edge_between(AssemblyVertex::start(sequence_id), AssemblyVertex::end(sequence_id))
    }

    /// Store the self-cluster statistics of a read on its same-sequence edge.
    pub fn set_self_calibration(&mut self, sequence_id: usize, evidence: OverlapEvidence, overlap_sd: f64) {
        let key = (2 * sequence_id, 2 * sequence_id + 1);
        if let Some(edge) = self.edges.get_mut(&key) {
            edge.evidence = evidence;
            edge.overlap_sd = overlap_sd;
        }
    }

    pub fn embeddings(&self) -> impl Iterator<Item = &AssemblyEmbedded> {
        self.embedded_by_sequence.values().flatten()
    }

    /// Reads contained in `host_id`.
    pub fn embeddings_of_host(&self, host_id: usize) -> &[AssemblyEmbedded] {
        self.embedded_by_host.get(&host_id).map_or(&[], Vec::as_slice)
    }

    /// Hosts of `sequence_id`.
    pub fn embeddings_of_sequence(&self, sequence_id: usize) -> &[AssemblyEmbedded] {
        self.embedded_by_sequence
            .get(&sequence_id)
            .map_or(&[], Vec::as_slice)
    }

    pub fn is_embedded(&self, sequence_id: usize) -> bool {
        self.embedded_by_sequence.contains_key(&sequence_id)
    }

    pub fn embedded_sequences(&self) -> Vec<usize> {
        self.embedded_by_sequence.keys().copied().collect()
    }

    /// Commit the relationships found for one query.
    ///
    /// Keeps the best relationship per subject, then at most
    /// `max_edges_per_vertex` edges per query vertex and
    /// `max_embedding_hosts` embeddings, in rank order.
    pub fn add_relationships(
        &mut self,
        query_id: usize,
        mut batch: Vec<AssemblySequencesRelationship>,
        params: &CommitParams,
    ) -> CommitSummary {
        let mut summary = CommitSummary::default();
        batch.sort_by_key(|r| r.rank_key(query_id));

        let mut seen_subjects = BTreeSet::new();
        let mut edges_per_vertex = [0usize; 2];
        let mut embeddings = 0usize;
        for relationship in batch {
            if !seen_subjects.insert(relationship.other_sequence(query_id)) {
                summary.discarded += 1;
                continue;
            }
            match relationship {
                AssemblySequencesRelationship::Edge(edge) => {
                    let query_vertex = if edge.vertex1.sequence_id == query_id {
                        edge.vertex1
                    } else {
                        edge.vertex2
                    };
                    let slot = &mut edges_per_vertex[query_vertex.end as usize];
                    if *slot >= params.max_edges_per_vertex || !self.add_edge(edge) {
                        summary.discarded += 1;
                        continue;
                    }
                    *slot += 1;
                    summary.edges += 1;
                }
                AssemblySequencesRelationship::Embedded(embedded) => {
                    if embeddings >= params.max_embedding_hosts {
                        summary.discarded += 1;
                        continue;
                    }
                    self.add_embedded(embedded);
                    embeddings += 1;
                    summary.embeddings += 1;
                }
            }
        }
        summary
    }

    /// Detach embedded reads from the layout: every edge touching a
    /// contained read is removed, its same-sequence edge excepted.
    ///
    /// Returns the number of removed edges.
    pub fn prune_embedded_sequences(&mut self) -> usize {
        let embedded = self.embedded_sequences();
        let mut removed = 0;
        for &id in &embedded {
            let keys: Vec<(usize, usize)> = [AssemblyVertex::start(id), AssemblyVertex::end(id)]
                .iter()
                .flat_map(|v| self.adjacency[v.index()].iter().copied())
                .collect();
            for key in keys {
                let is_self = key == (2 * id, 2 * id + 1);
                if !is_self && self.remove_edge(key).is_some() {
                    removed += 1;
                }
            }
        }
        log::info!(
            "Pruned embedded sequences. Embedded: {}. Removed edges: {}. Remaining edges: {}",
            embedded.len(),
            removed,
            self.num_edges()
        );
        removed
    }
}
