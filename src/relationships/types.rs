//! Tagged relationship produced for one (query, subject) pair.

use std::cmp::Reverse;

use crate::graph::{AssemblyEdge, AssemblyEmbedded};

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblySequencesRelationship {
    Edge(AssemblyEdge),
    Embedded(AssemblyEmbedded),
}

impl AssemblySequencesRelationship {
    /// The read on the other side of the relationship from `query_id`.
    pub fn other_sequence(&self, query_id: usize) -> usize {
        match self {
            Self::Edge(edge) => {
                if edge.vertex1.sequence_id == query_id {
                    edge.vertex2.sequence_id
                } else {
                    edge.vertex1.sequence_id
                }
            }
            Self::Embedded(emb) => {
                if emb.sequence_id == query_id {
                    emb.host_id
                } else {
                    emb.sequence_id
                }
            }
        }
    }

    pub fn num_shared_kmers(&self) -> usize {
        match self {
            Self::Edge(edge) => edge.evidence.num_shared_kmers,
            Self::Embedded(emb) => emb.evidence.num_shared_kmers,
        }
    }

    /// Overlap length; for an embedding, the length of the contained read.
    pub fn overlap(&self) -> usize {
        match self {
            Self::Edge(edge) => edge.overlap,
            Self::Embedded(emb) => emb.sequence_length,
        }
    }

    #[inline]
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Sort key, best first: shared seeds, then overlap, then lower subject id.
    pub fn rank_key(&self, query_id: usize) -> (Reverse<usize>, Reverse<usize>, usize) {
        (
            Reverse(self.num_shared_kmers()),
            Reverse(self.overlap()),
            self.other_sequence(query_id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AssemblyVertex, OverlapEvidence};

    fn edge(query: usize, subject: usize, overlap: usize, kmers: usize) -> AssemblySequencesRelationship {
        let mut e = AssemblyEdge::new(
            AssemblyVertex::end(subject),
            AssemblyVertex::start(query),
            overlap,
            1000,
            1000,
        );
        e.evidence.num_shared_kmers = kmers;
        AssemblySequencesRelationship::Edge(e)
    }

    #[test]
    fn test_other_sequence() {
        assert_eq!(edge(5, 2, 100, 10).other_sequence(5), 2);
        let emb = AssemblySequencesRelationship::Embedded(AssemblyEmbedded {
            sequence_id: 5,
            sequence_length: 300,
            host_id: 1,
            reverse: false,
            host_start: 0,
            host_end: 299,
            host_start_sd: 0.0,
            host_evidence_start: 0,
            host_evidence_end: 300,
            sequence_evidence_start: 0,
            sequence_evidence_end: 300,
            evidence: OverlapEvidence::default(),
        });
        assert_eq!(emb.other_sequence(5), 1);
        assert_eq!(emb.other_sequence(1), 5);
        assert_eq!(emb.overlap(), 300);
        assert!(emb.is_embedding());
    }

    #[test]
    fn test_rank_order() {
        let mut batch = vec![edge(9, 4, 300, 50), edge(9, 1, 200, 80), edge(9, 3, 400, 50), edge(9, 2, 400, 50)];
        batch.sort_by_key(|r| r.rank_key(9));
        let order: Vec<usize> = batch.iter().map(|r| r.other_sequence(9)).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }
}
