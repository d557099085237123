//! Overlap edges and the evidence shared by edges and embeddings.

use super::vertex::AssemblyVertex;

/// Seed and alignment evidence behind a relationship.
///
/// Without complete alignment, mismatches are unknown (zero) and indels are
/// estimated from offset changes along the seed chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlapEvidence {
    /// Distinct query seeds supporting the relationship
    pub num_shared_kmers: usize,
    pub raw_kmer_hits: usize,
    /// Standard deviation of the predicted start over the raw hits
    pub raw_kmer_hits_start_sd: f64,
    pub num_mismatches: usize,
    pub num_indels: usize,
    pub coverage_shared_kmers: usize,
    pub weighted_coverage_shared_kmers: usize,
}

/// Edge between two read extremities.
///
/// Evidence spans are half-open and given on the forward strand of the read
/// owning each vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyEdge {
    pub vertex1: AssemblyVertex,
    pub vertex2: AssemblyVertex,
    pub overlap: usize,
    /// `len1 + len2 - overlap`
    pub cost: usize,
    pub vertex1_evidence_start: usize,
    pub vertex1_evidence_end: usize,
    pub vertex2_evidence_start: usize,
    pub vertex2_evidence_end: usize,
    pub evidence: OverlapEvidence,
    pub average_overlap: i64,
    pub median_overlap: i64,
    pub from_limits_overlap: i64,
    pub overlap_sd: f64,
}

impl AssemblyEdge {
    /// Edge with its cost derived from the two read lengths. Evidence is
    /// left empty.
    pub fn new(
        vertex1: AssemblyVertex,
        vertex2: AssemblyVertex,
        overlap: usize,
        length1: usize,
        length2: usize,
    ) -> Self {
        Self {
            vertex1,
            vertex2,
            overlap,
            cost: (length1 + length2).saturating_sub(overlap),
            vertex1_evidence_start: 0,
            vertex1_evidence_end: 0,
            vertex2_evidence_start: 0,
            vertex2_evidence_end: 0,
            evidence: OverlapEvidence::default(),
            average_overlap: overlap as i64,
            median_overlap: overlap as i64,
            from_limits_overlap: overlap as i64,
            overlap_sd: 0.0,
        }
    }

    /// Bookkeeping edge joining the two ends of one read.
    pub fn same_sequence(sequence_id: usize, length: usize) -> Self {
        let mut edge = Self::new(
            AssemblyVertex::start(sequence_id),
            AssemblyVertex::end(sequence_id),
            length,
            length,
            length,
        );
        edge.vertex1_evidence_end = length;
        edge.vertex2_evidence_end = length;
        edge
    }

    #[inline]
    pub fn is_same_sequence_edge(&self) -> bool {
        self.vertex1.sequence_id == self.vertex2.sequence_id
    }

    /// Key under which the graph stores the edge, independent of direction.
    #[inline]
    pub fn key(&self) -> (usize, usize) {
        let (a, b) = (self.vertex1.index(), self.vertex2.index());
        (a.min(b), a.max(b))
    }

    /// The vertex at the other side of the edge, if `vertex` is one of its ends.
    pub fn connecting_vertex(&self, vertex: AssemblyVertex) -> Option<AssemblyVertex> {
        if self.vertex1 == vertex {
            Some(self.vertex2)
        } else if self.vertex2 == vertex {
            Some(self.vertex1)
        } else {
            None
        }
    }

    pub fn touches_sequence(&self, sequence_id: usize) -> bool {
        self.vertex1.sequence_id == sequence_id || self.vertex2.sequence_id == sequence_id
    }

    /// Evidence span on the read owning `vertex`.
    pub fn evidence_span(&self, vertex: AssemblyVertex) -> Option<(usize, usize)> {
        if self.vertex1 == vertex {
            Some((self.vertex1_evidence_start, self.vertex1_evidence_end))
        } else if self.vertex2 == vertex {
            Some((self.vertex2_evidence_start, self.vertex2_evidence_end))
        } else {
            None
        }
    }
}
