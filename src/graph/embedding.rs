//! Containment of one read inside another.

use super::edge::OverlapEvidence;

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyEmbedded {
    /// The contained read
    pub sequence_id: usize,
    pub sequence_length: usize,
    pub host_id: usize,
    /// The contained read maps to the reverse strand of the host
    pub reverse: bool,
    /// Placement on the host, inclusive on both ends
    pub host_start: i64,
    pub host_end: i64,
    pub host_start_sd: f64,
    /// Evidence spans, half-open, forward strand of each read
    pub host_evidence_start: usize,
    pub host_evidence_end: usize,
    pub sequence_evidence_start: usize,
    pub sequence_evidence_end: usize,
    pub evidence: OverlapEvidence,
}

impl AssemblyEmbedded {
    /// Share of the contained read spanned by evidence on the host.
    pub fn evidence_proportion(&self) -> f64 {
        if self.sequence_length == 0 {
            return 0.0;
        }
        let span = self.host_evidence_end.saturating_sub(self.host_evidence_start);
        span as f64 / self.sequence_length as f64
    }

    pub fn indels_per_kbp(&self) -> f64 {
        if self.sequence_length == 0 {
            return 0.0;
        }
        1000.0 * self.evidence.num_indels as f64 / self.sequence_length as f64
    }
}
