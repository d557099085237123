//! FM-index over the concatenation of all reads.
//!
//! Reads are stored forward only; reverse complement lookups are done by the
//! caller searching the reverse complemented seed. Ambiguous bases are
//! replaced by random bases from a fixed-seed generator, and hits that cross
//! the boundary between two reads are dropped.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::fm_index::FmIndex;
use super::{IndexHit, SeedIndex};
use crate::graph_opt::IndexParams;
use crate::sequence::ReadSequence;
use crate::utils::{base_to_code, AMBIGUOUS_CODE};

/// Placement of one read inside the concatenated text.
#[derive(Debug, Clone, Copy)]
pub struct SequenceAnnotation {
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug)]
pub struct SequenceIndex {
    fm: FmIndex,
    annotations: Vec<SequenceAnnotation>,
    text_length: u64,
    /// Number of ambiguous bases replaced during construction
    pub ambiguous_base_count: u64,
}

impl SequenceIndex {
    pub fn build(sequences: &[ReadSequence], params: &IndexParams) -> Self {
        let text_length: u64 = sequences.iter().map(|s| s.len() as u64).sum();
        let mut codes = Vec::with_capacity(text_length as usize);
        let mut annotations = Vec::with_capacity(sequences.len());
        let mut rng = StdRng::seed_from_u64(params.ambiguous_base_seed);
        let mut ambiguous_base_count = 0;

        for seq in sequences {
            annotations.push(SequenceAnnotation {
                offset: codes.len() as u64,
                length: seq.len() as u64,
            });
            for &b in &seq.characters {
                let mut c = base_to_code(b);
                if c == AMBIGUOUS_CODE {
                    c = rng.gen_range(0..4);
                    ambiguous_base_count += 1;
                }
                codes.push(c);
            }
        }

        let fm = FmIndex::build(&codes, params.sa_sample_interval, params.checkpoint_interval);
        log::info!(
            "Built sequence index: {} sequences, {} bases, {} ambiguous bases replaced, sa_intv={}, checkpoint={}",
            sequences.len(),
            text_length,
            ambiguous_base_count,
            fm.bwt.sa_sample_interval,
            fm.checkpoint_interval
        );

        SequenceIndex {
            fm,
            annotations,
            text_length,
            ambiguous_base_count,
        }
    }

    #[inline]
    pub fn num_sequences(&self) -> usize {
        self.annotations.len()
    }

    #[inline]
    pub fn text_length(&self) -> u64 {
        self.text_length
    }

    pub fn fm_index(&self) -> &FmIndex {
        &self.fm
    }

    // Function to find the read owning a text position (binary search over offsets)
    pub fn pos_to_sequence_id(&self, pos: u64) -> Option<usize> {
        if pos >= self.text_length {
            return None;
        }
        // Empty reads share their offset with the next read; take the last match
        let idx = self.annotations.partition_point(|a| a.offset <= pos);
        let mut rid = idx.checked_sub(1)?;
        while self.annotations[rid].length == 0 {
            rid = rid.checked_sub(1)?;
        }
        Some(rid)
    }
}

impl SeedIndex for SequenceIndex {
    fn count(&self, seed: &[u8]) -> usize {
        self.fm.count(seed) as usize
    }

    fn search(&self, seed: &[u8]) -> Vec<IndexHit> {
        let Some((sp, ep)) = self.fm.backward_search(seed) else {
            return Vec::new();
        };
        let seed_len = seed.len() as u64;
        let mut hits = Vec::with_capacity((ep - sp) as usize);
        for row in sp..ep {
            let pos = self.fm.get_sa_entry(row);
            let Some(rid) = self.pos_to_sequence_id(pos) else {
                continue;
            };
            let ann = self.annotations[rid];
            if pos + seed_len > ann.offset + ann.length {
                continue;
            }
            hits.push(IndexHit {
                sequence_id: rid as u32,
                start: (pos - ann.offset) as u32,
            });
        }
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encode_sequence;

    fn params() -> IndexParams {
        IndexParams {
            sa_sample_interval: 4,
            checkpoint_interval: 64,
            ambiguous_base_seed: 11,
        }
    }

    #[test]
    fn test_search_reports_owner_and_offset() {
        let reads = vec![
            ReadSequence::unnamed(0, "ACGTACGTTTGA"),
            ReadSequence::unnamed(1, "GGGGTTGACC"),
        ];
        let index = SequenceIndex::build(&reads, &params());
        assert_eq!(index.num_sequences(), 2);
        assert_eq!(index.text_length(), 22);

        let hits = index.search(&encode_sequence(b"TTGA"));
        assert_eq!(
            hits,
            vec![
                IndexHit { sequence_id: 0, start: 8 },
                IndexHit { sequence_id: 1, start: 4 },
            ]
        );
        assert_eq!(index.count(&encode_sequence(b"TTGA")), 2);
    }

    #[test]
    fn test_hits_across_boundary_are_dropped() {
        let reads = vec![
            ReadSequence::unnamed(0, "AAAACC"),
            ReadSequence::unnamed(1, "GGTTTT"),
        ];
        let index = SequenceIndex::build(&reads, &params());
        // CCGG only exists across the junction
        assert!(index.search(&encode_sequence(b"CCGG")).is_empty());
        assert_eq!(index.search(&encode_sequence(b"CC")).len(), 1);
    }

    #[test]
    fn test_pos_to_sequence_id_skips_empty_reads() {
        let reads = vec![
            ReadSequence::unnamed(0, "ACGT"),
            ReadSequence::unnamed(1, ""),
            ReadSequence::unnamed(2, "TTTT"),
        ];
        let index = SequenceIndex::build(&reads, &params());
        assert_eq!(index.pos_to_sequence_id(0), Some(0));
        assert_eq!(index.pos_to_sequence_id(3), Some(0));
        assert_eq!(index.pos_to_sequence_id(4), Some(2));
        assert_eq!(index.pos_to_sequence_id(8), None);
    }

    #[test]
    fn test_ambiguous_bases_replaced() {
        let reads = vec![ReadSequence::unnamed(0, "ACGTNNNNACGT")];
        let index = SequenceIndex::build(&reads, &params());
        assert_eq!(index.ambiguous_base_count, 4);
        assert!(index.search(&encode_sequence(b"ACGT")).len() >= 2);
    }
}
