//! Deterministic seed extraction.

use std::collections::HashSet;

use super::types::Seed;
use crate::utils::AMBIGUOUS_CODE;

// Function to pack up to 32 2-bit codes into a u64
// Returns None when the window contains an ambiguous base
#[inline]
pub fn pack_kmer(codes: &[u8]) -> Option<u64> {
    let mut kmer = 0u64;
    for &c in codes {
        if c >= AMBIGUOUS_CODE {
            return None;
        }
        kmer = (kmer << 2) | c as u64;
    }
    Some(kmer)
}

/// Extract seeds of `seed_length` every `spacing` bases, plus the last full
/// window so the read end is always covered.
///
/// Seeds with ambiguous bases are skipped. Repeated seeds keep only their
/// first occurrence. `out` is cleared first.
pub fn extract_seeds(codes: &[u8], seed_length: usize, spacing: usize, out: &mut Vec<Seed>) {
    out.clear();
    if seed_length == 0 || codes.len() < seed_length {
        return;
    }
    let last = codes.len() - seed_length;
    let mut seen = HashSet::with_capacity(codes.len() / spacing.max(1) + 1);
    let mut push = |pos: usize, out: &mut Vec<Seed>| {
        if let Some(kmer) = pack_kmer(&codes[pos..pos + seed_length]) {
            if seen.insert(kmer) {
                out.push(Seed {
                    query_pos: pos as u32,
                    kmer,
                });
            }
        }
    };

    let mut pos = 0;
    while pos <= last {
        push(pos, out);
        pos += spacing.max(1);
    }
    if last % spacing.max(1) != 0 {
        push(last, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encode_sequence;

    fn positions(seq: &[u8], k: usize, spacing: usize) -> Vec<u32> {
        let mut seeds = Vec::new();
        extract_seeds(&encode_sequence(seq), k, spacing, &mut seeds);
        seeds.iter().map(|s| s.query_pos).collect()
    }

    #[test]
    fn test_pack_kmer() {
        assert_eq!(pack_kmer(&[0, 1, 2, 3]), Some(0b00_01_10_11));
        assert_eq!(pack_kmer(&[0, 4]), None);
    }

    #[test]
    fn test_spacing_and_last_window() {
        // 10 bases, k=4, spacing 3: 0, 3, 6 plus the last window at 6 (already there)
        assert_eq!(positions(b"ACGTTGCAAC", 4, 3), vec![0, 3, 6]);
        // 11 bases: 0, 3, 6 plus 7
        assert_eq!(positions(b"ACGTTGCAACG", 4, 3), vec![0, 3, 6, 7]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        assert_eq!(positions(b"ACGACGACG", 3, 3), vec![0]);
    }

    #[test]
    fn test_ambiguous_windows_skipped() {
        assert_eq!(positions(b"ACGNTTGC", 3, 1), vec![0, 4, 5]);
    }

    #[test]
    fn test_short_read_has_no_seeds() {
        assert!(positions(b"ACG", 4, 1).is_empty());
    }
}
