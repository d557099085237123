//! CIGAR helpers for the fallback aligner.
//!
//! CIGARs are carried as `(op, len)` pairs with the op as its SAM byte.

use std::fmt::Write;

/// CIGAR operations produced by the local aligner
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CigarOp {
    M = b'M', // Match/mismatch
    I = b'I', // Insertion to the subject
    D = b'D', // Deletion from the subject
    S = b'S', // Soft clip
}

impl CigarOp {
    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub const fn consumes_query(self) -> bool {
        matches!(self, Self::M | Self::I | Self::S)
    }

    #[inline(always)]
    pub const fn consumes_ref(self) -> bool {
        matches!(self, Self::M | Self::D)
    }
}

#[inline(always)]
pub const fn op_consumes_query(op: u8) -> bool {
    matches!(op, b'M' | b'I' | b'S' | b'=' | b'X')
}

#[inline(always)]
pub const fn op_consumes_ref(op: u8) -> bool {
    matches!(op, b'M' | b'D' | b'N' | b'=' | b'X')
}

/// Append one operation, merging with the previous one when identical.
#[inline]
pub fn push_op(cigar: &mut Vec<(u8, i32)>, op: CigarOp, len: i32) {
    if len <= 0 {
        return;
    }
    match cigar.last_mut() {
        Some(last) if last.0 == op.to_byte() => last.1 += len,
        _ => cigar.push((op.to_byte(), len)),
    }
}

/// Merge adjacent identical operations in place.
pub fn normalize_in_place(cigar: &mut Vec<(u8, i32)>) {
    if cigar.len() <= 1 {
        return;
    }
    let mut write = 0;
    for read in 1..cigar.len() {
        if cigar[read].0 == cigar[write].0 {
            cigar[write].1 += cigar[read].1;
        } else {
            write += 1;
            cigar[write] = cigar[read];
        }
    }
    cigar.truncate(write + 1);
}

/// Subject bases spanned by the alignment (M and D).
pub fn reference_length(cigar: &[(u8, i32)]) -> i32 {
    cigar
        .iter()
        .filter(|&&(op, _)| op_consumes_ref(op))
        .map(|&(_, len)| len)
        .sum()
}

/// Query bases consumed, soft clips included.
pub fn query_length(cigar: &[(u8, i32)]) -> i32 {
    cigar
        .iter()
        .filter(|&&(op, _)| op_consumes_query(op))
        .map(|&(_, len)| len)
        .sum()
}

/// Leading and trailing soft clip lengths.
pub fn soft_clips(cigar: &[(u8, i32)]) -> (i32, i32) {
    let start = match cigar.first() {
        Some(&(b'S', len)) => len,
        _ => 0,
    };
    let end = match cigar.last() {
        Some(&(b'S', len)) if cigar.len() > 1 => len,
        _ => 0,
    };
    (start, end)
}

/// Total length of insertions and deletions.
pub fn indel_bases(cigar: &[(u8, i32)]) -> i32 {
    cigar
        .iter()
        .filter(|&&(op, _)| op == b'I' || op == b'D')
        .map(|&(_, len)| len)
        .sum()
}

/// Convert CIGAR to string representation (e.g., "50M2I48M").
pub fn to_string(cigar: &[(u8, i32)]) -> String {
    if cigar.is_empty() {
        return "*".to_string();
    }
    let mut result = String::with_capacity(cigar.len() * 4);
    for &(op, len) in cigar {
        let _ = write!(&mut result, "{}{}", len, op as char);
    }
    result
}
