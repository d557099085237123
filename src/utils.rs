// Nucleotide encoding shared by the index, the seed extractor and the aligner.
//
// Bases are carried as 2-bit codes (A=0, C=1, G=2, T=3) with 4 reserved for
// N and any other IUPAC character.

/// Code used for ambiguous bases.
pub const AMBIGUOUS_CODE: u8 = 4;

// Function to convert a base character to its 0-3 encoding
// A=0, C=1, G=2, T=3, N=4
#[inline(always)]
pub fn base_to_code(base: u8) -> u8 {
    match base {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => AMBIGUOUS_CODE,
    }
}

/// Convert a 2-bit code back to an upper-case base.
#[inline(always)]
pub const fn code_to_base(code: u8) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

// 0=A, 1=C, 2=G, 3=T, 4=N
#[inline(always)]
pub fn reverse_complement_code(code: u8) -> u8 {
    match code {
        0 => 3,
        1 => 2,
        2 => 1,
        3 => 0,
        _ => AMBIGUOUS_CODE,
    }
}

/// Encode an ASCII DNA sequence into numeric codes.
#[inline]
pub fn encode_sequence(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| base_to_code(b)).collect()
}

/// Encode `seq` into `out`, reusing its allocation.
pub fn encode_into(seq: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend(seq.iter().map(|&b| base_to_code(b)));
}

/// Reverse complement of an encoded sequence, written into `out`.
///
/// N codes stay N.
pub fn reverse_complement_into(codes: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend(codes.iter().rev().map(|&c| reverse_complement_code(c)));
}

/// Reverse complement of an encoded sequence.
#[inline]
pub fn reverse_complement_sequence(codes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(codes.len());
    reverse_complement_into(codes, &mut out);
    out
}

/// Mean and population standard deviation of a sample.
///
/// Returns `(0.0, 0.0)` for an empty sample.
pub fn mean_and_sd<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Median of an already sorted slice (lower median for even lengths).
pub fn sorted_median(sorted: &[i64]) -> Option<i64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[(sorted.len() - 1) / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sequence() {
        assert_eq!(encode_sequence(b"ACGTN"), vec![0, 1, 2, 3, 4]);
        assert_eq!(encode_sequence(b"acgtx"), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reverse_complement_non_palindromic() {
        // ACG -> CGT
        let rc = reverse_complement_sequence(&encode_sequence(b"ACG"));
        assert_eq!(rc, vec![1, 2, 3]);
    }

    #[test]
    fn test_reverse_complement_keeps_n() {
        let rc = reverse_complement_sequence(&encode_sequence(b"ANT"));
        assert_eq!(rc, vec![0, 4, 3]);
    }

    #[test]
    fn test_code_round_trip() {
        for &b in b"ACGT" {
            assert_eq!(code_to_base(base_to_code(b)), b);
        }
        assert_eq!(code_to_base(AMBIGUOUS_CODE), b'N');
    }

    #[test]
    fn test_mean_and_sd() {
        let (mean, sd) = mean_and_sd([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-9);
        assert!((sd - 2.0).abs() < 1e-9);
        assert_eq!(mean_and_sd(std::iter::empty()), (0.0, 0.0));
    }

    #[test]
    fn test_sorted_median() {
        assert_eq!(sorted_median(&[]), None);
        assert_eq!(sorted_median(&[1, 2, 3]), Some(2));
        assert_eq!(sorted_median(&[1, 2, 3, 4]), Some(2));
    }
}
