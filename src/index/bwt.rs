//! Burrows-Wheeler transform over the concatenated read text.
//!
//! The suffix array comes from `bio`. Bases are shifted to 1..=4 so that the
//! terminating 0 sorts first, which is what `suffix_array` expects.

use bio::data_structures::suffix_array::suffix_array;

/// BWT code stored for the row whose suffix starts at text position 0.
pub const SENTINEL_CODE: u8 = 4;

pub type BwtInt = u64;

/// BWT plus the sampled suffix array needed to locate rows.
#[derive(Debug)]
pub struct Bwt {
    /// Row holding the sentinel: SA^-1(0)
    pub primary: BwtInt,
    /// C() array. `cumulative_count[c]` is the first row whose suffix starts with base `c`.
    pub cumulative_count: [BwtInt; 5],
    /// Number of rows (text length plus the sentinel)
    pub seq_len: BwtInt,
    /// Every `sa_sample_interval`-th row keeps its suffix array value
    pub sa_sample_interval: u32,
    /// Suffix array high bytes (40-bit positions)
    pub sa_high_bytes: Vec<u8>,
    /// Suffix array low words
    pub sa_low_words: Vec<u32>,
}

impl Bwt {
    /// Build the transform of `codes` (values 0..=3). Returns the BWT codes
    /// row by row, with `SENTINEL_CODE` at the primary row.
    pub fn from_codes(codes: &[u8], sa_sample_interval: u32) -> (Self, Vec<u8>) {
        let mut text: Vec<u8> = Vec::with_capacity(codes.len() + 1);
        text.extend(codes.iter().map(|&c| c + 1));
        text.push(0);

        let sa = suffix_array(&text);
        let seq_len = text.len() as BwtInt;

        let mut bwt_codes = vec![0u8; text.len()];
        let mut counts = [0 as BwtInt; 4];
        let mut primary = 0;
        for (row, &pos) in sa.iter().enumerate() {
            if pos == 0 {
                bwt_codes[row] = SENTINEL_CODE;
                primary = row as BwtInt;
            } else {
                let c = text[pos - 1] - 1;
                bwt_codes[row] = c;
                counts[c as usize] += 1;
            }
        }

        // Row 0 is the bare sentinel suffix
        let mut cumulative_count = [0 as BwtInt; 5];
        cumulative_count[0] = 1;
        for c in 0..4 {
            cumulative_count[c + 1] = cumulative_count[c] + counts[c];
        }

        let interval = sa_sample_interval.max(1);
        let sample_count = (seq_len as usize).div_ceil(interval as usize);
        let mut sa_high_bytes = Vec::with_capacity(sample_count);
        let mut sa_low_words = Vec::with_capacity(sample_count);
        for row in (0..sa.len()).step_by(interval as usize) {
            let value = sa[row] as u64;
            sa_high_bytes.push((value >> 32) as u8);
            sa_low_words.push(value as u32);
        }

        (
            Bwt {
                primary,
                cumulative_count,
                seq_len,
                sa_sample_interval: interval,
                sa_high_bytes,
                sa_low_words,
            },
            bwt_codes,
        )
    }

    /// Sampled suffix array value for a row that is a multiple of the interval.
    #[inline]
    pub fn sampled_sa(&self, row: BwtInt) -> BwtInt {
        let idx = (row / self.sa_sample_interval as BwtInt) as usize;
        ((self.sa_high_bytes[idx] as BwtInt) << 32) | self.sa_low_words[idx] as BwtInt
    }

    #[inline]
    pub fn is_sampled(&self, row: BwtInt) -> bool {
        row % self.sa_sample_interval as BwtInt == 0
    }
}
