// FM-index over a BWT: rank queries, backward search and locate.
//
// Occurrence counts are kept at every `checkpoint_interval` rows. Between
// checkpoints each 64-row block stores one-hot bitmasks per base, so a rank
// query is a checkpoint lookup plus a few popcounts.

use super::bwt::{Bwt, BwtInt, SENTINEL_CODE};

pub const OCC_BLOCK: u64 = 64;

/// One-hot encoded BWT for a block of 64 rows.
/// Row `r` of the block is bit `63 - r`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccBlock {
    pub bwt_encoding_bits: [u64; 4],
}

#[inline(always)]
pub fn popcount64(x: u64) -> u64 {
    x.count_ones() as u64
}

// Mask selecting the first `n` rows of a block (n < 64)
#[inline(always)]
fn leading_rows_mask(n: u64) -> u64 {
    if n == 0 {
        0
    } else {
        !0u64 << (64 - n)
    }
}

#[derive(Debug)]
pub struct FmIndex {
    pub bwt: Bwt,
    pub checkpoint_interval: u64,
    /// Base counts in rows `[0, k * checkpoint_interval)`
    pub checkpoint_counts: Vec<[BwtInt; 4]>,
    pub blocks: Vec<OccBlock>,
}

impl FmIndex {
    /// Build the index over encoded bases (0..=3 only).
    ///
    /// `checkpoint_interval` is rounded up to a multiple of 64.
    pub fn build(codes: &[u8], sa_sample_interval: u32, checkpoint_interval: u64) -> Self {
        let (bwt, bwt_codes) = Bwt::from_codes(codes, sa_sample_interval);
        let checkpoint_interval = checkpoint_interval.max(OCC_BLOCK).div_ceil(OCC_BLOCK) * OCC_BLOCK;

        let rows = bwt_codes.len() as u64;
        // One extra block so that rank(rows) never indexes past the end
        let mut blocks = vec![OccBlock::default(); (rows / OCC_BLOCK + 1) as usize];
        let mut checkpoint_counts = Vec::with_capacity((rows / checkpoint_interval + 1) as usize);
        let mut counts = [0 as BwtInt; 4];

        for row in 0..=rows {
            if row % checkpoint_interval == 0 {
                checkpoint_counts.push(counts);
            }
            if row == rows {
                break;
            }
            let c = bwt_codes[row as usize];
            if c == SENTINEL_CODE {
                continue;
            }
            counts[c as usize] += 1;
            let block = &mut blocks[(row / OCC_BLOCK) as usize];
            block.bwt_encoding_bits[c as usize] |= 1u64 << (63 - row % OCC_BLOCK);
        }

        FmIndex {
            bwt,
            checkpoint_interval,
            checkpoint_counts,
            blocks,
        }
    }

    /// Number of rows (text length + 1).
    #[inline]
    pub fn seq_len(&self) -> BwtInt {
        self.bwt.seq_len
    }

    /// Occurrences of base `c` in BWT rows `[0, row)`.
    #[inline]
    pub fn get_occ(&self, row: BwtInt, c: u8) -> BwtInt {
        let cp = row / self.checkpoint_interval;
        let mut occ = self.checkpoint_counts[cp as usize][c as usize];
        let first_block = cp * self.checkpoint_interval / OCC_BLOCK;
        let last_block = row / OCC_BLOCK;
        for b in first_block..last_block {
            occ += popcount64(self.blocks[b as usize].bwt_encoding_bits[c as usize]);
        }
        let y = row % OCC_BLOCK;
        if y > 0 {
            let bits = self.blocks[last_block as usize].bwt_encoding_bits[c as usize];
            occ += popcount64(bits & leading_rows_mask(y));
        }
        occ
    }

    /// BWT code at a row, `SENTINEL_CODE` at the primary row.
    #[inline]
    pub fn get_bwt_base(&self, row: BwtInt) -> u8 {
        let block = &self.blocks[(row / OCC_BLOCK) as usize];
        let bit = 1u64 << (63 - row % OCC_BLOCK);
        for c in 0..4 {
            if block.bwt_encoding_bits[c] & bit != 0 {
                return c as u8;
            }
        }
        SENTINEL_CODE
    }

    /// LF mapping. `None` at the primary row, whose preceding symbol is the sentinel.
    #[inline]
    pub fn lf(&self, row: BwtInt) -> Option<BwtInt> {
        let c = self.get_bwt_base(row);
        if c == SENTINEL_CODE {
            return None;
        }
        Some(self.bwt.cumulative_count[c as usize] + self.get_occ(row, c))
    }

    /// Extend the half-open row interval `[sp, ep)` by prepending base `c`.
    #[inline]
    pub fn backward_ext(&self, sp: BwtInt, ep: BwtInt, c: u8) -> (BwtInt, BwtInt) {
        let base = self.bwt.cumulative_count[c as usize];
        (base + self.get_occ(sp, c), base + self.get_occ(ep, c))
    }

    /// Row interval of the suffixes prefixed by `pattern`, or `None` when it
    /// does not occur. Patterns containing ambiguous codes never match.
    pub fn backward_search(&self, pattern: &[u8]) -> Option<(BwtInt, BwtInt)> {
        if pattern.is_empty() {
            return None;
        }
        let mut sp = 0;
        let mut ep = self.seq_len();
        for &c in pattern.iter().rev() {
            if c > 3 {
                return None;
            }
            (sp, ep) = self.backward_ext(sp, ep, c);
            if sp >= ep {
                return None;
            }
        }
        Some((sp, ep))
    }

    /// Number of occurrences of `pattern` in the text.
    pub fn count(&self, pattern: &[u8]) -> u64 {
        self.backward_search(pattern)
            .map(|(sp, ep)| ep - sp)
            .unwrap_or(0)
    }

    // Function to recover the text position of a row by walking LF to the
    // nearest sampled row
    pub fn get_sa_entry(&self, mut row: BwtInt) -> BwtInt {
        let mut steps = 0;
        while !self.bwt.is_sampled(row) {
            match self.lf(row) {
                Some(next) => {
                    row = next;
                    steps += 1;
                }
                // Suffix starting at position 0
                None => return steps,
            }
        }
        self.bwt.sampled_sa(row) + steps
    }
}
