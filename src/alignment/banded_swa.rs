//! Banded affine-gap local alignment with traceback.
//!
//! Used as the bounded fallback when seed geometry alone cannot place a pair,
//! and to refine evidence coordinates when complete alignment is requested.
//! The band follows the diagonal predicted by the seed cluster, so time is
//! `query_len * (2 * band + 1)`. Traceback codes take four bits and are
//! packed two per byte; `band_within_budget` keeps the matrix under
//! `MAX_TRACEBACK_CELLS` cells.

use super::cigar::{push_op, CigarOp};
use crate::defaults::MAX_TRACEBACK_CELLS;
use crate::graph_opt::AlignmentParams;
use crate::utils::AMBIGUOUS_CODE;

const NEG_INF: i32 = i32::MIN / 4;

// Traceback codes for the source of H
const TB_ZERO: u8 = 0;
const TB_MATCH: u8 = 1;
const TB_DEL: u8 = 2; // Gap in the query (consumes subject)
const TB_INS: u8 = 3; // Gap in the subject (consumes query)
const TB_SOURCE_MASK: u8 = 0b11;
// Gap state flags: set when the gap was extended rather than opened
const TB_DEL_EXT: u8 = 0b0100;
const TB_INS_EXT: u8 = 0b1000;

/// Largest band whose traceback for a query of `query_len` bases fits in
/// `MAX_TRACEBACK_CELLS` cells, capped at `band`.
pub fn band_within_budget(query_len: usize, band: usize) -> usize {
    let max_width = MAX_TRACEBACK_CELLS / query_len.max(1);
    band.min(max_width.saturating_sub(1) / 2)
}

#[inline(always)]
fn set_code(packed: &mut [u8], cell: usize, code: u8) {
    packed[cell >> 1] |= code << ((cell & 1) * 4);
}

#[inline(always)]
fn get_code(packed: &[u8], cell: usize) -> u8 {
    (packed[cell >> 1] >> ((cell & 1) * 4)) & 0x0f
}

// H and E of one banded row cell
#[derive(Debug, Clone, Copy)]
pub struct EhT {
    pub h: i32,
    pub e: i32,
}

/// Reusable DP storage; one per worker thread.
#[derive(Debug, Default)]
pub struct DpBuffers {
    prev: Vec<EhT>,
    curr: Vec<EhT>,
    prev_f: Vec<i32>,
    curr_f: Vec<i32>,
    traceback: Vec<u8>,
}

impl DpBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the traceback matrix, which can be large.
    pub fn shrink(&mut self) {
        self.traceback = Vec::new();
    }
}

/// Result of a local alignment. Coordinates are 0-based, ends exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAlignment {
    pub score: i32,
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    /// Full CIGAR, soft clips included
    pub cigar: Vec<(u8, i32)>,
    pub num_mismatches: usize,
    pub insertion_bases: usize,
    pub deletion_bases: usize,
    pub query_length: usize,
}

impl LocalAlignment {
    #[inline]
    pub fn soft_clip_start(&self) -> usize {
        self.query_start
    }

    #[inline]
    pub fn soft_clip_end(&self) -> usize {
        self.query_length - self.query_end
    }

    #[inline]
    pub fn indel_bases(&self) -> usize {
        self.insertion_bases + self.deletion_bases
    }

    #[inline]
    pub fn aligned_query_length(&self) -> usize {
        self.query_end - self.query_start
    }

    pub fn indels_per_kbp(&self) -> f64 {
        let aligned = self.aligned_query_length().max(1);
        1000.0 * self.indel_bases() as f64 / aligned as f64
    }
}

pub struct BandedPairWiseSW {
    match_score: i32,
    mismatch_penalty: i32,
    gap_open: i32,
    gap_extend: i32,
}

impl BandedPairWiseSW {
    pub fn new(params: &AlignmentParams) -> Self {
        BandedPairWiseSW {
            match_score: params.match_score,
            mismatch_penalty: params.mismatch_penalty,
            gap_open: params.gap_open,
            gap_extend: params.gap_extend,
        }
    }

    #[inline(always)]
    fn score(&self, q: u8, t: u8) -> i32 {
        if q >= AMBIGUOUS_CODE || t >= AMBIGUOUS_CODE {
            -1
        } else if q == t {
            self.match_score
        } else {
            -self.mismatch_penalty
        }
    }

    /// Local alignment of `query` against `target` restricted to a band of
    /// `band` diagonals around `target_pos = query_pos + diagonal`.
    ///
    /// Returns `None` when no cell scores above zero.
    pub fn scalar_banded_swa(
        &self,
        query: &[u8],
        target: &[u8],
        diagonal: i64,
        band: usize,
        buffers: &mut DpBuffers,
    ) -> Option<LocalAlignment> {
        let qlen = query.len();
        let tlen = target.len() as i64;
        if qlen == 0 || tlen == 0 {
            return None;
        }
        let w = band as i64;
        let width = 2 * band + 1;
        let oe = self.gap_open + self.gap_extend;
        let e = self.gap_extend;

        let empty = EhT {
            h: NEG_INF,
            e: NEG_INF,
        };
        buffers.prev.clear();
        buffers.prev.resize(width, empty);
        buffers.curr.clear();
        buffers.curr.resize(width, empty);
        buffers.prev_f.clear();
        buffers.prev_f.resize(width, NEG_INF);
        buffers.curr_f.clear();
        buffers.curr_f.resize(width, NEG_INF);
        buffers.traceback.clear();
        buffers.traceback.resize((qlen * width).div_ceil(2), TB_ZERO);

        let mut best = (0i32, 0usize, 0i64);
        for i in 1..=qlen {
            // Column of band slot 0 in row i (1-based DP coordinates)
            let lo = i as i64 + diagonal - w;
            let qb = query[i - 1];
            let row_offset = (i - 1) * width;
            for k in 0..width {
                let j = lo + k as i64;
                if j < 1 || j > tlen {
                    buffers.curr[k] = empty;
                    buffers.curr_f[k] = NEG_INF;
                    continue;
                }
                // H[i-1][j-1] sits in the same slot of the previous row
                let diag = if i == 1 || j == 1 { 0 } else { buffers.prev[k].h };
                let (up_h, up_f) = if i == 1 {
                    (0, NEG_INF)
                } else if k + 1 < width {
                    (buffers.prev[k + 1].h, buffers.prev_f[k + 1])
                } else {
                    (NEG_INF, NEG_INF)
                };
                let (left_h, left_e) = if j == 1 {
                    (0, NEG_INF)
                } else if k > 0 {
                    (buffers.curr[k - 1].h, buffers.curr[k - 1].e)
                } else {
                    (NEG_INF, NEG_INF)
                };

                let mut tb = 0u8;
                let e_open = left_h - oe;
                let e_ext = left_e - e;
                let e_val = if e_ext > e_open {
                    tb |= TB_DEL_EXT;
                    e_ext
                } else {
                    e_open
                };
                let f_open = up_h - oe;
                let f_ext = up_f - e;
                let f_val = if f_ext > f_open {
                    tb |= TB_INS_EXT;
                    f_ext
                } else {
                    f_open
                };

                let m = if diag <= NEG_INF {
                    NEG_INF
                } else {
                    diag + self.score(qb, target[(j - 1) as usize])
                };
                let mut h = 0;
                let mut source = TB_ZERO;
                if m > h {
                    h = m;
                    source = TB_MATCH;
                }
                if e_val > h {
                    h = e_val;
                    source = TB_DEL;
                }
                if f_val > h {
                    h = f_val;
                    source = TB_INS;
                }
                set_code(&mut buffers.traceback, row_offset + k, tb | source);
                buffers.curr[k] = EhT { h, e: e_val };
                buffers.curr_f[k] = f_val;
                if h > best.0 {
                    best = (h, i, j);
                }
            }
            std::mem::swap(&mut buffers.prev, &mut buffers.curr);
            std::mem::swap(&mut buffers.prev_f, &mut buffers.curr_f);
        }

        if best.0 <= 0 {
            return None;
        }
        Some(self.traceback(query, target, diagonal, band, best, buffers))
    }

    fn traceback(
        &self,
        query: &[u8],
        target: &[u8],
        diagonal: i64,
        band: usize,
        best: (i32, usize, i64),
        buffers: &DpBuffers,
    ) -> LocalAlignment {
        let width = 2 * band + 1;
        let w = band as i64;
        let (score, end_i, end_j) = best;
        let mut i = end_i;
        let mut j = end_j;
        // 0 = H, 1 = in deletion (E), 2 = in insertion (F)
        let mut state = 0u8;
        let mut ops: Vec<CigarOp> = Vec::new();
        let mut num_mismatches = 0;
        let mut insertion_bases = 0;
        let mut deletion_bases = 0;

        while i > 0 && j > 0 {
            let k = (j - (i as i64 + diagonal - w)) as usize;
            if k >= width {
                break;
            }
            let tb = get_code(&buffers.traceback, (i - 1) * width + k);
            match state {
                0 => match tb & TB_SOURCE_MASK {
                    TB_MATCH => {
                        if query[i - 1] != target[(j - 1) as usize] {
                            num_mismatches += 1;
                        }
                        ops.push(CigarOp::M);
                        i -= 1;
                        j -= 1;
                    }
                    TB_DEL => state = 1,
                    TB_INS => state = 2,
                    _ => break,
                },
                1 => {
                    ops.push(CigarOp::D);
                    deletion_bases += 1;
                    if tb & TB_DEL_EXT == 0 {
                        state = 0;
                    }
                    j -= 1;
                }
                _ => {
                    ops.push(CigarOp::I);
                    insertion_bases += 1;
                    if tb & TB_INS_EXT == 0 {
                        state = 0;
                    }
                    i -= 1;
                }
            }
        }

        let query_start = i;
        let target_start = j as usize;
        let query_end = end_i;
        let mut cigar = Vec::with_capacity(ops.len() / 8 + 3);
        push_op(&mut cigar, CigarOp::S, query_start as i32);
        for &op in ops.iter().rev() {
            push_op(&mut cigar, op, 1);
        }
        push_op(&mut cigar, CigarOp::S, (query.len() - query_end) as i32);

        LocalAlignment {
            score,
            query_start,
            query_end,
            target_start,
            target_end: end_j as usize,
            cigar,
            num_mismatches,
            insertion_bases,
            deletion_bases,
            query_length: query.len(),
        }
    }
}
