//! Thread-local workspace for reusable allocations
//!
//! Every worker thread keeps one workspace that is reused across the reads it
//! processes. Buffers are cleared, not freed, between reads; the alignment
//! matrices are shrunk after an unusually long read.

use crate::alignment::DpBuffers;
use crate::seeding::Seed;
use std::cell::RefCell;

/// Expected read length for pre-allocation
const EXPECTED_READ_LEN: usize = 16 * 1024;

/// Expected seeds per orientation
const EXPECTED_SEEDS: usize = EXPECTED_READ_LEN / 2;

// Thread-local workspace for graph construction buffers
thread_local! {
    static WORKSPACE: RefCell<OverlapWorkspace> = RefCell::new(OverlapWorkspace::new());
}

/// Reusable buffers for one query read
pub struct OverlapWorkspace {
    /// Encoded query, forward strand
    pub encoded_query: Vec<u8>,
    /// Encoded reverse complement
    pub encoded_query_rc: Vec<u8>,
    /// Seeds of the orientation being searched
    pub seeds: Vec<Seed>,
    /// Per-seed multiplicities, parallel to `seeds`
    pub counts: Vec<usize>,
    /// Encoded subject of the pair being aligned
    pub encoded_subject: Vec<u8>,
    /// Banded alignment matrices
    pub dp: DpBuffers,
}

impl OverlapWorkspace {
    pub fn new() -> Self {
        Self {
            encoded_query: Vec::with_capacity(EXPECTED_READ_LEN),
            encoded_query_rc: Vec::with_capacity(EXPECTED_READ_LEN),
            seeds: Vec::with_capacity(EXPECTED_SEEDS),
            counts: Vec::with_capacity(EXPECTED_SEEDS),
            encoded_subject: Vec::with_capacity(EXPECTED_READ_LEN),
            dp: DpBuffers::new(),
        }
    }

    /// Clear all buffers for reuse (keeps capacity)
    pub fn clear(&mut self) {
        self.encoded_query.clear();
        self.encoded_query_rc.clear();
        self.seeds.clear();
        self.counts.clear();
        self.encoded_subject.clear();
        if self.encoded_query.capacity() > 8 * EXPECTED_READ_LEN {
            self.encoded_query.shrink_to(EXPECTED_READ_LEN);
            self.encoded_query_rc.shrink_to(EXPECTED_READ_LEN);
            self.encoded_subject.shrink_to(EXPECTED_READ_LEN);
            self.dp.shrink();
        }
    }
}

impl Default for OverlapWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a closure with the thread-local workspace
///
/// # Example
/// ```ignore
/// use crate::pipeline::workspace::with_workspace;
///
/// with_workspace(|ws| {
///     ws.clear();
///     // Use ws.encoded_query, ws.seeds, etc.
/// });
/// ```
pub fn with_workspace<F, R>(f: F) -> R
where
    F: FnOnce(&mut OverlapWorkspace) -> R,
{
    WORKSPACE.with(|ws| f(&mut ws.borrow_mut()))
}
