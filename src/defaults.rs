// src/defaults.rs

// Seeding Constants
pub const SEED_LENGTH: usize = 15;
pub const SEED_SPACING: usize = 2;
pub const MAX_HITS_RATIO: f64 = 5.0;
pub const DEF_MIN_HITS: usize = 50;

// Filtering Constants
pub const MIN_KMER_PERCENTAGE: f64 = 20.0;
pub const MIN_PROPORTION_OVERLAP: f64 = 0.05;
pub const MIN_PROPORTION_EVIDENCE: f64 = 0.1;
pub const MIN_QUERY_COVERAGE: f64 = 0.5;
pub const MIN_EDGE_EVIDENCE_RATIO: f64 = 0.5;

// Clustering Constants
pub const CLUSTER_TOLERANCE: i64 = 100;
pub const CLUSTER_TOLERANCE_FRACTION: f64 = 0.1;
pub const SECOND_CLUSTER_RATIO: f64 = 0.8;
pub const MIN_CLUSTER_SIZE_DIVISOR: usize = 5;
pub const INTERLEAVED_CANDIDATES: usize = 10;

// Embedding Constants
pub const CONCLUSIVE_EMBEDDING_PROPORTION: f64 = 0.99;
pub const CONCLUSIVE_MAX_INDELS_PER_KBP: f64 = 10.0;
pub const FALLBACK_MAX_INDELS_PER_KBP: f64 = 20.0;

// Scoring Constants (fallback alignment)
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 4;
pub const GAP_OPEN_PENALTY: i32 = 6;
pub const GAP_EXTEND_PENALTY: i32 = 1;
pub const BAND_WIDTH: usize = 100;
pub const BAND_WIDTH_FRACTION: f64 = 0.05;
pub const MAX_BAND_WIDTH: usize = 2000;
pub const MAX_TRACEBACK_CELLS: usize = 1 << 26; // 32 MB of packed traceback codes

// Index Constants
pub const SA_SAMPLE_INTERVAL: u32 = 16;
pub const CHECKPOINT_INTERVAL: u64 = 128;
pub const AMBIGUOUS_BASE_SEED: u64 = 11;

// Graph Constants
pub const MAX_EDGES_PER_VERTEX: usize = 20;
pub const MAX_EMBEDDING_HOSTS: usize = 20;
pub const PROGRESS_INTERVAL: usize = 100;

// Pool Constants
pub const POOL_SECONDS_PER_SEQUENCE: f64 = 1.0;
pub const MIN_POOL_TIMEOUT_SECS: u64 = 60;

// Other Constants
pub const VERBOSITY: i32 = 3;
