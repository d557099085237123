use clap::Args;
use std::time::Duration;

use crate::defaults;

// Options controlling overlap graph construction

/// Graph construction options
#[derive(Debug, Clone)]
pub struct GraphOpt {
    // Seeding parameters
    pub seed_length: usize,  // Length of the seeds searched in the index
    pub seed_spacing: usize, // Distance between consecutive seed starts
    pub max_hits_ratio: f64, // Skip seeds with more than this multiple of the average hits

    // Filtering parameters
    pub min_kmer_percentage: f64,     // Percentage of distinct seeds required to accept a cluster
    pub min_proportion_overlap: f64,  // Minimum overlap as a proportion of either read length
    pub min_proportion_evidence: f64, // Minimum evidence span as a proportion of the overlap

    // Clustering parameters
    pub cluster_tolerance: i64,          // Minimum width of the predicted offset band
    pub cluster_tolerance_fraction: f64, // Band width as a fraction of the query length
    pub second_cluster_ratio: f64,       // Seed support a second cluster needs relative to the first

    // Embedding parameters
    pub conclusive_embedding_proportion: f64,
    pub conclusive_max_indels_per_kbp: f64,
    pub fallback_max_indels_per_kbp: f64, // Indel rate above which a fallback alignment fails

    // Scoring parameters for the fallback alignment
    pub a: i32,      // Match score
    pub b: i32,      // Mismatch penalty
    pub o: i32,      // Gap open penalty
    pub e: i32,      // Gap extension penalty
    pub w: usize,    // Minimum band width
    pub w_frac: f64, // Band width as a fraction of the aligned query length

    // Index parameters
    pub sa_sample_interval: u32,
    pub checkpoint_interval: u64,

    // Graph parameters
    pub max_edges_per_vertex: usize,
    pub max_embedding_hosts: usize,

    // Processing parameters
    pub n_threads: usize,
    pub extensive_search: bool,   // Evaluate every candidate instead of stopping early
    pub complete_alignment: bool, // Align candidates instead of trusting seed geometry
    pub pool_seconds_per_sequence: f64,
    pub min_pool_timeout_secs: u64,

    pub verbosity: i32, // Verbosity level (1=error, 2=warning, 3=message, 4+=debug)
}

// ============================================================================
// STAGE-SPECIFIC PARAMETER BUNDLES
// ============================================================================

/// Parameters for seed extraction and hit collection
#[derive(Debug, Clone)]
pub struct SeedingParams {
    pub seed_length: usize,
    pub seed_spacing: usize,
    pub max_hits_ratio: f64,
}

/// Parameters for grouping hits into clusters
#[derive(Debug, Clone)]
pub struct ClusteringParams {
    pub tolerance: i64,
    pub tolerance_fraction: f64,
    pub second_cluster_ratio: f64,
}

/// Parameters for the fallback alignment
#[derive(Debug, Clone)]
pub struct AlignmentParams {
    pub match_score: i32,
    pub mismatch_penalty: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub band_width: usize,
    pub band_width_fraction: f64,
}

/// Parameters for relationship classification
#[derive(Debug, Clone)]
pub struct ClassifierParams {
    pub min_kmer_percentage: f64,
    pub min_proportion_overlap: f64,
    pub min_proportion_evidence: f64,
    pub complete_alignment: bool,
    pub fallback_max_indels_per_kbp: f64,
    pub conclusive_embedding_proportion: f64,
    pub conclusive_max_indels_per_kbp: f64,
    pub alignment: AlignmentParams,
}

/// Parameters for index construction
#[derive(Debug, Clone)]
pub struct IndexParams {
    pub sa_sample_interval: u32,
    pub checkpoint_interval: u64,
    pub ambiguous_base_seed: u64,
}

/// Parameters for committing relationships into the graph
#[derive(Debug, Clone)]
pub struct CommitParams {
    pub max_edges_per_vertex: usize,
    pub max_embedding_hosts: usize,
}

impl Default for GraphOpt {
    fn default() -> Self {
        GraphOpt {
            seed_length: defaults::SEED_LENGTH,
            seed_spacing: defaults::SEED_SPACING,
            max_hits_ratio: defaults::MAX_HITS_RATIO,

            min_kmer_percentage: defaults::MIN_KMER_PERCENTAGE,
            min_proportion_overlap: defaults::MIN_PROPORTION_OVERLAP,
            min_proportion_evidence: defaults::MIN_PROPORTION_EVIDENCE,

            cluster_tolerance: defaults::CLUSTER_TOLERANCE,
            cluster_tolerance_fraction: defaults::CLUSTER_TOLERANCE_FRACTION,
            second_cluster_ratio: defaults::SECOND_CLUSTER_RATIO,

            conclusive_embedding_proportion: defaults::CONCLUSIVE_EMBEDDING_PROPORTION,
            conclusive_max_indels_per_kbp: defaults::CONCLUSIVE_MAX_INDELS_PER_KBP,
            fallback_max_indels_per_kbp: defaults::FALLBACK_MAX_INDELS_PER_KBP,

            a: defaults::MATCH_SCORE,
            b: defaults::MISMATCH_PENALTY,
            o: defaults::GAP_OPEN_PENALTY,
            e: defaults::GAP_EXTEND_PENALTY,
            w: defaults::BAND_WIDTH,
            w_frac: defaults::BAND_WIDTH_FRACTION,

            sa_sample_interval: defaults::SA_SAMPLE_INTERVAL,
            checkpoint_interval: defaults::CHECKPOINT_INTERVAL,

            max_edges_per_vertex: defaults::MAX_EDGES_PER_VERTEX,
            max_embedding_hosts: defaults::MAX_EMBEDDING_HOSTS,

            n_threads: 1,
            extensive_search: false,
            complete_alignment: false,
            pool_seconds_per_sequence: defaults::POOL_SECONDS_PER_SEQUENCE,
            min_pool_timeout_secs: defaults::MIN_POOL_TIMEOUT_SECS,

            verbosity: defaults::VERBOSITY,
        }
    }
}

impl GraphOpt {
    // ========================================================================
    // STAGE-SPECIFIC PARAMETER ACCESSORS
    // ========================================================================

    pub fn seeding_params(&self) -> SeedingParams {
        SeedingParams {
            seed_length: self.seed_length,
            seed_spacing: self.seed_spacing,
            max_hits_ratio: self.max_hits_ratio,
        }
    }

    pub fn clustering_params(&self) -> ClusteringParams {
        ClusteringParams {
            tolerance: self.cluster_tolerance,
            tolerance_fraction: self.cluster_tolerance_fraction,
            second_cluster_ratio: self.second_cluster_ratio,
        }
    }

    pub fn alignment_params(&self) -> AlignmentParams {
        AlignmentParams {
            match_score: self.a,
            mismatch_penalty: self.b,
            gap_open: self.o,
            gap_extend: self.e,
            band_width: self.w,
            band_width_fraction: self.w_frac,
        }
    }

    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            min_kmer_percentage: self.min_kmer_percentage,
            min_proportion_overlap: self.min_proportion_overlap,
            min_proportion_evidence: self.min_proportion_evidence,
            complete_alignment: self.complete_alignment,
            fallback_max_indels_per_kbp: self.fallback_max_indels_per_kbp,
            conclusive_embedding_proportion: self.conclusive_embedding_proportion,
            conclusive_max_indels_per_kbp: self.conclusive_max_indels_per_kbp,
            alignment: self.alignment_params(),
        }
    }

    pub fn index_params(&self) -> IndexParams {
        IndexParams {
            sa_sample_interval: self.sa_sample_interval,
            checkpoint_interval: self.checkpoint_interval,
            ambiguous_base_seed: defaults::AMBIGUOUS_BASE_SEED,
        }
    }

    pub fn commit_params(&self) -> CommitParams {
        CommitParams {
            max_edges_per_vertex: self.max_edges_per_vertex,
            max_embedding_hosts: self.max_embedding_hosts,
        }
    }

    /// Wall-clock budget for draining the worker pool over `num_sequences` tasks.
    ///
    /// `None` when the budget does not fit in a `Duration`; the pool is then
    /// waited on without a deadline.
    pub fn pool_timeout(&self, num_sequences: usize) -> Option<Duration> {
        let scaled = self.pool_seconds_per_sequence * num_sequences as f64;
        Duration::try_from_secs_f64(scaled.max(self.min_pool_timeout_secs as f64)).ok()
    }

    /// Validate parameters for consistency across stages
    /// Returns Ok(()) if valid, or Err with description of issues
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Seeding validation
        if self.seed_length < 1 || self.seed_length > 32 {
            errors.push(format!(
                "seed_length must be in [1, 32], got {}",
                self.seed_length
            ));
        }
        if self.seed_spacing < 1 {
            errors.push(format!(
                "seed_spacing must be >= 1, got {}",
                self.seed_spacing
            ));
        }
        if !(self.max_hits_ratio > 0.0) {
            errors.push(format!(
                "max_hits_ratio must be > 0, got {}",
                self.max_hits_ratio
            ));
        }

        // Filtering validation
        if !(0.0..=100.0).contains(&self.min_kmer_percentage) {
            errors.push(format!(
                "min_kmer_percentage must be in [0, 100], got {}",
                self.min_kmer_percentage
            ));
        }
        if !(0.0..=1.0).contains(&self.min_proportion_overlap) {
            errors.push(format!(
                "min_proportion_overlap must be in [0, 1], got {}",
                self.min_proportion_overlap
            ));
        }
        if !(0.0..=1.0).contains(&self.min_proportion_evidence) {
            errors.push(format!(
                "min_proportion_evidence must be in [0, 1], got {}",
                self.min_proportion_evidence
            ));
        }

        // Clustering validation
        if self.cluster_tolerance < 0 {
            errors.push(format!(
                "cluster_tolerance must be >= 0, got {}",
                self.cluster_tolerance
            ));
        }
        if !(0.0..=1.0).contains(&self.cluster_tolerance_fraction) {
            errors.push(format!(
                "cluster_tolerance_fraction must be in [0, 1], got {}",
                self.cluster_tolerance_fraction
            ));
        }
        if !(0.0..=1.0).contains(&self.second_cluster_ratio) {
            errors.push(format!(
                "second_cluster_ratio must be in [0, 1], got {}",
                self.second_cluster_ratio
            ));
        }
        if !(0.0..=1.0).contains(&self.conclusive_embedding_proportion) {
            errors.push(format!(
                "conclusive_embedding_proportion must be in [0, 1], got {}",
                self.conclusive_embedding_proportion
            ));
        }
        if self.fallback_max_indels_per_kbp < 0.0 {
            errors.push(format!(
                "fallback_max_indels_per_kbp must be >= 0, got {}",
                self.fallback_max_indels_per_kbp
            ));
        }

        // Scoring validation
        if self.a < 1 {
            errors.push(format!("match_score must be >= 1, got {}", self.a));
        }
        if self.b < 1 {
            errors.push(format!("mismatch_penalty must be >= 1, got {}", self.b));
        }
        if self.o < 0 || self.e < 1 {
            errors.push(format!(
                "gap penalties must be open >= 0 and extend >= 1, got {},{}",
                self.o, self.e
            ));
        }
        if self.w < 1 {
            errors.push(format!("band_width must be >= 1, got {}", self.w));
        }

        // Index validation
        if self.sa_sample_interval < 1 {
            errors.push(format!(
                "sa_sample_interval must be >= 1, got {}",
                self.sa_sample_interval
            ));
        }
        if self.checkpoint_interval < 64 || self.checkpoint_interval % 64 != 0 {
            errors.push(format!(
                "checkpoint_interval must be a positive multiple of 64, got {}",
                self.checkpoint_interval
            ));
        }

        // Processing validation
        if self.n_threads < 1 {
            errors.push(format!("n_threads must be >= 1, got {}", self.n_threads));
        }
        if self.max_edges_per_vertex < 1 {
            errors.push(format!(
                "max_edges_per_vertex must be >= 1, got {}",
                self.max_edges_per_vertex
            ));
        }
        if !(self.pool_seconds_per_sequence > 0.0)
            || Duration::try_from_secs_f64(self.pool_seconds_per_sequence).is_err()
        {
            errors.push(format!(
                "pool_seconds_per_sequence must be a finite duration > 0, got {}",
                self.pool_seconds_per_sequence
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GraphCliOptions {
    // ===== Seeding Options =====
    /// Length of the seeds searched in the index
    #[arg(short = 'k', long, value_name = "INT", default_value_t = defaults::SEED_LENGTH)]
    pub seed_length: usize,

    /// Distance between consecutive seed starts
    #[arg(short = 's', long, value_name = "INT", default_value_t = defaults::SEED_SPACING)]
    pub seed_spacing: usize,

    /// Skip seeds with more than FLOAT times the average number of hits
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::MAX_HITS_RATIO)]
    pub max_hits_ratio: f64,

    // ===== Filtering Options =====
    /// Minimum percentage of distinct seeds supporting a containment
    #[arg(short = 'p', long, value_name = "FLOAT", default_value_t = defaults::MIN_KMER_PERCENTAGE)]
    pub min_kmer_percentage: f64,

    /// Minimum overlap as a proportion of either read length
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::MIN_PROPORTION_OVERLAP)]
    pub min_proportion_overlap: f64,

    /// Minimum evidence span as a proportion of the overlap
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::MIN_PROPORTION_EVIDENCE)]
    pub min_proportion_evidence: f64,

    // ===== Search Options =====
    /// Evaluate every candidate subject instead of stopping at a conclusive containment
    #[arg(long)]
    pub extensive_search: bool,

    /// Align every candidate pair instead of trusting seed geometry
    #[arg(long)]
    pub complete_alignment: bool,

    /// Indels per kbp above which a fallback alignment is rejected
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::FALLBACK_MAX_INDELS_PER_KBP)]
    pub fallback_max_indels_per_kbp: f64,

    // ===== Graph Options =====
    /// Keep at most INT edges per read end from each read's batch
    #[arg(long, value_name = "INT", default_value_t = defaults::MAX_EDGES_PER_VERTEX)]
    pub max_edges_per_vertex: usize,

    /// Keep at most INT containing reads per read from each read's batch
    #[arg(long, value_name = "INT", default_value_t = defaults::MAX_EMBEDDING_HOSTS)]
    pub max_embedding_hosts: usize,

    // ===== Index Options =====
    /// Suffix array sampling interval
    #[arg(long, value_name = "INT", default_value_t = defaults::SA_SAMPLE_INTERVAL)]
    pub sa_sample_interval: u32,

    /// Distance between rank checkpoints (multiple of 64)
    #[arg(long, value_name = "INT", default_value_t = defaults::CHECKPOINT_INTERVAL)]
    pub checkpoint_interval: u64,

    // ===== Processing Options =====
    /// Number of threads (default: all available cores)
    #[arg(short = 't', long, value_name = "INT")]
    pub threads: Option<usize>,

    /// Seconds of pool budget per input read
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::POOL_SECONDS_PER_SEQUENCE)]
    pub pool_seconds_per_sequence: f64,

    /// Minimum pool budget in seconds
    #[arg(long, value_name = "INT", default_value_t = defaults::MIN_POOL_TIMEOUT_SECS)]
    pub min_pool_timeout_secs: u64,

    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = 3)]
    pub verbosity: u8,
}

impl GraphCliOptions {
    /// Build a `GraphOpt` from the parsed flags.
    pub fn to_graph_opt(&self) -> GraphOpt {
        GraphOpt {
            seed_length: self.seed_length,
            seed_spacing: self.seed_spacing,
            max_hits_ratio: self.max_hits_ratio,
            min_kmer_percentage: self.min_kmer_percentage,
            min_proportion_overlap: self.min_proportion_overlap,
            min_proportion_evidence: self.min_proportion_evidence,
            extensive_search: self.extensive_search,
            complete_alignment: self.complete_alignment,
            fallback_max_indels_per_kbp: self.fallback_max_indels_per_kbp,
            max_edges_per_vertex: self.max_edges_per_vertex,
            max_embedding_hosts: self.max_embedding_hosts,
            sa_sample_interval: self.sa_sample_interval,
            checkpoint_interval: self.checkpoint_interval,
            n_threads: self.threads.unwrap_or_else(num_cpus::get).max(1),
            pool_seconds_per_sequence: self.pool_seconds_per_sequence,
            min_pool_timeout_secs: self.min_pool_timeout_secs,
            verbosity: self.verbosity as i32,
            ..GraphOpt::default()
        }
    }
}
