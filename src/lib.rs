pub mod alignment; // Banded local alignment for the complete-alignment refinement
pub mod clustering; // Offset-band clustering of seed hits
pub mod defaults;
pub mod error;
pub mod graph; // Vertices, edges, embeddings and the shared graph store
pub mod graph_opt;
pub mod index; // FM-index over all reads (BWT search, occurrence counting)
pub mod io; // FASTA/FASTQ loading and graph reports
pub mod pipeline; // Worker pool driver and per-read search
pub mod relationships; // Edge/embedding classification
pub mod seeding; // Seed extraction and hit collection
pub mod sequence;
pub mod utils;

pub use error::{GraphBuildError, PairError};
pub use graph::AssemblyGraph;
pub use graph_opt::GraphOpt;
pub use pipeline::{GraphBuilder, GraphBuilderFmIndex};
pub use sequence::ReadSequence;
