//! Loading reads and reporting graphs; kept outside the graph builder.

pub mod graph_writer;
pub mod sequence_reader;

pub use graph_writer::write_graph;
pub use sequence_reader::{read_sequences, read_sequences_from, SequenceFormat};
