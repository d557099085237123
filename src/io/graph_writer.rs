// Tab-separated report of a built graph
//
// Line types, one record per line:
//   S  id  name  length
//   E  vertex1  vertex2  overlap  cost  evidence...
//   M  sequence  host  strand  host_start  host_end  evidence...
// Vertices are written as <id>B (read start) or <id>E (read end).

use std::io::{self, Write};

use crate::graph::{AssemblyEdge, AssemblyEmbedded, AssemblyGraph, OverlapEvidence};

const EDGE_HEADER: &str = "#E\tvertex1\tvertex2\toverlap\tcost\tv1_evidence_start\tv1_evidence_end\t\
v2_evidence_start\tv2_evidence_end\tshared_kmers\traw_hits\traw_hits_sd\tmismatches\tindels\t\
coverage\tweighted_coverage\taverage_overlap\tmedian_overlap\tfrom_limits_overlap\toverlap_sd";

const EMBEDDING_HEADER: &str = "#M\tsequence\thost\tstrand\thost_start\thost_end\thost_evidence_start\t\
host_evidence_end\tsequence_evidence_start\tsequence_evidence_end\tshared_kmers\traw_hits\traw_hits_sd\t\
mismatches\tindels\tcoverage\tweighted_coverage\thost_start_sd";

fn write_evidence<W: Write>(out: &mut W, evidence: &OverlapEvidence) -> io::Result<()> {
    write!(
        out,
        "\t{}\t{}\t{:.0}\t{}\t{}\t{}\t{}",
        evidence.num_shared_kmers,
        evidence.raw_kmer_hits,
        evidence.raw_kmer_hits_start_sd,
        evidence.num_mismatches,
        evidence.num_indels,
        evidence.coverage_shared_kmers,
        evidence.weighted_coverage_shared_kmers
    )
}

fn write_edge<W: Write>(out: &mut W, edge: &AssemblyEdge) -> io::Result<()> {
    write!(
        out,
        "E\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        edge.vertex1,
        edge.vertex2,
        edge.overlap,
        edge.cost,
        edge.vertex1_evidence_start,
        edge.vertex1_evidence_end,
        edge.vertex2_evidence_start,
        edge.vertex2_evidence_end
    )?;
    write_evidence(out, &edge.evidence)?;
    writeln!(
        out,
        "\t{}\t{}\t{}\t{:.0}",
        edge.average_overlap, edge.median_overlap, edge.from_limits_overlap, edge.overlap_sd
    )
}

fn write_embedding<W: Write>(out: &mut W, embedded: &AssemblyEmbedded) -> io::Result<()> {
    write!(
        out,
        "M\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        embedded.sequence_id,
        embedded.host_id,
        if embedded.reverse { '-' } else { '+' },
        embedded.host_start,
        embedded.host_end,
        embedded.host_evidence_start,
        embedded.host_evidence_end,
        embedded.sequence_evidence_start,
        embedded.sequence_evidence_end
    )?;
    write_evidence(out, &embedded.evidence)?;
    writeln!(out, "\t{:.0}", embedded.host_start_sd)
}

/// Write sequences, edges (same-sequence edges included) and embeddings.
pub fn write_graph<W: Write>(graph: &AssemblyGraph, mut out: W) -> io::Result<()> {
    writeln!(out, "#S\tid\tname\tlength")?;
    for (id, seq) in graph.sequences().iter().enumerate() {
        writeln!(out, "S\t{}\t{}\t{}", id, seq.name, seq.len())?;
    }
    writeln!(out, "{EDGE_HEADER}")?;
    for edge in graph.edges() {
        write_edge(&mut out, edge)?;
    }
    writeln!(out, "{EMBEDDING_HEADER}")?;
    for embedded in graph.embeddings() {
        write_embedding(&mut out, embedded)?;
    }
    out.flush()
}
