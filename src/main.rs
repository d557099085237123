use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use ferrous_overlap::graph_opt::GraphCliOptions;
use ferrous_overlap::io::{read_sequences, write_graph};
use ferrous_overlap::pipeline::{GraphBuilder, GraphBuilderFmIndex};

#[derive(Parser)]
#[command(name = "ferrous-overlap")]
#[command(about = "FerrousOverlap - FM-index overlap graph construction for long reads", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the overlap graph of a read set
    Build {
        /// Input reads (FASTA or FASTQ, optionally gzip/BGZF compressed)
        #[arg(value_name = "READS")]
        reads: PathBuf,

        /// Output file for the graph report (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: GraphCliOptions,
    },
}

fn init_logger(verbosity: u8) {
    // Verbosity mapping: 1=error, 2=warn, 3=info, 4=debug, 5+=trace
    let log_level = match verbosity {
        0 | 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

fn run_build(reads: PathBuf, output: Option<PathBuf>, options: &GraphCliOptions) -> Result<()> {
    let opt = options.to_graph_opt();
    if let Err(errors) = opt.validate() {
        for error in &errors {
            log::error!("{}", error);
        }
        anyhow::bail!("invalid configuration ({} problems)", errors.len());
    }

    if opt.verbosity >= 3 {
        log::info!("Graph parameters:");
        log::info!("  Seed length: {}, spacing: {}", opt.seed_length, opt.seed_spacing);
        log::info!("  Max hits ratio: {}", opt.max_hits_ratio);
        log::info!(
            "  Min kmer percentage: {}, min overlap: {}, min evidence: {}",
            opt.min_kmer_percentage,
            opt.min_proportion_overlap,
            opt.min_proportion_evidence
        );
    }

    let sequences = read_sequences(&reads).with_context(|| format!("failed to read {}", reads.display()))?;

    let builder = GraphBuilderFmIndex::new(opt);
    let graph = builder
        .build_assembly_graph(sequences)
        .context("graph construction failed")?;

    match output {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
            write_graph(&graph, BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("Graph written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_graph(&graph, &mut out).context("failed to write graph to stdout")?;
            out.flush()?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            reads,
            output,
            options,
        } => {
            init_logger(options.verbosity);
            log::info!("Building overlap graph for reads: {}", reads.display());
            if let Err(e) = run_build(reads, output, &options) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }
}
