// benches/graph_build.rs
// Criterion benchmarks for index lookups, banded alignment and full graph builds.

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use ferrous_overlap::alignment::{BandedPairWiseSW, DpBuffers};
use ferrous_overlap::index::{SeedIndex, SequenceIndex};
use ferrous_overlap::utils::encode_sequence;
use ferrous_overlap::{GraphBuilder, GraphBuilderFmIndex, GraphOpt, ReadSequence};

// Reads sampled from one random genome, every read overlapping its neighbours
fn make_reads(genome_len: usize, read_len: usize, step: usize) -> Vec<ReadSequence> {
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);
    let genome: Vec<u8> = (0..genome_len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
    (0..)
        .map(|i| i * step)
        .take_while(|start| start + read_len <= genome_len)
        .enumerate()
        .map(|(id, start)| ReadSequence::unnamed(id, genome[start..start + read_len].to_vec()))
        .collect()
}

fn bench_index_search(c: &mut Criterion) {
    let reads = make_reads(50_000, 2000, 500);
    let opt = GraphOpt::default();
    let index = SequenceIndex::build(&reads, &opt.index_params());
    let codes = encode_sequence(&reads[reads.len() / 2].characters);
    let seeds: Vec<&[u8]> = codes.windows(opt.seed_length).step_by(opt.seed_spacing).collect();

    let mut group = c.benchmark_group("index_search");
    group.throughput(Throughput::Elements(seeds.len() as u64));
    group.bench_function("count", |b| {
        b.iter(|| seeds.iter().map(|s| index.count(black_box(s))).sum::<usize>())
    });
    group.bench_function("search", |b| {
        b.iter(|| seeds.iter().map(|s| index.search(black_box(s)).len()).sum::<usize>())
    });
    group.finish();
}

fn bench_banded_swa(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let aligner = BandedPairWiseSW::new(&GraphOpt::default().alignment_params());
    let mut group = c.benchmark_group("banded_swa");
    for (len, band) in [(500usize, 20usize), (2000, 50), (5000, 100)] {
        let target: Vec<u8> = (0..len).map(|_| rng.gen_range(0..4)).collect();
        let mut query = target.clone();
        for i in (0..len).step_by(37) {
            query[i] = (query[i] + 1) % 4;
        }
        let mut buffers = DpBuffers::new();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_function(format!("len{len}_w{band}"), |b| {
            b.iter(|| aligner.scalar_banded_swa(black_box(&query), black_box(&target), 0, band, &mut buffers))
        });
    }
    group.finish();
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");
    group.sample_size(10);
    for (extensive, name) in [(false, "early_exit"), (true, "extensive")] {
        let reads = make_reads(40_000, 2000, 400);
        let opt = GraphOpt {
            n_threads: num_cpus::get(),
            extensive_search: extensive,
            ..GraphOpt::default()
        };
        group.throughput(Throughput::Elements(reads.len() as u64));
        group.bench_function(name, |b| {
            b.iter_batched(
                || reads.clone(),
                |reads| GraphBuilderFmIndex::new(opt.clone()).build_assembly_graph(reads),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_search, bench_banded_swa, bench_graph_build);
criterion_main!(benches);
