//! Hit collection for one query orientation.

use super::extraction::extract_seeds;
use super::types::{HitTable, KmerHit, Seed};
use crate::graph_opt::SeedingParams;
use crate::index::SeedIndex;

/// Looks up query seeds and groups the hits by subject.
pub struct HitCollector<'a, I: SeedIndex + ?Sized> {
    index: &'a I,
    params: &'a SeedingParams,
    /// Corpus-wide average multiplicity, when it has been computed
    corpus_average: Option<f64>,
}

impl<'a, I: SeedIndex + ?Sized> HitCollector<'a, I> {
    pub fn new(index: &'a I, params: &'a SeedingParams, corpus_average: Option<f64>) -> Self {
        Self {
            index,
            params,
            corpus_average,
        }
    }

    /// Collect hits of `query_codes` (already in the searched orientation).
    ///
    /// Only subjects with an id below `query_id` are kept. In the forward
    /// orientation one occurrence per seed is the query itself; it is not
    /// counted toward the seed multiplicity and its hits go to `self_hits`.
    pub fn collect(
        &self,
        query_id: usize,
        query_codes: &[u8],
        is_rev: bool,
        seeds: &mut Vec<Seed>,
        counts: &mut Vec<usize>,
    ) -> HitTable {
        let k = self.params.seed_length;
        extract_seeds(query_codes, k, self.params.seed_spacing, seeds);

        let self_matches = usize::from(!is_rev);
        counts.clear();
        counts.extend(seeds.iter().map(|s| {
            let pos = s.query_pos as usize;
            self.index
                .count(&query_codes[pos..pos + k])
                .saturating_sub(self_matches)
        }));

        let mut table = HitTable {
            num_seeds: seeds.len(),
            ..HitTable::default()
        };
        if seeds.is_empty() {
            return table;
        }
        table.average_hits = counts.iter().sum::<usize>() as f64 / seeds.len() as f64;
        table.reference_hits = self
            .corpus_average
            .map_or(table.average_hits, |c| c.min(table.average_hits))
            .max(1.0);
        let cutoff = self.params.max_hits_ratio * table.reference_hits;

        for (seed, &count) in seeds.iter().zip(counts.iter()) {
            if count as f64 > cutoff {
                table.repetitive_seeds += 1;
                continue;
            }
            if count == 0 && is_rev {
                continue;
            }
            let pos = seed.query_pos as usize;
            let mut informative = false;
            for hit in self.index.search(&query_codes[pos..pos + k]) {
                let subject_id = hit.sequence_id as usize;
                let kmer_hit = KmerHit {
                    subject_id: hit.sequence_id,
                    subject_pos: hit.start,
                    query_pos: seed.query_pos,
                    total_hits: count as u32,
                };
                if subject_id < query_id {
                    informative = true;
                    table
                        .hits_by_subject
                        .entry(hit.sequence_id)
                        .or_default()
                        .push(kmer_hit);
                } else if subject_id == query_id && !is_rev {
                    table.self_hits.push(kmer_hit);
                }
            }
            table.informative_seeds += usize::from(informative);
        }

        log::trace!(
            "Query {} rc={}: {} seeds, average hits {:.2}, {} repetitive, {} subjects",
            query_id,
            is_rev,
            table.num_seeds,
            table.average_hits,
            table.repetitive_seeds,
            table.hits_by_subject.len()
        );
        table
    }
}

/// Sum and number of forward seed multiplicities (self match excluded) of one read.
///
/// Used to compute the corpus-wide average before per-read processing starts.
pub fn seed_multiplicity_stats<I: SeedIndex + ?Sized>(
    index: &I,
    codes: &[u8],
    params: &SeedingParams,
) -> (u64, u64) {
    let mut seeds = Vec::new();
    extract_seeds(codes, params.seed_length, params.seed_spacing, &mut seeds);
    let k = params.seed_length;
    let total: u64 = seeds
        .iter()
        .map(|s| {
            let pos = s.query_pos as usize;
            index.count(&codes[pos..pos + k]).saturating_sub(1) as u64
        })
        .sum();
    (total, seeds.len() as u64)
}
