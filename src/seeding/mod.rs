//! Seed extraction and hit collection.
//!
//! A query read (in one orientation) is cut into fixed-length seeds at a fixed
//! spacing. Each seed is looked up in the `SeedIndex`; hits on sequences with
//! a smaller id than the query are grouped by subject.
//!
//! # Module Organization
//!
//! - `types` - `Seed`, `KmerHit` and the per-orientation `HitTable`
//! - `extraction` - deterministic, deduplicated seed extraction
//! - `collection` - index lookups, repetitive seed filtering, grouping

mod collection;
mod extraction;
mod types;

pub use collection::{seed_multiplicity_stats, HitCollector};
pub use extraction::{extract_seeds, pack_kmer};
pub use types::{HitTable, KmerHit, Seed};
