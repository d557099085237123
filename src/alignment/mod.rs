//! Pairwise alignment used by the relationship classifier.
//!
//! - `banded_swa` - banded affine-gap local alignment with traceback
//! - `cigar` - CIGAR helpers

pub mod banded_swa;
pub mod cigar;

pub use banded_swa::{band_within_budget, BandedPairWiseSW, DpBuffers, LocalAlignment};
