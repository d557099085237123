//! Grouping of raw seed hits into coordinate-consistent clusters.
//!
//! - `types` - the `Cluster` produced for one (query, subject) pair
//! - `builder` - offset-band clustering and the second-cluster rule

mod builder;
mod types;

pub use builder::ClusterBuilder;
pub use types::{Cluster, SimulatedAlignment};
