#![deny(clippy::correctness)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::nursery,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_lossless
)]
#![doc = include_str!("../README.md")]

mod core;
pub mod hit_miss;
pub mod knn;
pub mod shared;
pub mod utils;

pub use crate::core::{
    dataset, distance_matrix, error, metric, params, sorted_neighbors, DistanceMatrix, HubnessError, Labeled,
    LabeledDataset, Metric, NeighborParams, SortedNeighbors,
};
pub use hit_miss::HitMissNetwork;
pub use knn::NeighborSetFinder;
pub use shared::{InstanceWeights, SharedNeighborFinder};

/// The current version of the crate.
pub const VERSION: &str = "0.1.0";
