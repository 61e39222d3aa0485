//! The core traits and structs for computing neighbor sets.

pub mod dataset;
pub mod distance_matrix;
pub mod error;
pub mod metric;
pub mod params;
pub mod sorted_neighbors;

pub use dataset::{Labeled, LabeledDataset};
pub use distance_matrix::DistanceMatrix;
pub use error::HubnessError;
pub use metric::Metric;
pub use params::NeighborParams;
pub use sorted_neighbors::{Insertion, SortedNeighbors};
