//! Shared-neighbor counts: how many `k`-nearest neighbors two points have in
//! common, as a secondary measure of similarity.

mod weights;

use std::collections::HashMap;

use distances::Number;
use rayon::prelude::*;

pub use weights::InstanceWeights;

use crate::{utils, DistanceMatrix, HubnessError, NeighborSetFinder};

/// Counts shared neighbors between every pair of points of a
/// [`NeighborSetFinder`].
///
/// The finder is only ever read. The counts are kept as the upper triangle
/// of a symmetric matrix, laid out like a [`DistanceMatrix`]. If instance
/// weights are set, each shared neighbor contributes its weight instead of
/// one.
#[derive(Clone, Debug)]
pub struct SharedNeighborFinder<'a, U> {
    /// The neighbor sets.
    nsf: &'a NeighborSetFinder<U>,
    /// The neighborhood size.
    k: usize,
    /// For each point, the rank of each of its neighbors.
    ranks: Vec<HashMap<usize, usize>>,
    /// `shared[i][j - i - 1]` for `i < j`.
    shared: Vec<Vec<f64>>,
    /// The weight of each point, if a scheme is set.
    weights: Option<(InstanceWeights, Vec<f64>)>,
}

impl<'a, U: Number> SharedNeighborFinder<'a, U> {
    /// Creates a finder over the first `k` neighbors of each point in `nsf`.
    ///
    /// # Errors
    ///
    /// * If the neighbor sets of `nsf` have not been computed.
    /// * If `k` is zero or larger than the neighborhood size of `nsf`.
    pub fn new(nsf: &'a NeighborSetFinder<U>, k: usize) -> Result<Self, HubnessError> {
        nsf.check_stats_k(k)?;
        let ranks = nsf
            .neighbor_sets()
            .iter()
            .map(|knn| {
                knn.indices()
                    .iter()
                    .take(k)
                    .enumerate()
                    .map(|(rank, &j)| (j, rank))
                    .collect()
            })
            .collect();
        Ok(Self {
            nsf,
            k,
            ranks,
            shared: Vec::new(),
            weights: None,
        })
    }

    /// Weights the shared neighbors by `scheme`, replacing any earlier
    /// weights. Counts computed before are discarded.
    ///
    /// # Errors
    ///
    /// * See [`InstanceWeights::compute`].
    pub fn set_weights(&mut self, scheme: InstanceWeights) -> Result<(), HubnessError> {
        let weights = scheme.compute(self.nsf, self.k)?;
        ftlog::debug!("Weighting shared neighbors by {scheme:?}.");
        self.weights = Some((scheme, weights));
        self.shared.clear();
        Ok(())
    }

    /// Drops the instance weights. Counts computed before are discarded.
    pub fn clear_weights(&mut self) {
        self.weights = None;
        self.shared.clear();
    }

    /// The active weighting scheme and the weight of each point.
    #[must_use]
    pub fn weights(&self) -> Option<(InstanceWeights, &[f64])> {
        self.weights.as_ref().map(|(s, w)| (*s, w.as_slice()))
    }

    /// What neighbor `m` contributes when it is shared.
    fn contribution(&self, m: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |(_, w)| w[m])
    }

    /// The rank of `j` among the neighbors of `i`, if it is one.
    #[must_use]
    pub fn rank(&self, i: usize, j: usize) -> Option<usize> {
        self.ranks[i].get(&j).copied()
    }

    /// The shared count of `i` with every later point.
    fn count_row(&self, i: usize) -> Vec<f64> {
        let lists = self.nsf.neighbor_sets();
        ((i + 1)..self.cardinality())
            .map(|j| {
                lists[j]
                    .indices()
                    .iter()
                    .take(self.k)
                    .filter(|&&m| self.ranks[i].contains_key(&m))
                    .map(|&m| self.contribution(m))
                    .sum()
            })
            .collect()
    }

    /// Counts the shared neighbors of every pair of points.
    pub fn count_shared_neighbors(&mut self) {
        ftlog::info!(
            "Counting shared neighbors for k = {} over {} points.",
            self.k,
            self.cardinality()
        );
        self.shared = (0..self.cardinality()).map(|i| self.count_row(i)).collect();
    }

    /// Parallel version of [`SharedNeighborFinder::count_shared_neighbors`]
    /// with a pool of exactly `num_threads` threads.
    ///
    /// # Errors
    ///
    /// * If `num_threads` is zero or the pool cannot be built.
    pub fn par_count_shared_neighbors(&mut self, num_threads: usize) -> Result<(), HubnessError> {
        let pool = utils::thread_pool(num_threads)?;
        ftlog::info!(
            "Counting shared neighbors for k = {} over {} points with {num_threads} threads.",
            self.k,
            self.cardinality()
        );
        let this = &*self;
        let blocks = pool.install(|| {
            utils::partitions(this.cardinality(), num_threads)
                .into_par_iter()
                .map(|range| range.map(|i| this.count_row(i)).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        });
        self.shared = blocks.into_iter().flatten().collect();
        Ok(())
    }

    /// Whether the counts have been computed.
    #[must_use]
    pub fn is_counted(&self) -> bool {
        self.shared.len() == self.cardinality()
    }

    /// The (weighted) number of neighbors shared by `i` and `j`.
    ///
    /// A point shares all of its own neighbors with itself.
    ///
    /// # Errors
    ///
    /// * If the counts have not been computed.
    /// * If `i` or `j` is out of bounds.
    pub fn shared_count(&self, i: usize, j: usize) -> Result<f64, HubnessError> {
        self.check_counted()?;
        let n = self.cardinality();
        if i >= n || j >= n {
            return Err(HubnessError::config(format!(
                "Points {i} and {j} must both be smaller than {n}."
            )));
        }
        Ok(match i.cmp(&j) {
            std::cmp::Ordering::Less => self.shared[i][j - i - 1],
            std::cmp::Ordering::Greater => self.shared[j][i - j - 1],
            std::cmp::Ordering::Equal => self.self_count(i),
        })
    }

    /// The rows of the upper triangle of the count matrix.
    #[must_use]
    pub fn shared_counts(&self) -> &[Vec<f64>] {
        &self.shared
    }

    /// The (weighted) number of neighbors a point shares with itself.
    fn self_count(&self, i: usize) -> f64 {
        self.nsf.neighbor_sets()[i]
            .indices()
            .iter()
            .take(self.k)
            .map(|&m| self.contribution(m))
            .sum()
    }

    /// Converts the counts to distances.
    ///
    /// The distance between `i` and `j` is `1 - s / min(w_i, w_j)`, where `s`
    /// is their shared count and `w_i` the count `i` shares with itself. Without
    /// weights this is `(k - s) / k` for full lists. Points with nothing to
    /// share are at distance one.
    ///
    /// # Errors
    ///
    /// * If the counts have not been computed.
    pub fn secondary_distances(&self) -> Result<DistanceMatrix<f64>, HubnessError> {
        self.check_counted()?;
        let totals = (0..self.cardinality()).map(|i| self.self_count(i)).collect::<Vec<_>>();
        let rows = self
            .shared
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(offset, &s)| {
                        let norm = totals[i].min(totals[i + offset + 1]);
                        if norm > 0.0 {
                            (1.0 - s / norm).max(0.0)
                        } else {
                            1.0
                        }
                    })
                    .collect()
            })
            .collect();
        DistanceMatrix::from_rows(rows)
    }

    /// Returns an error unless the counts have been computed.
    fn check_counted(&self) -> Result<(), HubnessError> {
        if self.is_counted() {
            Ok(())
        } else {
            Err(HubnessError::config("The shared neighbors have not been counted."))
        }
    }

    /// The number of points.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.nsf.cardinality()
    }

    /// The neighborhood size.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::{InstanceWeights, SharedNeighborFinder};
    use crate::knn::tests::six_points;

    #[test]
    fn counts() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(2)?;
        let before = nsf.clone();

        let mut snf = SharedNeighborFinder::new(&nsf, 2)?;
        assert!(snf.shared_count(0, 1).is_err());
        snf.count_shared_neighbors();

        // 0: [1, 2], 1: [0, 2], 2: [1, 0], 3: [4, 5], 4: [3, 5], 5: [4, 3]
        assert!(approx_eq!(f64, snf.shared_count(0, 1)?, 1.0, ulps = 2));
        assert!(approx_eq!(f64, snf.shared_count(0, 2)?, 1.0, ulps = 2));
        assert!(approx_eq!(f64, snf.shared_count(4, 3)?, 1.0, ulps = 2));
        assert!(approx_eq!(f64, snf.shared_count(0, 3)?, 0.0, ulps = 2));
        assert!(approx_eq!(f64, snf.shared_count(2, 2)?, 2.0, ulps = 2));
        assert_eq!(snf.rank(2, 0), Some(1));
        assert_eq!(snf.rank(2, 3), None);

        let distances = snf.secondary_distances()?;
        assert!(approx_eq!(f64, distances.get(0, 1), 0.5, ulps = 2));
        assert!(approx_eq!(f64, distances.get(5, 0), 1.0, ulps = 2));

        assert_eq!(nsf.neighbor_sets(), before.neighbor_sets());
        assert!(snf.shared_count(0, 6).is_err());
        Ok(())
    }

    #[test]
    fn parallel_and_weighted() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(3)?;

        let mut sequential = SharedNeighborFinder::new(&nsf, 3)?;
        sequential.count_shared_neighbors();
        let mut parallel = SharedNeighborFinder::new(&nsf, 3)?;
        parallel.par_count_shared_neighbors(4)?;
        assert_eq!(parallel.shared_counts(), sequential.shared_counts());

        parallel.set_weights(InstanceWeights::BadHubness)?;
        assert!(!parallel.is_counted());
        parallel.set_weights(InstanceWeights::PenalizeHubness)?;
        assert!(matches!(parallel.weights(), Some((InstanceWeights::PenalizeHubness, _))));
        parallel.par_count_shared_neighbors(2)?;

        // 0: [1, 2, 3] and 1: [0, 2, 3] share 2 and 3, which occur five times
        // each, so both weigh ln(6 / 6) = 0
        assert!(approx_eq!(f64, parallel.shared_count(0, 1)?, 0.0, ulps = 2));
        let weighted = parallel.secondary_distances()?;
        assert!(weighted.rows().iter().flatten().all(|&d| (0.0..=1.0).contains(&d)));

        parallel.clear_weights();
        assert!(parallel.weights().is_none());
        assert!(SharedNeighborFinder::new(&nsf, 4).is_err());
        Ok(())
    }
}
