//! Exact k-nearest-neighbor sets over a distance matrix and the hubness
//! statistics derived from them.

use std::sync::Arc;

use distances::Number;
use rayon::prelude::*;

use crate::{
    core::params::check_k, utils, DistanceMatrix, HubnessError, Labeled, LabeledDataset, Metric, SortedNeighbors,
};

mod class_relations;
mod entropy;
mod incremental;
mod io;
pub mod occurrence;
pub mod search;
mod subset;

pub use occurrence::{MeanStd, OccurrenceCounts, OccurrenceStats};
pub use search::{CandidateFilter, DistanceSource, KnnSearch, MatrixSource, Query, TabuSet};

use entropy::EntropyCache;

/// The k-nearest-neighbor sets of every point in a labeled dataset.
///
/// A finder owns its neighbor lists and everything derived from them: the
/// reverse-neighbor lists, the occurrence statistics and any cached
/// entropies. The distance matrix is shared and never modified; operations
/// that add points replace it with an extended copy.
///
/// Each neighbor list is sorted by distance, never contains the point
/// itself and holds at most `k` entries. Derived structures are rebuilt
/// together whenever the lists change, so they always describe the current
/// lists.
///
/// # Type Parameters
///
/// - `U`: The type of the distance values.
#[derive(Clone, Debug)]
pub struct NeighborSetFinder<U> {
    /// The class label of each point.
    labels: Vec<usize>,
    /// The number of classes.
    num_classes: usize,
    /// The pairwise distances, if known.
    matrix: Option<Arc<DistanceMatrix<U>>>,
    /// The neighborhood size. Zero until neighbor sets are computed.
    k: usize,
    /// The neighbor list of each point.
    neighbors: Vec<SortedNeighbors<U>>,
    /// For each point, the points in whose lists it appears, in index order.
    reverse: Vec<Vec<usize>>,
    /// The occurrence counts and their statistics.
    stats: OccurrenceStats,
    /// Lazily computed entropies for the current lists.
    entropies: EntropyCache,
    /// Whether every list holds the true nearest neighbors of its point.
    exact: bool,
}

impl<U: Number> NeighborSetFinder<U> {
    /// Creates a finder over a dataset with a precomputed distance matrix.
    ///
    /// # Errors
    ///
    /// * If the dataset is empty.
    /// * If the matrix and the dataset have different cardinalities.
    pub fn new<D: LabeledDataset + ?Sized>(data: &D, matrix: Arc<DistanceMatrix<U>>) -> Result<Self, HubnessError> {
        let mut nsf = Self::without_matrix(data)?;
        nsf.set_matrix(matrix)?;
        Ok(nsf)
    }

    /// Creates a finder without distances, e.g. to load neighbor sets from a
    /// file. Computations that need distances fail until a matrix is set.
    ///
    /// # Errors
    ///
    /// * If the dataset is empty.
    pub fn without_matrix<D: LabeledDataset + ?Sized>(data: &D) -> Result<Self, HubnessError> {
        let n = data.cardinality();
        if n == 0 {
            return Err(HubnessError::config("Cannot find neighbors in an empty dataset."));
        }
        Ok(Self {
            labels: data.labels(),
            num_classes: data.num_classes(),
            matrix: None,
            k: 0,
            neighbors: vec![SortedNeighbors::new(0); n],
            reverse: vec![Vec::new(); n],
            stats: OccurrenceStats::new(OccurrenceCounts::zeros(n)),
            entropies: EntropyCache::default(),
            exact: true,
        })
    }

    /// Creates a finder by evaluating `metric` on every pair of items.
    ///
    /// The distances are computed eagerly, in parallel if `num_threads` is
    /// greater than one.
    ///
    /// # Errors
    ///
    /// * See [`DistanceMatrix::from_metric`] and
    ///   [`DistanceMatrix::par_from_metric`].
    pub fn from_metric<I: Send + Sync, M: Metric<I, U>>(
        data: &Labeled<I>,
        metric: &M,
        num_threads: usize,
    ) -> Result<Self, HubnessError> {
        let matrix = if num_threads > 1 {
            DistanceMatrix::par_from_metric(data.items(), metric, num_threads)?
        } else {
            DistanceMatrix::from_metric(data.items(), metric)?
        };
        Self::new(data, Arc::new(matrix))
    }

    /// Imports neighbor lists computed elsewhere, e.g. by an approximate
    /// search or an earlier run, and derives everything else from them.
    ///
    /// The capacity of every list is set to `k`.
    ///
    /// # Errors
    ///
    /// * If `k` is out of range for the dataset.
    /// * If there is not exactly one list per point.
    /// * If any list is unsorted, longer than `k`, contains its own point,
    ///   repeats a neighbor, refers to a point out of bounds or disagrees with
    ///   the matrix.
    pub fn from_neighbor_lists<D: LabeledDataset + ?Sized>(
        data: &D,
        matrix: Option<Arc<DistanceMatrix<U>>>,
        k: usize,
        lists: Vec<SortedNeighbors<U>>,
    ) -> Result<Self, HubnessError> {
        let mut nsf = match matrix {
            Some(matrix) => Self::new(data, matrix)?,
            None => Self::without_matrix(data)?,
        };
        nsf.import(k, lists)?;
        Ok(nsf)
    }

    /// Replaces the current lists with imported ones.
    ///
    /// Nothing changes if the lists are rejected.
    pub(crate) fn import(&mut self, k: usize, lists: Vec<SortedNeighbors<U>>) -> Result<(), HubnessError> {
        let n = self.cardinality();
        check_k(k, n)?;
        if lists.len() != n {
            return Err(HubnessError::config(format!(
                "Expected {n} neighbor lists, found {}.",
                lists.len()
            )));
        }
        let lists = lists
            .into_iter()
            .enumerate()
            .map(|(i, knn)| {
                if let Some(&j) = knn.indices().iter().find(|&&j| j >= n) {
                    return Err(HubnessError::config(format!(
                        "The list of point {i} refers to point {j}, out of bounds for {n} points."
                    )));
                }
                let (indices, distances) = knn.into_parts();
                SortedNeighbors::from_parts(indices, distances, k)
                    .ok_or_else(|| HubnessError::config(format!("The list of point {i} is unsorted or longer than {k}.")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidate = self.clone();
        candidate.install(k, lists, None);
        candidate.exact = false;
        candidate
            .validate()
            .map_err(|e| HubnessError::config(format!("Rejected neighbor lists: {e}")))?;
        *self = candidate;
        Ok(())
    }

    /// Replaces the distance matrix. Existing neighbor sets are discarded
    /// because they describe the old distances.
    ///
    /// # Errors
    ///
    /// * If the matrix and the dataset have different cardinalities.
    pub fn set_matrix(&mut self, matrix: Arc<DistanceMatrix<U>>) -> Result<(), HubnessError> {
        let n = self.cardinality();
        if matrix.cardinality() != n {
            return Err(HubnessError::config(format!(
                "The distance matrix covers {} points but the dataset has {n}.",
                matrix.cardinality()
            )));
        }
        self.matrix = Some(matrix);
        if self.k > 0 {
            ftlog::debug!("Discarding neighbor sets for k = {} after a distance matrix change.", self.k);
            self.install(0, vec![SortedNeighbors::new(0); n], None);
            self.exact = true;
        }
        Ok(())
    }

    /// Computes the `k` nearest neighbors of every point.
    ///
    /// Candidates are scanned in index order, so among equally distant
    /// candidates the one with the smaller index is preferred.
    ///
    /// # Errors
    ///
    /// * If there is no distance matrix.
    /// * If `k` is zero or not smaller than the number of points.
    pub fn calculate_neighbor_sets(&mut self, k: usize) -> Result<(), HubnessError> {
        self.compute(k, CandidateFilter::All, None)
    }

    /// Parallel version of [`NeighborSetFinder::calculate_neighbor_sets`],
    /// using a pool of exactly `num_threads` threads. The result does not
    /// depend on the number of threads.
    ///
    /// # Errors
    ///
    /// * See [`NeighborSetFinder::calculate_neighbor_sets`].
    /// * If `num_threads` is zero.
    pub fn par_calculate_neighbor_sets(&mut self, k: usize, num_threads: usize) -> Result<(), HubnessError> {
        self.compute(k, CandidateFilter::All, Some(num_threads))
    }

    /// Computes the `k` nearest neighbors of every point among the points
    /// not in `tabu`. Points in `tabu` still get neighbor lists.
    ///
    /// # Errors
    ///
    /// * See [`NeighborSetFinder::calculate_neighbor_sets`].
    /// * If fewer than `k` candidates remain for some point.
    pub fn calculate_neighbor_sets_with_tabu(&mut self, k: usize, tabu: &TabuSet) -> Result<(), HubnessError> {
        self.compute(k, CandidateFilter::Tabu(tabu), None)
    }

    /// Parallel version of
    /// [`NeighborSetFinder::calculate_neighbor_sets_with_tabu`].
    ///
    /// # Errors
    ///
    /// * See [`NeighborSetFinder::calculate_neighbor_sets_with_tabu`].
    /// * If `num_threads` is zero.
    pub fn par_calculate_neighbor_sets_with_tabu(
        &mut self,
        k: usize,
        tabu: &TabuSet,
        num_threads: usize,
    ) -> Result<(), HubnessError> {
        self.compute(k, CandidateFilter::Tabu(tabu), Some(num_threads))
    }

    /// Runs the search for every point and installs the results.
    fn compute(&mut self, k: usize, filter: CandidateFilter<'_>, num_threads: Option<usize>) -> Result<(), HubnessError> {
        let matrix = self.require_matrix()?;
        let n = self.cardinality();
        check_k(k, n)?;
        if let CandidateFilter::Tabu(tabu) = filter {
            let allowed = n - tabu.iter().filter(|&&t| t < n).count();
            if allowed <= k {
                return Err(HubnessError::config(format!(
                    "Only {allowed} of {n} points are allowed as neighbors, too few for k = {k}."
                )));
            }
        }

        let search = KnnSearch::new(MatrixSource::Matrix(&matrix), k).with_filter(filter);
        let labels = &self.labels;
        let (lists, counts) = match num_threads {
            None => {
                ftlog::info!("Computing neighbor sets for k = {k} over {n} points.");
                search_range(&search, labels, 0..n)?
            }
            Some(num_threads) => {
                let pool = utils::thread_pool(num_threads)?;
                ftlog::info!("Computing neighbor sets for k = {k} over {n} points with {num_threads} threads.");
                let blocks = pool.install(|| {
                    utils::partitions(n, num_threads)
                        .into_par_iter()
                        .map(|range| search_range(&search, labels, range))
                        .collect::<Vec<_>>()
                });
                // Sequential reduction once all workers are done.
                let mut lists = Vec::with_capacity(n);
                let mut counts = OccurrenceCounts::zeros(n);
                for block in blocks {
                    let (block_lists, block_counts) = block?;
                    lists.extend(block_lists);
                    counts.merge(&block_counts);
                }
                (lists, counts)
            }
        };

        self.install(k, lists, Some(counts));
        self.exact = matches!(filter, CandidateFilter::All);
        Ok(())
    }

    /// Installs new neighbor lists and rebuilds every derived structure.
    ///
    /// `counts` must either be `None` or the occurrence counts of `lists`.
    pub(crate) fn install(&mut self, k: usize, lists: Vec<SortedNeighbors<U>>, counts: Option<OccurrenceCounts>) {
        let counts = counts.unwrap_or_else(|| OccurrenceCounts::from_neighbors(&lists, &self.labels, k));
        self.reverse = reverse_lists(&lists, k);
        self.neighbors = lists;
        self.k = k;
        self.stats = OccurrenceStats::new(counts);
        self.entropies = EntropyCache::default();
        ftlog::debug!(
            "Installed neighbor sets for k = {k}: mean occurrence {:.3}, skewness {:.3}.",
            self.stats.total().mean,
            self.stats.skewness()
        );
    }

    /// Returns a handle to the distance matrix or a configuration error.
    pub(crate) fn require_matrix(&self) -> Result<Arc<DistanceMatrix<U>>, HubnessError> {
        self.matrix
            .clone()
            .ok_or_else(|| HubnessError::config("No distance matrix has been provided."))
    }

    /// Checks that statistics can be computed for `k` from the current lists.
    pub(crate) fn check_stats_k(&self, k: usize) -> Result<(), HubnessError> {
        if self.k == 0 {
            Err(HubnessError::config("The neighbor sets have not been computed."))
        } else if k == 0 || k > self.k {
            Err(HubnessError::config(format!(
                "Statistics need 0 < k <= {}, got k = {k}.",
                self.k
            )))
        } else {
            Ok(())
        }
    }

    /// The neighborhood size, or zero if no neighbor sets were computed.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    /// The number of points.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.labels.len()
    }

    /// The number of classes.
    #[must_use]
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// The class label of each point.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The distance matrix, if one was provided.
    #[must_use]
    pub fn matrix(&self) -> Option<&DistanceMatrix<U>> {
        self.matrix.as_deref()
    }

    /// The neighbor list of every point.
    #[must_use]
    pub fn neighbor_sets(&self) -> &[SortedNeighbors<U>] {
        &self.neighbors
    }

    /// The neighbor indices of point `i`, nearest first.
    #[must_use]
    pub fn kneighbors(&self, i: usize) -> &[usize] {
        self.neighbors[i].indices()
    }

    /// The distances to the neighbors of point `i`, non-decreasing.
    #[must_use]
    pub fn kdistances(&self, i: usize) -> &[U] {
        self.neighbors[i].distances()
    }

    /// The number of neighbors currently held for point `i`.
    #[must_use]
    pub fn current_len(&self, i: usize) -> usize {
        self.neighbors[i].len()
    }

    /// For each point, the points in whose neighbor lists it appears.
    #[must_use]
    pub fn reverse_neighbors(&self) -> &[Vec<usize>] {
        &self.reverse
    }

    /// Whether the lists hold the true nearest neighbors under the current
    /// distances. Lists computed with a tabu set, imported, loaded or
    /// projected onto prototypes are not exact.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// The occurrence counts and their statistics.
    #[must_use]
    pub const fn stats(&self) -> &OccurrenceStats {
        &self.stats
    }

    /// How often each point occurs as a neighbor.
    #[must_use]
    pub fn neighbor_frequencies(&self) -> &[usize] {
        self.stats.frequencies()
    }

    /// How often each point occurs as a neighbor of a point of its class.
    #[must_use]
    pub fn good_frequencies(&self) -> &[usize] {
        self.stats.good_frequencies()
    }

    /// How often each point occurs as a neighbor of a point of another class.
    #[must_use]
    pub fn bad_frequencies(&self) -> &[usize] {
        self.stats.bad_frequencies()
    }

    /// The mean and standard deviation of the occurrence frequency.
    #[must_use]
    pub const fn occurrence_mean_std(&self) -> MeanStd {
        self.stats.total()
    }

    /// The index of the point that occurs most often.
    #[must_use]
    pub fn major_hub_index(&self) -> Option<usize> {
        if self.k == 0 {
            None
        } else {
            self.stats.major_hub()
        }
    }

    /// The item that occurs most often as a neighbor.
    #[must_use]
    pub fn major_hub_instance<'a, I>(&self, data: &'a Labeled<I>) -> Option<&'a I> {
        self.major_hub_index()
            .filter(|&i| i < data.cardinality())
            .map(|i| data.get(i))
    }

    /// Points whose occurrence frequency exceeds the mean by more than
    /// `threshold` standard deviations.
    #[must_use]
    pub fn hubs(&self, threshold: f64) -> Vec<usize> {
        self.stats.hubs(threshold)
    }

    /// Points that are in no neighbor list.
    #[must_use]
    pub fn anti_hubs(&self) -> Vec<usize> {
        self.stats.anti_hubs()
    }

    /// Counts, for every point, how often it is a mislabeling neighbor in a
    /// `k`-NN majority vote that gets the query's label wrong.
    ///
    /// Each query takes a vote among its first `k` neighbors. The class with
    /// the most votes wins, the smaller class index on ties. If the winner
    /// differs from the query's label, every neighbor with a label other
    /// than the query's is credited with one error-inducing occurrence.
    ///
    /// `labels` replaces the finder's labels for both queries and neighbors.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    /// * If `labels` does not have one label per point.
    pub fn error_inducing_hubness(&self, k: usize, labels: Option<&[usize]>) -> Result<Vec<usize>, HubnessError> {
        self.check_stats_k(k)?;
        let labels = labels.unwrap_or(&self.labels);
        if labels.len() != self.cardinality() {
            return Err(HubnessError::config(format!(
                "Expected {} labels, found {}.",
                self.cardinality(),
                labels.len()
            )));
        }
        let num_classes = labels.iter().max().map_or(0, |&c| c + 1).max(self.num_classes);

        let mut errors = vec![0; self.cardinality()];
        let mut votes = vec![0_usize; num_classes];
        for (i, knn) in self.neighbors.iter().enumerate() {
            votes.iter_mut().for_each(|v| *v = 0);
            let neighbors = &knn.indices()[..k.min(knn.len())];
            for &j in neighbors {
                votes[labels[j]] += 1;
            }

            let mut winner = 0;
            let mut max_votes = 0;
            for (c, &v) in votes.iter().enumerate() {
                if v > max_votes {
                    max_votes = v;
                    winner = c;
                }
            }

            if winner != labels[i] {
                for &j in neighbors.iter().filter(|&&j| labels[j] != labels[i]) {
                    errors[j] += 1;
                }
            }
        }
        Ok(errors)
    }

    /// Checks every structural invariant of the finder.
    ///
    /// # Errors
    ///
    /// * A `Consistency` error describing the first violation found.
    pub fn validate(&self) -> Result<(), HubnessError> {
        let n = self.cardinality();
        if self.neighbors.len() != n || self.reverse.len() != n || self.stats.counts().len() != n {
            return Err(HubnessError::consistency("The per-point structures have different lengths."));
        }

        for (i, knn) in self.neighbors.iter().enumerate() {
            if knn.len() > self.k {
                return Err(HubnessError::consistency(format!(
                    "Point {i} has {} neighbors but k = {}.",
                    knn.len(),
                    self.k
                )));
            }
            let mut seen = std::collections::HashSet::with_capacity(knn.len());
            for (j, d) in knn.iter() {
                if j == i {
                    return Err(HubnessError::consistency(format!("Point {i} is its own neighbor.")));
                }
                if j >= n {
                    return Err(HubnessError::consistency(format!(
                        "Point {i} has neighbor {j}, out of bounds for {n} points."
                    )));
                }
                if !seen.insert(j) {
                    return Err(HubnessError::consistency(format!("Point {i} lists neighbor {j} twice.")));
                }
                if d < U::default() {
                    return Err(HubnessError::consistency(format!(
                        "Negative distance {d} from point {i} to {j}."
                    )));
                }
                if let Some(matrix) = &self.matrix {
                    if matrix.get(i, j) != d {
                        return Err(HubnessError::consistency(format!(
                            "The stored distance {d} from point {i} to {j} differs from the matrix."
                        )));
                    }
                }
            }
            if knn.distances().windows(2).any(|w| w[1] < w[0]) {
                return Err(HubnessError::consistency(format!("The neighbors of point {i} are unsorted.")));
            }
        }

        let counts = self.stats.counts();
        if let Some(j) = (0..n).find(|&j| counts.good[j] + counts.bad[j] != counts.total[j]) {
            return Err(HubnessError::consistency(format!(
                "Point {j} has {} good and {} bad occurrences but {} in total.",
                counts.good[j], counts.bad[j], counts.total[j]
            )));
        }
        if *counts != OccurrenceCounts::from_neighbors(&self.neighbors, &self.labels, self.k) {
            return Err(HubnessError::consistency("The occurrence counts do not match the neighbor lists."));
        }
        if self.reverse != reverse_lists(&self.neighbors, self.k) {
            return Err(HubnessError::consistency("The reverse neighbors do not match the neighbor lists."));
        }
        if let Some(matrix) = &self.matrix {
            matrix.check_non_negative()?;
        }
        Ok(())
    }
}

/// Searches the neighbors of the points in `range` and counts their
/// occurrences.
fn search_range<I, U: Number>(
    search: &KnnSearch<'_, I, U>,
    labels: &[usize],
    range: core::ops::Range<usize>,
) -> Result<(Vec<SortedNeighbors<U>>, OccurrenceCounts), HubnessError> {
    let mut counts = OccurrenceCounts::zeros(labels.len());
    let lists = range
        .map(|i| {
            let knn = search.search(&Query::Indexed(i))?;
            for &j in knn.indices() {
                counts.record(labels[i], j, labels[j]);
            }
            Ok(knn)
        })
        .collect::<Result<Vec<_>, HubnessError>>()?;
    Ok((lists, counts))
}

/// Builds the reverse-neighbor lists from the first `k` entries of each
/// list. Each reverse list is in increasing order.
pub(crate) fn reverse_lists<U: Number>(lists: &[SortedNeighbors<U>], k: usize) -> Vec<Vec<usize>> {
    let mut reverse = vec![Vec::new(); lists.len()];
    for (i, knn) in lists.iter().enumerate() {
        for &j in knn.indices().iter().take(k) {
            reverse[j].push(i);
        }
    }
    reverse
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;

    /// Six points on a line, at 0, 1, 3, 10, 11 and 13.
    pub(crate) fn six_points() -> Result<NeighborSetFinder<u32>, HubnessError> {
        let positions = [0_u32, 1, 3, 10, 11, 13];
        let rows: Vec<Vec<u32>> = (0..positions.len())
            .map(|i| positions[(i + 1)..].iter().map(|&p| p - positions[i]).collect())
            .collect();
        let matrix = DistanceMatrix::from_rows(rows)?;
        NeighborSetFinder::new(&vec![0_usize, 0, 0, 1, 1, 1], Arc::new(matrix))
    }

    #[test]
    fn six_point_sets() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(2)?;

        let expected: [&[usize]; 6] = [&[1, 2], &[0, 2], &[1, 0], &[4, 5], &[3, 5], &[4, 3]];
        for (i, e) in expected.iter().enumerate() {
            assert_eq!(nsf.kneighbors(i), *e, "point {i}");
        }
        assert_eq!(nsf.kdistances(2), &[2, 3]);
        assert_eq!(nsf.neighbor_frequencies(), &[2, 2, 2, 2, 2, 2]);
        assert_eq!(nsf.bad_frequencies(), &[0; 6]);
        assert_eq!(nsf.reverse_neighbors()[0], vec![1, 2]);
        nsf.validate()?;
        Ok(())
    }

    #[test]
    fn requires_configuration() -> Result<(), String> {
        let mut nsf = six_points()?;
        assert!(nsf.calculate_neighbor_sets(0).is_err_and(|e| e.is_configuration()));
        assert!(nsf.calculate_neighbor_sets(6).is_err_and(|e| e.is_configuration()));
        assert!(nsf.par_calculate_neighbor_sets(2, 0).is_err());

        let mut bare = NeighborSetFinder::<u32>::without_matrix(&vec![0_usize, 1, 0])?;
        assert!(bare.calculate_neighbor_sets(1).is_err_and(|e| e.is_configuration()));
        assert!(NeighborSetFinder::<u32>::without_matrix(&Vec::<usize>::new()).is_err());
        Ok(())
    }

    #[test]
    fn tabu_sets() -> Result<(), String> {
        let mut nsf = six_points()?;
        let tabu = [1, 4].into_iter().collect::<TabuSet>();
        nsf.calculate_neighbor_sets_with_tabu(2, &tabu)?;
        assert_eq!(nsf.kneighbors(0), &[2, 3]);
        assert_eq!(nsf.kneighbors(1), &[0, 2]);
        assert_eq!(nsf.neighbor_frequencies()[1], 0);
        nsf.validate()?;

        let too_many = (0..4).collect::<TabuSet>();
        assert!(nsf.calculate_neighbor_sets_with_tabu(2, &too_many).is_err());
        Ok(())
    }

    /// Pinned behavior: vote ties go to the smaller class index.
    #[test]
    fn error_inducing_ties() -> Result<(), String> {
        let matrix = DistanceMatrix::from_rows(vec![vec![1_u8, 2, 5], vec![3, 5], vec![5]])?;
        let mut nsf = NeighborSetFinder::new(&vec![1_usize, 0, 1, 0], Arc::new(matrix))?;
        nsf.calculate_neighbor_sets(2)?;

        // point 0 sees {1: class 0, 2: class 1}, a tie won by class 0
        assert_eq!(nsf.kneighbors(0), &[1, 2]);
        let errors = nsf.error_inducing_hubness(2, None)?;
        assert_eq!(errors[1], 2);
        assert_eq!(errors[2], 1);

        // with the labels swapped, point 0 is class 0 and the same tie is a
        // correct vote
        let swapped = [0_usize, 1, 0, 1];
        let errors = nsf.error_inducing_hubness(2, Some(&swapped[..]))?;
        assert_eq!(errors[1], 0);

        assert!(nsf.error_inducing_hubness(3, None).is_err());
        assert!(nsf.error_inducing_hubness(1, Some(&[0, 1][..])).is_err());
        Ok(())
    }

    #[test]
    fn imported_lists() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(2)?;
        let copy = NeighborSetFinder::from_neighbor_lists(
            &nsf.labels().to_vec(),
            nsf.matrix.clone(),
            2,
            nsf.neighbor_sets().to_vec(),
        )?;
        assert_eq!(copy.neighbor_sets(), nsf.neighbor_sets());
        assert_eq!(copy.stats(), nsf.stats());

        let mut lists = nsf.neighbor_sets().to_vec();
        lists[0] = SortedNeighbors::from_parts(vec![0, 1], vec![0, 1], 2).ok_or("bad parts")?;
        let rejected = NeighborSetFinder::from_neighbor_lists(&nsf.labels().to_vec(), None, 2, lists);
        assert!(rejected.is_err_and(|e| e.is_configuration()));
        Ok(())
    }

    #[test]
    fn hubs_and_anti_hubs() -> Result<(), String> {
        // a star: point 0 is close to everything else
        let matrix = DistanceMatrix::from_rows(vec![vec![1_u16, 1, 1, 1], vec![5, 6, 7], vec![8, 9], vec![10]])?;
        let mut nsf = NeighborSetFinder::new(&vec![0_usize, 0, 1, 1, 1], Arc::new(matrix))?;
        nsf.calculate_neighbor_sets(1)?;
        assert_eq!(nsf.neighbor_frequencies(), &[4, 1, 0, 0, 0]);
        assert_eq!(nsf.major_hub_index(), Some(0));
        assert_eq!(nsf.hubs(1.0), vec![0]);
        assert_eq!(nsf.anti_hubs(), vec![2, 3, 4]);
        assert!(nsf.stats().skewness() > 0.0);

        let data = Labeled::new(vec!["a", "b", "c", "d", "e"], vec![0, 0, 1, 1, 1])?;
        assert_eq!(nsf.major_hub_instance(&data), Some(&"a"));
        Ok(())
    }
}
