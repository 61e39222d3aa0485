//! Class-restricted neighbor sets: the nearest points of the same class
//! (hits) and of other classes (misses) for every point.

use std::sync::Arc;

use distances::Number;
use rayon::prelude::*;

use crate::{
    knn::{CandidateFilter, KnnSearch, MatrixSource, Query, TabuSet},
    utils, DistanceMatrix, HubnessError, LabeledDataset, NeighborSetFinder, SortedNeighbors,
};

/// The hit and miss neighbor sets of a labeled dataset for one `k`.
///
/// The hits of a point are its `k` nearest neighbors among the other points
/// of its class, or all of them when the class has no more than `k` points;
/// its misses are its `k` nearest neighbors among the points of
/// all other classes. Occurrence frequencies and reverse lists are kept for
/// both.
#[derive(Clone, Debug)]
pub struct HitMissNetwork<U> {
    /// The class label of each point.
    labels: Vec<usize>,
    /// The number of classes.
    num_classes: usize,
    /// The pairwise distances.
    matrix: Option<Arc<DistanceMatrix<U>>>,
    /// The neighborhood size.
    k: usize,
    /// The hits of each point.
    hits: Vec<SortedNeighbors<U>>,
    /// The misses of each point.
    misses: Vec<SortedNeighbors<U>>,
    /// For each point, the points that have it as a hit.
    hit_reverse: Vec<Vec<usize>>,
    /// For each point, the points that have it as a miss.
    miss_reverse: Vec<Vec<usize>>,
    /// How often each point is a hit.
    hit_frequencies: Vec<usize>,
    /// How often each point is a miss.
    miss_frequencies: Vec<usize>,
}

impl<U: Number> HitMissNetwork<U> {
    /// Creates an empty network for `k` hits and misses per point.
    ///
    /// Nothing is checked until the network is generated.
    pub fn new<D: LabeledDataset + ?Sized>(data: &D, matrix: Option<Arc<DistanceMatrix<U>>>, k: usize) -> Self {
        Self {
            labels: data.labels(),
            num_classes: data.num_classes(),
            matrix,
            k,
            hits: Vec::new(),
            misses: Vec::new(),
            hit_reverse: Vec::new(),
            miss_reverse: Vec::new(),
            hit_frequencies: Vec::new(),
            miss_frequencies: Vec::new(),
        }
    }

    /// Checks that the network can be generated and returns the matrix.
    fn check_preconditions(&self) -> Result<Arc<DistanceMatrix<U>>, HubnessError> {
        let n = self.cardinality();
        if n == 0 {
            return Err(HubnessError::config("Cannot build a hit-miss network over an empty dataset."));
        }
        if self.k == 0 || self.k > n {
            return Err(HubnessError::config(format!(
                "The neighborhood size k = {} must be in 1..={n}.",
                self.k
            )));
        }
        let matrix = self
            .matrix
            .clone()
            .ok_or_else(|| HubnessError::config("No distance matrix has been provided."))?;
        if matrix.cardinality() != n {
            return Err(HubnessError::config(format!(
                "The distance matrix covers {} points but the dataset has {n}.",
                matrix.cardinality()
            )));
        }

        let sizes = self.class_sizes();
        let present = sizes.iter().filter(|&&s| s > 0).count();
        if present < 2 {
            return Err(HubnessError::config(format!(
                "A hit-miss network needs at least two classes, found {present}."
            )));
        }
        let smallest = sizes.iter().copied().filter(|&s| s > 0).min().unwrap_or(0);
        if self.k > smallest {
            return Err(HubnessError::config(format!(
                "The smallest class has {smallest} points, fewer than k = {}.",
                self.k
            )));
        }
        Ok(matrix)
    }

    /// The number of points in each class.
    fn class_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_classes];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }

    /// For each class, the points outside it (the tabu set of hit searches)
    /// and the points inside it (the tabu set of miss searches).
    fn tabu_sets(&self) -> (Vec<TabuSet>, Vec<TabuSet>) {
        let mut outside = vec![TabuSet::new(); self.num_classes];
        let mut inside = vec![TabuSet::new(); self.num_classes];
        for (i, &label) in self.labels.iter().enumerate() {
            for (c, set) in outside.iter_mut().enumerate() {
                if c != label {
                    set.insert(i);
                }
            }
            inside[label].insert(i);
        }
        (outside, inside)
    }

    /// Finds the hits and misses of one point.
    fn search_point(
        &self,
        matrix: &DistanceMatrix<U>,
        outside: &[TabuSet],
        inside: &[TabuSet],
        i: usize,
    ) -> Result<(SortedNeighbors<U>, SortedNeighbors<U>), HubnessError> {
        let label = self.labels[i];
        let hits = KnnSearch::new(MatrixSource::Matrix(matrix), self.k)
            .with_filter(CandidateFilter::Tabu(&outside[label]))
            .search(&Query::Indexed(i))?;
        let misses = KnnSearch::new(MatrixSource::Matrix(matrix), self.k)
            .with_filter(CandidateFilter::Tabu(&inside[label]))
            .search(&Query::Indexed(i))?;
        Ok((hits, misses))
    }

    /// Clears the network before it is filled again.
    fn reset(&mut self) {
        let n = self.cardinality();
        self.hits = Vec::with_capacity(n);
        self.misses = Vec::with_capacity(n);
        self.hit_reverse = vec![Vec::new(); n];
        self.miss_reverse = vec![Vec::new(); n];
        self.hit_frequencies = vec![0; n];
        self.miss_frequencies = vec![0; n];
    }

    /// Appends the hits and misses of the next point and counts their
    /// occurrences.
    fn record(&mut self, hits: SortedNeighbors<U>, misses: SortedNeighbors<U>) {
        let i = self.hits.len();
        for &j in hits.indices() {
            self.hit_frequencies[j] += 1;
            self.hit_reverse[j].push(i);
        }
        for &j in misses.indices() {
            self.miss_frequencies[j] += 1;
            self.miss_reverse[j].push(i);
        }
        self.hits.push(hits);
        self.misses.push(misses);
    }

    /// Computes the hits and misses of every point.
    ///
    /// # Errors
    ///
    /// * If the dataset is empty or there is no distance matrix.
    /// * If `k` is zero or larger than the dataset.
    /// * If there are fewer than two classes.
    /// * If some class has no more than `k` points.
    pub fn generate_network(&mut self) -> Result<(), HubnessError> {
        let matrix = self.check_preconditions()?;
        let (outside, inside) = self.tabu_sets();
        ftlog::info!("Generating a hit-miss network for k = {} over {} points.", self.k, self.cardinality());

        let mut network = self.clone();
        network.reset();
        for i in 0..self.cardinality() {
            let (hits, misses) = self.search_point(&matrix, &outside, &inside, i)?;
            network.record(hits, misses);
        }
        *self = network;
        Ok(())
    }

    /// Parallel version of [`HitMissNetwork::generate_network`] with a pool
    /// of exactly `num_threads` threads.
    ///
    /// # Errors
    ///
    /// * See [`HitMissNetwork::generate_network`].
    /// * If `num_threads` is zero.
    pub fn par_generate_network(&mut self, num_threads: usize) -> Result<(), HubnessError> {
        let matrix = self.check_preconditions()?;
        let (outside, inside) = self.tabu_sets();
        let pool = utils::thread_pool(num_threads)?;
        ftlog::info!(
            "Generating a hit-miss network for k = {} over {} points with {num_threads} threads.",
            self.k,
            self.cardinality()
        );

        let this = &*self;
        let blocks = pool.install(|| {
            utils::partitions(this.cardinality(), num_threads)
                .into_par_iter()
                .map(|range| {
                    range
                        .map(|i| this.search_point(&matrix, &outside, &inside, i))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Vec<_>>()
        });

        let mut network = self.clone();
        network.reset();
        for block in blocks {
            for (hits, misses) in block? {
                network.record(hits, misses);
            }
        }
        *self = network;
        Ok(())
    }

    /// Derives the network from generic neighbor sets computed on the same
    /// data and distances.
    ///
    /// The hits and misses of a point are the first `k` same-class and
    /// other-class entries of its neighbor list. A point whose list holds
    /// fewer than `k` of either is searched again. Returns the number of
    /// points that had to be searched.
    ///
    /// # Errors
    ///
    /// * See [`HitMissNetwork::generate_network`].
    /// * If `nsf` was computed over different labels or distances, with a
    ///   tabu set, or not computed at all.
    pub fn generate_network_from_existing_nsf(&mut self, nsf: &NeighborSetFinder<U>) -> Result<usize, HubnessError> {
        let matrix = self.check_preconditions()?;
        if nsf.labels() != self.labels.as_slice() {
            return Err(HubnessError::config("The neighbor sets were computed over different labels."));
        }
        if nsf.matrix().map_or(true, |m| !std::ptr::eq(m, matrix.as_ref()) && m != matrix.as_ref()) {
            return Err(HubnessError::config("The neighbor sets were computed over different distances."));
        }
        if nsf.k() == 0 {
            return Err(HubnessError::config("The neighbor sets have not been computed."));
        }
        if !nsf.is_exact() {
            return Err(HubnessError::config("The neighbor sets are not the exact nearest neighbors."));
        }
        let (outside, inside) = self.tabu_sets();

        let mut searched = 0;
        let mut network = self.clone();
        network.reset();
        for i in 0..self.cardinality() {
            let label = self.labels[i];
            let mut hits = SortedNeighbors::new(self.k);
            let mut misses = SortedNeighbors::new(self.k);
            for (j, d) in nsf.neighbor_sets()[i].iter() {
                if self.labels[j] == label {
                    hits.push(j, d);
                } else {
                    misses.push(j, d);
                }
            }
            if hits.is_full() && misses.is_full() {
                network.record(hits, misses);
            } else {
                searched += 1;
                let (hits, misses) = self.search_point(&matrix, &outside, &inside, i)?;
                network.record(hits, misses);
            }
        }
        ftlog::info!(
            "Derived a hit-miss network for k = {} from neighbor sets for k = {}, searching {searched} points again.",
            self.k,
            nsf.k()
        );
        *self = network;
        Ok(searched)
    }

    /// Returns an error unless the network has been generated.
    fn check_generated(&self) -> Result<(), HubnessError> {
        if self.hits.len() == self.cardinality() && !self.hits.is_empty() {
            Ok(())
        } else {
            Err(HubnessError::config("The hit-miss network has not been generated."))
        }
    }

    /// The margin of each point: the distance to its nearest miss minus the
    /// distance to its nearest hit.
    ///
    /// # Errors
    ///
    /// * If the network has not been generated.
    pub fn margins(&self) -> Result<Vec<f64>, HubnessError> {
        self.check_generated()?;
        Ok(self
            .hits
            .iter()
            .zip(&self.misses)
            .map(|(h, m)| {
                let hit = h.distances().first().map_or(0.0, |d| d.as_f64());
                let miss = m.distances().first().map_or(0.0, |d| d.as_f64());
                miss - hit
            })
            .collect())
    }

    /// How much more often each point is a hit than a miss.
    ///
    /// # Errors
    ///
    /// * If the network has not been generated.
    #[allow(clippy::cast_possible_wrap)]
    pub fn hit_miss_balance(&self) -> Result<Vec<i64>, HubnessError> {
        self.check_generated()?;
        Ok(self
            .hit_frequencies
            .iter()
            .zip(&self.miss_frequencies)
            .map(|(&h, &m)| h as i64 - m as i64)
            .collect())
    }

    /// Checks every structural invariant of the network.
    ///
    /// # Errors
    ///
    /// * A `Consistency` error describing the first violation found.
    pub fn validate(&self) -> Result<(), HubnessError> {
        self.check_generated()
            .map_err(|e| HubnessError::consistency(e.to_string()))?;
        let n = self.cardinality();
        let mut hit_frequencies = vec![0; n];
        let mut miss_frequencies = vec![0; n];
        let mut hit_reverse = vec![Vec::new(); n];
        let mut miss_reverse = vec![Vec::new(); n];
        let sizes = self.class_sizes();

        for i in 0..n {
            let label = self.labels[i];
            // a point is never its own hit
            let num_hits = self.k.min(sizes[label] - 1);
            for (name, list, same, expected, frequencies, reverse) in [
                ("hit", &self.hits[i], true, num_hits, &mut hit_frequencies, &mut hit_reverse),
                ("miss", &self.misses[i], false, self.k, &mut miss_frequencies, &mut miss_reverse),
            ] {
                if list.len() != expected {
                    return Err(HubnessError::consistency(format!(
                        "Point {i} has {} {name}es but should have {expected}.",
                        list.len()
                    )));
                }
                if list.distances().windows(2).any(|w| w[1] < w[0]) {
                    return Err(HubnessError::consistency(format!("The {name}es of point {i} are unsorted.")));
                }
                for &j in list.indices() {
                    if j == i || j >= n || (self.labels[j] == label) != same {
                        return Err(HubnessError::consistency(format!(
                            "Point {j} cannot be a {name} of point {i}."
                        )));
                    }
                    frequencies[j] += 1;
                    reverse[j].push(i);
                }
            }
        }

        if hit_frequencies != self.hit_frequencies || miss_frequencies != self.miss_frequencies {
            return Err(HubnessError::consistency("The occurrence frequencies do not match the lists."));
        }
        if hit_reverse != self.hit_reverse || miss_reverse != self.miss_reverse {
            return Err(HubnessError::consistency("The reverse lists do not match the lists."));
        }
        Ok(())
    }

    /// The number of points.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.labels.len()
    }

    /// The neighborhood size.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    /// The hits of every point.
    #[must_use]
    pub fn hit_sets(&self) -> &[SortedNeighbors<U>] {
        &self.hits
    }

    /// The misses of every point.
    #[must_use]
    pub fn miss_sets(&self) -> &[SortedNeighbors<U>] {
        &self.misses
    }

    /// For each point, the points that have it as a hit.
    #[must_use]
    pub fn hit_reverse_neighbors(&self) -> &[Vec<usize>] {
        &self.hit_reverse
    }

    /// For each point, the points that have it as a miss.
    #[must_use]
    pub fn miss_reverse_neighbors(&self) -> &[Vec<usize>] {
        &self.miss_reverse
    }

    /// How often each point is a hit.
    #[must_use]
    pub fn hit_frequencies(&self) -> &[usize] {
        &self.hit_frequencies
    }

    /// How often each point is a miss.
    #[must_use]
    pub fn miss_frequencies(&self) -> &[usize] {
        &self.miss_frequencies
    }
}
