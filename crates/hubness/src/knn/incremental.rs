//! Growing neighbor sets: completing partial lists, enlarging the
//! neighborhood and adding points.

use std::sync::Arc;

use distances::Number;

use crate::{sorted_neighbors::Insertion, HubnessError};

use super::{
    CandidateFilter, EntropyCache, KnnSearch, MatrixSource, NeighborSetFinder, OccurrenceCounts, OccurrenceStats,
    Query, TabuSet,
};

impl<U: Number> NeighborSetFinder<U> {
    /// Recomputes every list that holds fewer than `k` neighbors, optionally
    /// excluding the points in `tabu` as candidates.
    ///
    /// Returns the number of lists that were recomputed.
    ///
    /// # Errors
    ///
    /// * If the neighbor sets have not been computed.
    /// * If there is no distance matrix.
    pub fn complete_neighbor_sets(&mut self, tabu: Option<&TabuSet>) -> Result<usize, HubnessError> {
        if self.k == 0 {
            return Err(HubnessError::config("The neighbor sets have not been computed."));
        }
        let matrix = self.require_matrix()?;
        let filter = tabu.map_or(CandidateFilter::All, CandidateFilter::Tabu);
        let search = KnnSearch::new(MatrixSource::Matrix(&matrix), self.k).with_filter(filter);

        let partial = (0..self.cardinality())
            .filter(|&i| !self.neighbors[i].is_full())
            .collect::<Vec<_>>();
        if partial.is_empty() {
            return Ok(0);
        }
        ftlog::debug!("Completing {} partial neighbor lists for k = {}.", partial.len(), self.k);

        let mut lists = self.neighbors.clone();
        for &i in &partial {
            lists[i] = search.search(&Query::Indexed(i))?;
        }
        self.install(self.k, lists, None);
        self.exact &= tabu.is_none();
        Ok(partial.len())
    }

    /// Enlarges the neighborhood to `k`.
    ///
    /// The result is identical to computing the neighbor sets for `k` from
    /// scratch. A `k` equal to the current one leaves the finder unchanged.
    ///
    /// # Errors
    ///
    /// * If the neighbor sets have not been computed.
    /// * If `k` is smaller than the current neighborhood size or not smaller
    ///   than the number of points.
    /// * If there is no distance matrix.
    pub fn extend_to_k(&mut self, k: usize) -> Result<(), HubnessError> {
        if self.k == 0 {
            return Err(HubnessError::config("The neighbor sets have not been computed."));
        }
        if k < self.k {
            return Err(HubnessError::config(format!(
                "Cannot extend neighbor sets from k = {} to k = {k}; use `sub_nsf` to shrink them.",
                self.k
            )));
        }
        crate::core::params::check_k(k, self.cardinality())?;
        self.require_matrix()?;
        if k == self.k {
            return Ok(());
        }

        let previous = self.clone();
        self.neighbors.iter_mut().for_each(|knn| knn.grow(k));
        self.k = k;
        // every list is now partial and gets recomputed
        self.exact = true;
        if let Err(e) = self.complete_neighbor_sets(None) {
            *self = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Adds a point with the given label and distances to every existing
    /// point, and returns its index.
    ///
    /// The distance matrix is replaced by an extended copy. The new point
    /// gets its own neighbor list and is offered as a candidate to every
    /// existing list; reverse-neighbor lists are patched for each insertion
    /// and eviction. The result is identical to computing the neighbor sets
    /// of the grown dataset from scratch.
    ///
    /// # Errors
    ///
    /// * If the neighbor sets have not been computed.
    /// * If there is no distance matrix.
    /// * If `distances` does not hold one non-negative distance per point.
    pub fn insert_point(&mut self, label: usize, distances: &[U]) -> Result<usize, HubnessError> {
        if self.k == 0 {
            return Err(HubnessError::config("The neighbor sets have not been computed."));
        }
        let matrix = Arc::new(self.require_matrix()?.with_point_appended(distances)?);
        let new = self.cardinality();
        let knn = KnnSearch::new(MatrixSource::Matrix(&matrix), self.k).search(&Query::Indexed(new))?;

        let mut new_reverse = Vec::new();
        for (i, (list, &d)) in self.neighbors.iter_mut().zip(distances).enumerate() {
            match list.push_and_evict(new, d) {
                Insertion::Rejected => continue,
                Insertion::Inserted => (),
                Insertion::Replaced(evicted, _) => self.reverse[evicted].retain(|&q| q != i),
            }
            new_reverse.push(i);
        }
        for &j in knn.indices() {
            self.reverse[j].push(new);
        }
        self.reverse.push(new_reverse);

        self.labels.push(label);
        self.num_classes = self.num_classes.max(label + 1);
        self.neighbors.push(knn);
        self.matrix = Some(matrix);
        self.stats = OccurrenceStats::new(OccurrenceCounts::from_neighbors(&self.neighbors, &self.labels, self.k));
        self.entropies = EntropyCache::default();
        ftlog::debug!("Inserted point {new} with label {label}.");
        Ok(new)
    }
}
