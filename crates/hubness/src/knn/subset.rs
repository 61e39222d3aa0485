//! Neighbor sets for smaller neighborhoods or for a subset of the points,
//! derived from an existing finder.

use std::sync::Arc;

use distances::Number;

use crate::{DistanceMatrix, HubnessError, LabeledDataset, SortedNeighbors};

use super::{reverse_lists, EntropyCache, NeighborSetFinder, OccurrenceStats};

impl<U: Number> NeighborSetFinder<U> {
    /// Restricts the finder to a smaller neighborhood.
    ///
    /// Each list is truncated to its first `k` entries and the occurrence
    /// counts are decremented by exactly the occurrences that were cut. The
    /// result is identical to computing the neighbor sets for `k` from
    /// scratch.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    pub fn sub_nsf(&self, k: usize) -> Result<Self, HubnessError> {
        self.check_stats_k(k)?;
        let mut counts = self.stats.counts().clone();
        let neighbors = self
            .neighbors
            .iter()
            .enumerate()
            .map(|(i, knn)| {
                for &j in knn.indices().iter().skip(k) {
                    counts.remove(self.labels[i], j, self.labels[j]);
                }
                knn.truncated(k)
            })
            .collect::<Vec<_>>();
        ftlog::debug!("Projected neighbor sets from k = {} to k = {k}.", self.k);

        Ok(Self {
            labels: self.labels.clone(),
            num_classes: self.num_classes,
            matrix: self.matrix.clone(),
            k,
            reverse: reverse_lists(&neighbors, k),
            neighbors,
            stats: OccurrenceStats::new(counts),
            entropies: EntropyCache::default(),
            exact: self.exact,
        })
    }

    /// Restricts the finder to a subset of its points, e.g. a set of selected
    /// prototypes, with neighborhood size `k`.
    ///
    /// Point `a` of the result is point `prototypes[a]` of this finder,
    /// `matrix` holds the distances among the prototypes and `labels` their
    /// labels. Known neighbors that are prototypes are kept. Lists left with
    /// fewer than `k` entries are completed by scanning only the prototypes
    /// that are not yet known, so ties between a known and a new neighbor go
    /// to the known one.
    ///
    /// # Errors
    ///
    /// * If the neighbor sets have not been computed.
    /// * If `k` is zero or not smaller than the number of prototypes.
    /// * If the prototypes are out of bounds or repeated.
    /// * If `matrix` or `labels` do not have one entry per prototype.
    pub fn sub_nsf_for_prototypes<D: LabeledDataset + ?Sized>(
        &self,
        k: usize,
        prototypes: &[usize],
        matrix: Arc<DistanceMatrix<U>>,
        labels: &D,
    ) -> Result<Self, HubnessError> {
        let n = self.cardinality();
        let m = prototypes.len();
        if self.k == 0 {
            return Err(HubnessError::config("The neighbor sets have not been computed."));
        }
        crate::core::params::check_k(k, m)?;
        if matrix.cardinality() != m || labels.cardinality() != m {
            return Err(HubnessError::config(format!(
                "Expected distances and labels for {m} prototypes, found {} and {}.",
                matrix.cardinality(),
                labels.cardinality()
            )));
        }

        let mut local = vec![None; n];
        for (a, &p) in prototypes.iter().enumerate() {
            if p >= n {
                return Err(HubnessError::config(format!(
                    "Prototype {p} is out of bounds for {n} points."
                )));
            }
            if local[p].replace(a).is_some() {
                return Err(HubnessError::config(format!("Prototype {p} appears more than once.")));
            }
        }

        let mut searched = 0;
        let neighbors = prototypes
            .iter()
            .enumerate()
            .map(|(a, &p)| {
                let mut knn = SortedNeighbors::new(k);
                for (j, d) in self.neighbors[p].iter() {
                    if let Some(b) = local[j] {
                        knn.push(b, d);
                    }
                }
                if !knn.is_full() {
                    searched += 1;
                    complete_by_intervals(&mut knn, a, &matrix);
                }
                knn
            })
            .collect::<Vec<_>>();
        ftlog::debug!("Projected neighbor sets onto {m} prototypes, searching {searched} of them again.");

        let mut nsf = Self::new(labels, matrix)?;
        nsf.num_classes = nsf.num_classes.max(self.num_classes);
        nsf.install(k, neighbors, None);
        nsf.exact = false;
        Ok(nsf)
    }
}

/// Offers every point of `matrix` that is neither `a` nor already in `knn`
/// to `knn`, scanning the gaps between the excluded indices in order.
fn complete_by_intervals<U: Number>(knn: &mut SortedNeighbors<U>, a: usize, matrix: &DistanceMatrix<U>) {
    let mut excluded = knn.indices().to_vec();
    excluded.push(a);
    excluded.push(matrix.cardinality());
    excluded.sort_unstable();

    let mut start = 0;
    for end in excluded {
        for b in start..end {
            knn.push(b, matrix.get(a, b));
        }
        start = end + 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{knn::tests::six_points, LabeledDataset, NeighborSetFinder};

    #[test]
    fn truncation() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(4)?;

        for k in 1..=4 {
            let sub = nsf.sub_nsf(k)?;
            let mut fresh = six_points()?;
            fresh.calculate_neighbor_sets(k)?;
            assert_eq!(sub.neighbor_sets(), fresh.neighbor_sets(), "k = {k}");
            assert_eq!(sub.stats(), fresh.stats(), "k = {k}");
            assert_eq!(sub.reverse_neighbors(), fresh.reverse_neighbors(), "k = {k}");
            sub.validate()?;
        }
        assert!(nsf.sub_nsf(5).is_err());
        assert!(nsf.sub_nsf(0).is_err());
        Ok(())
    }

    #[test]
    fn prototypes() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(2)?;

        // points 0, 2, 3 and 5, at 0, 3, 10 and 13
        let prototypes = [0, 2, 3, 5];
        let matrix = Arc::new(nsf.matrix().ok_or("no matrix")?.subset(&prototypes)?);
        let labels = prototypes.iter().map(|&p| nsf.labels()[p]).collect::<Vec<_>>();
        let sub = nsf.sub_nsf_for_prototypes(2, &prototypes, Arc::clone(&matrix), &labels)?;

        let mut fresh = NeighborSetFinder::new(&labels, matrix)?;
        fresh.calculate_neighbor_sets(2)?;
        assert_eq!(sub.neighbor_sets(), fresh.neighbor_sets());
        assert_eq!(sub.stats(), fresh.stats());
        assert_eq!(sub.num_classes(), labels.num_classes());
        sub.validate()?;

        let sub_matrix = Arc::new(nsf.matrix().ok_or("no matrix")?.subset(&[0, 1])?);
        assert!(nsf
            .sub_nsf_for_prototypes(2, &[0, 1], Arc::clone(&sub_matrix), &vec![0_usize, 0])
            .is_err());
        assert!(nsf
            .sub_nsf_for_prototypes(1, &[0, 0], sub_matrix, &vec![0_usize, 0])
            .is_err());
        Ok(())
    }
}
