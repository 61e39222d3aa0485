//! Entropies of the label distributions in neighbor and reverse-neighbor
//! sets.

use distances::Number;

use crate::{utils, HubnessError};

use super::{reverse_lists, NeighborSetFinder};

/// Entropies computed for the current neighbor lists, keyed by the `k` they
/// were computed for.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntropyCache {
    /// Of the direct neighbor sets.
    direct: Option<(usize, Vec<f64>)>,
    /// Of the reverse-neighbor sets.
    reverse: Option<(usize, Vec<f64>)>,
}

impl<U: Number> NeighborSetFinder<U> {
    /// The entropy, in bits, of the labels among the first `k` neighbors of
    /// each point.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    pub fn direct_entropies(&self, k: usize) -> Result<Vec<f64>, HubnessError> {
        self.check_stats_k(k)?;
        let mut counts = vec![0; self.num_classes];
        Ok(self
            .neighbors
            .iter()
            .map(|knn| self.label_entropy(knn.indices().iter().take(k), &mut counts))
            .collect())
    }

    /// The entropy, in bits, of the labels of the points that have each point
    /// among their first `k` neighbors.
    ///
    /// Points with at most one reverse neighbor have zero entropy.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    pub fn reverse_entropies(&self, k: usize) -> Result<Vec<f64>, HubnessError> {
        self.check_stats_k(k)?;
        let reverse = if k == self.k {
            None
        } else {
            Some(reverse_lists(&self.neighbors, k))
        };
        let reverse = reverse.as_deref().unwrap_or(&self.reverse);

        let mut counts = vec![0; self.num_classes];
        Ok(reverse
            .iter()
            .map(|r| {
                if r.len() <= 1 {
                    0.0
                } else {
                    self.label_entropy(r.iter(), &mut counts)
                }
            })
            .collect())
    }

    /// Cached version of [`NeighborSetFinder::direct_entropies`].
    ///
    /// # Errors
    ///
    /// * See [`NeighborSetFinder::direct_entropies`].
    pub fn cached_direct_entropies(&mut self, k: usize) -> Result<&[f64], HubnessError> {
        if !matches!(&self.entropies.direct, Some((ck, _)) if *ck == k) {
            let entropies = self.direct_entropies(k)?;
            self.entropies.direct = Some((k, entropies));
        }
        Ok(self.entropies.direct.as_ref().map_or(&[][..], |(_, e)| e.as_slice()))
    }

    /// Cached version of [`NeighborSetFinder::reverse_entropies`].
    ///
    /// # Errors
    ///
    /// * See [`NeighborSetFinder::reverse_entropies`].
    pub fn cached_reverse_entropies(&mut self, k: usize) -> Result<&[f64], HubnessError> {
        if !matches!(&self.entropies.reverse, Some((ck, _)) if *ck == k) {
            let entropies = self.reverse_entropies(k)?;
            self.entropies.reverse = Some((k, entropies));
        }
        Ok(self.entropies.reverse.as_ref().map_or(&[][..], |(_, e)| e.as_slice()))
    }

    /// Tallies the labels of the given points into `counts` and returns the
    /// entropy of the tally.
    fn label_entropy<'a, It: Iterator<Item = &'a usize>>(&self, points: It, counts: &mut [usize]) -> f64 {
        counts.iter_mut().for_each(|c| *c = 0);
        for &j in points {
            counts[self.labels[j]] += 1;
        }
        utils::entropy_of_counts(counts)
    }
}
