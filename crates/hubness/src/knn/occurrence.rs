//! Neighbor occurrence counts and the dataset-wide statistics derived from
//! them.

use distances::Number;
use serde::{Deserialize, Serialize};

use crate::{utils, SortedNeighbors};

/// How often each point occurs in the neighbor sets of the others.
///
/// An occurrence is good if the point and the query share a label and bad
/// otherwise, so `good[j] + bad[j] == total[j]` for every `j`. Counts are
/// accumulated locally during a single pass and merged afterwards, never
/// shared across threads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceCounts {
    /// Occurrences of each point.
    pub total: Vec<usize>,
    /// Occurrences in neighbor sets of points with the same label.
    pub good: Vec<usize>,
    /// Occurrences in neighbor sets of points with a different label.
    pub bad: Vec<usize>,
}

impl OccurrenceCounts {
    /// All-zero counts for `n` points.
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            total: vec![0; n],
            good: vec![0; n],
            bad: vec![0; n],
        }
    }

    /// Counts the occurrences in the first `k` entries of each list.
    ///
    /// `neighbors[a]` is the neighbor list of the query with label
    /// `labels[a]`.
    #[must_use]
    pub fn from_neighbors<U: Number>(neighbors: &[SortedNeighbors<U>], labels: &[usize], k: usize) -> Self {
        let mut counts = Self::zeros(labels.len());
        for (knn, &label) in neighbors.iter().zip(labels) {
            for &j in knn.indices().iter().take(k) {
                counts.record(label, j, labels[j]);
            }
        }
        counts
    }

    /// The number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total.len()
    }

    /// Whether there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// Records one occurrence of `neighbor` in the set of a query with label
    /// `query_label`.
    pub fn record(&mut self, query_label: usize, neighbor: usize, neighbor_label: usize) {
        self.total[neighbor] += 1;
        if query_label == neighbor_label {
            self.good[neighbor] += 1;
        } else {
            self.bad[neighbor] += 1;
        }
    }

    /// Undoes one call to [`OccurrenceCounts::record`].
    pub fn remove(&mut self, query_label: usize, neighbor: usize, neighbor_label: usize) {
        self.total[neighbor] -= 1;
        if query_label == neighbor_label {
            self.good[neighbor] -= 1;
        } else {
            self.bad[neighbor] -= 1;
        }
    }

    /// Adds the counts of another pass over the same points.
    pub fn merge(&mut self, other: &Self) {
        for (a, b) in [
            (&mut self.total, &other.total),
            (&mut self.good, &other.good),
            (&mut self.bad, &other.bad),
        ] {
            a.iter_mut().zip(b).for_each(|(a, &b)| *a += b);
        }
    }

    /// `good[j] - bad[j]` for every point.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn good_minus_bad(&self) -> Vec<i64> {
        self.good
            .iter()
            .zip(&self.bad)
            .map(|(&g, &b)| g as i64 - b as i64)
            .collect()
    }

    /// `(good[j] - bad[j]) / total[j]` for every point, or zero for points
    /// that never occur.
    #[must_use]
    pub fn relative_good_minus_bad(&self) -> Vec<f64> {
        self.good_minus_bad()
            .into_iter()
            .zip(&self.total)
            .map(|(gmb, &t)| if t == 0 { 0.0 } else { utils::ratio(gmb, t) })
            .collect()
    }
}

/// The mean and population standard deviation of a per-point quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    /// The mean.
    pub mean: f64,
    /// The population standard deviation.
    pub std: f64,
}

impl MeanStd {
    /// Summarizes the given values.
    fn of<T: Number>(values: &[T]) -> Self {
        let (mean, std) = utils::mean_std(values);
        Self { mean, std }
    }
}

/// Occurrence counts together with every statistic derived from them.
///
/// The statistics are a function of the counts alone and are only ever
/// built from a complete set of counts, so they cannot drift apart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceStats {
    /// The counts.
    counts: OccurrenceCounts,
    /// Of the total occurrences.
    total: MeanStd,
    /// Of the good occurrences.
    good: MeanStd,
    /// Of the bad occurrences.
    bad: MeanStd,
    /// Of `good - bad`.
    good_minus_bad: MeanStd,
    /// Of `(good - bad) / total`.
    relative_good_minus_bad: MeanStd,
    /// Skewness of the total occurrences.
    skewness: f64,
    /// Excess kurtosis of the total occurrences.
    kurtosis: f64,
}

impl OccurrenceStats {
    /// Derives the statistics of the given counts.
    #[must_use]
    pub fn new(counts: OccurrenceCounts) -> Self {
        let (skewness, kurtosis) = utils::skewness_kurtosis(&counts.total);
        Self {
            total: MeanStd::of(&counts.total),
            good: MeanStd::of(&counts.good),
            bad: MeanStd::of(&counts.bad),
            good_minus_bad: MeanStd::of(&counts.good_minus_bad()),
            relative_good_minus_bad: MeanStd::of(&counts.relative_good_minus_bad()),
            skewness,
            kurtosis,
            counts,
        }
    }

    /// The underlying counts.
    #[must_use]
    pub const fn counts(&self) -> &OccurrenceCounts {
        &self.counts
    }

    /// Consumes the statistics and returns the counts.
    #[must_use]
    pub fn into_counts(self) -> OccurrenceCounts {
        self.counts
    }

    /// The occurrence frequency of each point.
    #[must_use]
    pub fn frequencies(&self) -> &[usize] {
        &self.counts.total
    }

    /// The good occurrence frequency of each point.
    #[must_use]
    pub fn good_frequencies(&self) -> &[usize] {
        &self.counts.good
    }

    /// The bad occurrence frequency of each point.
    #[must_use]
    pub fn bad_frequencies(&self) -> &[usize] {
        &self.counts.bad
    }

    /// Mean and standard deviation of the occurrence frequency.
    #[must_use]
    pub const fn total(&self) -> MeanStd {
        self.total
    }

    /// Mean and standard deviation of the good occurrence frequency.
    #[must_use]
    pub const fn good(&self) -> MeanStd {
        self.good
    }

    /// Mean and standard deviation of the bad occurrence frequency.
    #[must_use]
    pub const fn bad(&self) -> MeanStd {
        self.bad
    }

    /// Mean and standard deviation of `good - bad`.
    #[must_use]
    pub const fn good_minus_bad(&self) -> MeanStd {
        self.good_minus_bad
    }

    /// Mean and standard deviation of `(good - bad) / total`.
    #[must_use]
    pub const fn relative_good_minus_bad(&self) -> MeanStd {
        self.relative_good_minus_bad
    }

    /// The skewness of the occurrence distribution. Large positive values
    /// indicate strong hubness.
    #[must_use]
    pub const fn skewness(&self) -> f64 {
        self.skewness
    }

    /// The excess kurtosis of the occurrence distribution.
    #[must_use]
    pub const fn kurtosis(&self) -> f64 {
        self.kurtosis
    }

    /// The point that occurs most often, the first one on ties.
    #[must_use]
    pub fn major_hub(&self) -> Option<usize> {
        utils::arg_max(&self.counts.total).map(|(i, _)| i)
    }

    /// The points whose occurrence frequency exceeds the mean by more than
    /// `threshold` standard deviations.
    #[must_use]
    pub fn hubs(&self, threshold: f64) -> Vec<usize> {
        let cutoff = self.total.std.mul_add(threshold, self.total.mean);
        self.counts
            .total
            .iter()
            .enumerate()
            .filter(|(_, &t)| t.as_f64() > cutoff)
            .map(|(i, _)| i)
            .collect()
    }

    /// The points that never occur as a neighbor.
    #[must_use]
    pub fn anti_hubs(&self) -> Vec<usize> {
        self.counts
            .total
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == 0)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    fn lists() -> Vec<SortedNeighbors<u8>> {
        [[1, 2], [0, 2], [1, 0], [2, 1]]
            .into_iter()
            .map(|pair| SortedNeighbors::from_parts(pair.to_vec(), vec![1, 2], 2))
            .collect::<Option<_>>()
            .unwrap_or_default()
    }

    #[test]
    fn counting() {
        let labels = [0, 0, 1, 1];
        let counts = OccurrenceCounts::from_neighbors(&lists(), &labels, 2);
        assert_eq!(counts.total, vec![2, 3, 3, 0]);
        assert_eq!(counts.good, vec![1, 1, 1, 0]);
        assert_eq!(counts.bad, vec![1, 2, 2, 0]);

        let first = OccurrenceCounts::from_neighbors(&lists(), &labels, 1);
        assert_eq!(first.total, vec![1, 2, 1, 0]);

        let mut merged = OccurrenceCounts::zeros(4);
        merged.merge(&first);
        merged.merge(&first);
        assert_eq!(merged.total, vec![2, 4, 2, 0]);

        merged.remove(0, 1, 0);
        assert_eq!(merged.total[1], 3);
        assert_eq!(merged.good[1], 1);
    }

    #[test]
    fn statistics() {
        let labels = [0, 0, 1, 1];
        let stats = OccurrenceStats::new(OccurrenceCounts::from_neighbors(&lists(), &labels, 2));
        assert!(approx_eq!(f64, stats.total().mean, 2.0, ulps = 2));
        assert!(approx_eq!(f64, stats.good_minus_bad().mean, -0.5, ulps = 2));
        assert_eq!(stats.major_hub(), Some(1));
        assert_eq!(stats.anti_hubs(), vec![3]);
        assert_eq!(stats.hubs(0.5), vec![1, 2]);
        assert_eq!(stats.counts().relative_good_minus_bad()[3], 0.0);
    }
}
