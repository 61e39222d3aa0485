//! Class-conditional neighbor occurrence counts and probabilities.
//!
//! Every function here takes the neighborhood size explicitly and reads only
//! the first `k` entries of each list, so statistics for any `k` up to the
//! current one can be computed without touching the finder.

use distances::Number;

use crate::{utils, HubnessError};

use super::NeighborSetFinder;

impl<U: Number> NeighborSetFinder<U> {
    /// For every point `j` and class `c`, how often `j` is among the first
    /// `k` neighbors of a point of class `c`.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    pub fn class_occurrences(&self, k: usize) -> Result<Vec<Vec<usize>>, HubnessError> {
        self.check_stats_k(k)?;
        let mut occurrences = vec![vec![0; self.num_classes]; self.cardinality()];
        for (i, knn) in self.neighbors.iter().enumerate() {
            for &j in knn.indices().iter().take(k) {
                occurrences[j][self.labels[i]] += 1;
            }
        }
        Ok(occurrences)
    }

    /// The Laplace-smoothed class profile of each point's occurrences:
    /// `(occurrences[j][c] + laplace) / (total[j] + num_classes * laplace)`.
    ///
    /// A point that never occurs and has no smoothing gets a uniform profile.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    /// * If `laplace` is negative or not finite.
    pub fn class_occurrence_profiles(&self, k: usize, laplace: f64) -> Result<Vec<Vec<f64>>, HubnessError> {
        check_laplace(laplace)?;
        let num_classes = self.num_classes.as_f64();
        Ok(self
            .class_occurrences(k)?
            .into_iter()
            .map(|counts| {
                let total = counts.iter().sum::<usize>().as_f64() + num_classes * laplace;
                if total > 0.0 {
                    counts.into_iter().map(|c| (c.as_f64() + laplace) / total).collect()
                } else {
                    vec![1.0 / num_classes; counts.len()]
                }
            })
            .collect())
    }

    /// How often a point of class `c1` is among the first `k` neighbors of a
    /// point of class `c2`, as `counts[c1][c2]`.
    ///
    /// If `extend_by_element` is set, every point also counts as its own
    /// 0-th neighbor.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    pub fn class_to_class_counts(&self, k: usize, extend_by_element: bool) -> Result<Vec<Vec<f64>>, HubnessError> {
        self.check_stats_k(k)?;
        let mut counts = vec![vec![0.0; self.num_classes]; self.num_classes];
        for (i, knn) in self.neighbors.iter().enumerate() {
            let c2 = self.labels[i];
            if extend_by_element {
                counts[c2][c2] += 1.0;
            }
            for &j in knn.indices().iter().take(k) {
                counts[self.labels[j]][c2] += 1.0;
            }
        }
        Ok(counts)
    }

    /// The probability that a neighbor of a point of class `c2` belongs to
    /// class `c1`, as `p[c1][c2]`.
    ///
    /// Each count is smoothed with `laplace` and divided by the number of
    /// neighbor slots of class `c2`, i.e. `k` (or `k + 1` if extended) times
    /// the size of `c2`, plus `num_classes * laplace`. The columns sum to one
    /// when every list is full.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    /// * If `laplace` is negative or not finite.
    pub fn class_to_class_bayesian(
        &self,
        k: usize,
        laplace: f64,
        extend_by_element: bool,
    ) -> Result<Vec<Vec<f64>>, HubnessError> {
        check_laplace(laplace)?;
        let counts = self.class_to_class_counts(k, extend_by_element)?;
        let slots = if extend_by_element { k + 1 } else { k };
        let smoothing = self.num_classes.as_f64() * laplace;
        let normalizers = self
            .class_sizes()
            .into_iter()
            .map(|size| (slots * size).as_f64() + smoothing)
            .collect::<Vec<_>>();

        Ok(counts
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&normalizers)
                    .map(|(count, &norm)| if norm > 0.0 { (count + laplace) / norm } else { 0.0 })
                    .collect()
            })
            .collect())
    }

    /// The probability that a point of class `c1`, appearing as a neighbor,
    /// does so for a point of class `c2`, as `p[c1][c2]`.
    ///
    /// Each count is smoothed with `laplace` and divided by the total number
    /// of occurrences of class `c1` plus `num_classes * laplace`, so each row
    /// sums to one.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the current neighborhood size.
    /// * If `laplace` is negative or not finite.
    pub fn class_to_class_fuzzy(
        &self,
        k: usize,
        laplace: f64,
        extend_by_element: bool,
    ) -> Result<Vec<Vec<f64>>, HubnessError> {
        check_laplace(laplace)?;
        let smoothing = self.num_classes.as_f64() * laplace;
        Ok(self
            .class_to_class_counts(k, extend_by_element)?
            .into_iter()
            .map(|row| {
                let norm = row.iter().sum::<f64>() + smoothing;
                row.into_iter()
                    .map(|count| if norm > 0.0 { (count + laplace) / norm } else { 0.0 })
                    .collect()
            })
            .collect())
    }

    /// The number of points in each class.
    #[must_use]
    pub fn class_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_classes];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }

    /// The relative size of each class.
    #[must_use]
    pub fn class_priors(&self) -> Vec<f64> {
        let n = self.cardinality();
        self.class_sizes().into_iter().map(|s| utils::ratio(s, n)).collect()
    }
}

/// Checks that a Laplace estimator is a non-negative number.
fn check_laplace(laplace: f64) -> Result<(), HubnessError> {
    if laplace.is_finite() && laplace >= 0.0 {
        Ok(())
    } else {
        Err(HubnessError::config(format!(
            "The Laplace estimator must be a non-negative number, got {laplace}."
        )))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use crate::knn::tests::six_points;

    #[test]
    fn counts() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(3)?;

        // every point has two same-class neighbors and one from the other
        // class, which is always point 2 or point 3
        let counts = nsf.class_to_class_counts(3, false)?;
        assert_eq!(counts, vec![vec![6.0, 3.0], vec![3.0, 6.0]]);

        let extended = nsf.class_to_class_counts(3, true)?;
        assert_eq!(extended, vec![vec![9.0, 3.0], vec![3.0, 9.0]]);

        let occurrences = nsf.class_occurrences(3)?;
        assert_eq!(occurrences[3], vec![3, 2]);
        assert_eq!(occurrences[0], vec![2, 0]);
        assert_eq!(nsf.class_sizes(), vec![3, 3]);
        Ok(())
    }

    #[test]
    fn normalizers() -> Result<(), String> {
        let mut nsf = six_points()?;
        nsf.calculate_neighbor_sets(3)?;

        let bayesian = nsf.class_to_class_bayesian(3, 1.0, false)?;
        // (6 + 1) / (3 * 3 + 2)
        assert!(approx_eq!(f64, bayesian[0][0], 7.0 / 11.0, ulps = 2));
        let column = bayesian[0][1] + bayesian[1][1];
        assert!(approx_eq!(f64, column, 1.0, ulps = 2));

        let extended = nsf.class_to_class_bayesian(3, 0.0, true)?;
        assert!(approx_eq!(f64, extended[0][0], 0.75, ulps = 2));

        let fuzzy = nsf.class_to_class_fuzzy(3, 1.0, false)?;
        // (3 + 1) / (9 + 2)
        assert!(approx_eq!(f64, fuzzy[0][1], 4.0 / 11.0, ulps = 2));
        let row = fuzzy[1].iter().sum::<f64>();
        assert!(approx_eq!(f64, row, 1.0, ulps = 2));

        // statistics for a smaller k leave the finder untouched
        let small = nsf.class_to_class_fuzzy(1, 0.0, false)?;
        assert!(approx_eq!(f64, small[0][0], 1.0, ulps = 2));
        assert_eq!(nsf.k(), 3);

        assert!(nsf.class_to_class_bayesian(3, -1.0, false).is_err());
        assert!(nsf.class_to_class_fuzzy(4, 1.0, false).is_err());

        let profiles = nsf.class_occurrence_profiles(3, 1.0)?;
        // point 3 occurs three times for class 0 and twice for class 1
        assert!(approx_eq!(f64, profiles[3][1], 3.0 / 7.0, ulps = 2));
        Ok(())
    }
}
