//! Hubness-based instance weights.

use distances::Number;
use serde::{Deserialize, Serialize};

use crate::{knn::OccurrenceCounts, utils, HubnessError, NeighborSetFinder};

/// A scheme for weighting points by their behavior as neighbors.
///
/// Points that occur often, or mostly for the wrong class, carry less
/// information about their queries and are weighted down.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InstanceWeights {
    /// `ln(n / (occurrences + 1))`, so that frequent neighbors count less.
    PenalizeHubness,
    /// `exp(-(bad - mean_bad) / std_bad)`, so that points that are often
    /// neighbors of other classes count less.
    BadHubness,
    /// A blend of three factors, each squashed to `(0, 1)` by the logistic
    /// function: rarity of occurrence, purity of the reverse-neighbor labels
    /// and the good-minus-bad occurrence balance.
    ///
    /// The weight is `theta * rarity + (1 - theta) * (purity + balance) / 2`
    /// with `theta` in `[0, 1]`.
    HubnessInformation {
        /// The share of the occurrence factor.
        theta: f64,
    },
}

impl InstanceWeights {
    /// Computes the weight of every point from the first `k` neighbors in
    /// `nsf`.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or larger than the neighborhood size of `nsf`.
    /// * If `theta` is outside `[0, 1]`.
    pub fn compute<U: Number>(self, nsf: &NeighborSetFinder<U>, k: usize) -> Result<Vec<f64>, HubnessError> {
        nsf.check_stats_k(k)?;
        let counts = OccurrenceCounts::from_neighbors(nsf.neighbor_sets(), nsf.labels(), k);
        let n = nsf.cardinality().as_f64();

        let weights = match self {
            Self::PenalizeHubness => counts
                .total
                .iter()
                .map(|&occ| (n / (occ + 1).as_f64()).ln())
                .collect(),
            Self::BadHubness => {
                let standard = standardize(&counts.bad);
                standard.into_iter().map(|z| (-z).exp()).collect()
            }
            Self::HubnessInformation { theta } => {
                if !(0.0..=1.0).contains(&theta) {
                    return Err(HubnessError::config(format!(
                        "The trade-off must lie in [0, 1], got {theta}."
                    )));
                }
                let entropies = nsf.reverse_entropies(k)?;
                let rarity = standardize(&counts.total);
                let impurity = standardize(&entropies);
                let balance = standardize(&counts.good_minus_bad());
                rarity
                    .into_iter()
                    .zip(impurity)
                    .zip(balance)
                    .map(|((r, e), b)| {
                        let purity = utils::logistic(-e);
                        let balance = utils::logistic(b);
                        theta * utils::logistic(-r) + (1.0 - theta) * (purity + balance) / 2.0
                    })
                    .collect()
            }
        };
        Ok(weights)
    }
}

/// The z-scores of the values. All are zero if the values do not vary.
fn standardize<T: Number>(values: &[T]) -> Vec<f64> {
    let (mean, std) = utils::mean_std(values);
    values
        .iter()
        .map(|v| if std > 0.0 { (v.as_f64() - mean) / std } else { 0.0 })
        .collect()
}
