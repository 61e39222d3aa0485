//! The `Euclidean` distance metric.

use distances::number::Float;

use super::Metric;

/// The `Euclidean` distance metric.
pub struct Euclidean;

impl<I: AsRef<[U]>, U: Float> Metric<I, U> for Euclidean {
    fn distance(&self, a: &I, b: &I) -> U {
        distances::vectors::euclidean::<U, U>(a.as_ref(), b.as_ref())
    }

    fn name(&self) -> &str {
        "euclidean"
    }
}
