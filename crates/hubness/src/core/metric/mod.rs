//! The `Metric` trait is used for every distance computation that is not
//! served from a precomputed `DistanceMatrix`.

use distances::Number;

mod cosine;
mod euclidean;
mod manhattan;

pub use cosine::Cosine;
pub use euclidean::Euclidean;
pub use manhattan::Manhattan;

/// A distance function over items of type `I` producing values of type `U`.
///
/// Neighbor sets are stored against the compressed upper triangle of a
/// distance matrix, so any metric used to build one must be symmetric and
/// non-negative. Implementors declare these properties and the matrix
/// builders refuse metrics that do not have them.
///
/// # Example
///
/// ```rust
/// use hubness::metric::Metric;
///
/// struct Hamming;
///
/// impl<I: AsRef<[u8]>> Metric<I, usize> for Hamming {
///     fn distance(&self, a: &I, b: &I) -> usize {
///         a.as_ref().iter().zip(b.as_ref()).filter(|(x, y)| x != y).count()
///     }
///
///     fn name(&self) -> &str {
///         "hamming"
///     }
/// }
///
/// assert_eq!(Hamming.distance(b"hello", b"world"), 4);
/// ```
pub trait Metric<I, U: Number>: Send + Sync {
    /// Call the metric on two items.
    fn distance(&self, a: &I, b: &I) -> U;

    /// The name of the metric.
    fn name(&self) -> &str;

    /// Whether the metric only produces non-negative values.
    fn has_non_negativity(&self) -> bool {
        true
    }

    /// Whether `d(a, b) = d(b, a)` for all items `a` and `b`.
    ///
    /// Only the upper triangle of a pairwise distance matrix is computed.
    fn has_symmetry(&self) -> bool {
        true
    }
}

impl<I, U: Number> Metric<I, U> for Box<dyn Metric<I, U>> {
    fn distance(&self, a: &I, b: &I) -> U {
        (**self).distance(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn has_non_negativity(&self) -> bool {
        (**self).has_non_negativity()
    }

    fn has_symmetry(&self) -> bool {
        (**self).has_symmetry()
    }
}

impl<I, U: Number, F: Fn(&I, &I) -> U + Send + Sync> Metric<I, U> for (F, &'static str) {
    fn distance(&self, a: &I, b: &I) -> U {
        (self.0)(a, b)
    }

    fn name(&self) -> &str {
        self.1
    }
}
