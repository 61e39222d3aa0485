//! The `Cosine` distance metric.

use distances::number::Float;

use super::Metric;

/// The `Cosine` distance metric.
///
/// Values lie in `[0, 2]`; identical directions are at distance zero.
pub struct Cosine;

impl<I: AsRef<[U]>, U: Float> Metric<I, U> for Cosine {
    fn distance(&self, a: &I, b: &I) -> U {
        distances::vectors::cosine::<U, U>(a.as_ref(), b.as_ref())
    }

    fn name(&self) -> &str {
        "cosine"
    }
}

#[cfg(test)]
mod tests {
    use super::{Cosine, Metric};
    use crate::metric::{Euclidean, Manhattan};

    #[test]
    fn simple_distances() {
        let a = vec![0_f32, 0.];
        let b = vec![3_f32, 4.];

        let d: f32 = Euclidean.distance(&a, &b);
        assert!((d - 5.).abs() < 1e-6);

        let d: f32 = Manhattan.distance(&a, &b);
        assert!((d - 7.).abs() < 1e-6);

        let c = vec![6_f32, 8.];
        let d: f32 = Cosine.distance(&b, &c);
        assert!(d.abs() < 1e-6);
    }
}
