//! The parameters used when computing neighbor sets and hubness statistics.

use serde::{Deserialize, Serialize};

use super::HubnessError;

/// Parameters for neighbor-set computations.
///
/// These are usually stored next to persisted neighbor sets so that an
/// experiment can be re-run with the same settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborParams {
    /// The neighborhood size.
    pub k: usize,
    /// The number of worker threads for the parallel passes. `1` means the
    /// sequential code paths are used.
    pub num_threads: usize,
    /// The Laplace estimator added to every cell of a class-to-class matrix.
    pub laplace: f64,
    /// Whether each point counts as its own 0-th neighbor in class-to-class
    /// matrices.
    pub extend_by_element: bool,
}

impl Default for NeighborParams {
    fn default() -> Self {
        Self {
            k: 5,
            num_threads: 1,
            laplace: 1.0,
            extend_by_element: false,
        }
    }
}

impl NeighborParams {
    /// Sets the neighborhood size.
    #[must_use]
    pub const fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub const fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Sets the Laplace estimator.
    #[must_use]
    pub fn with_laplace(mut self, laplace: f64) -> Self {
        self.laplace = laplace;
        self
    }

    /// Sets whether points count as their own 0-th neighbor.
    #[must_use]
    pub const fn with_extend_by_element(mut self, extend: bool) -> Self {
        self.extend_by_element = extend;
        self
    }

    /// Checks the parameters against a dataset of the given cardinality.
    ///
    /// # Errors
    ///
    /// * If `k` is zero or not smaller than `cardinality`.
    /// * If `num_threads` is zero.
    /// * If `laplace` is negative or not finite.
    pub fn validate(&self, cardinality: usize) -> Result<(), HubnessError> {
        check_k(self.k, cardinality)?;
        if self.num_threads == 0 {
            return Err(HubnessError::config("The number of threads must be positive."));
        }
        if !self.laplace.is_finite() || self.laplace < 0.0 {
            return Err(HubnessError::config(format!(
                "The Laplace estimator must be a non-negative number, got {}.",
                self.laplace
            )));
        }
        Ok(())
    }

    /// Encodes the parameters with `bincode`.
    ///
    /// # Errors
    ///
    /// * If the parameters cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HubnessError> {
        bincode::serialize(self).map_err(|e| HubnessError::io(e.to_string()))
    }

    /// Decodes parameters encoded with [`NeighborParams::to_bytes`].
    ///
    /// # Errors
    ///
    /// * If the bytes cannot be decoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HubnessError> {
        bincode::deserialize(bytes).map_err(|e| HubnessError::io(e.to_string()))
    }
}

/// Checks that `0 < k < cardinality`.
pub(crate) fn check_k(k: usize, cardinality: usize) -> Result<(), HubnessError> {
    if k == 0 {
        Err(HubnessError::config("The neighborhood size k must be positive."))
    } else if k >= cardinality {
        Err(HubnessError::config(format!(
            "The neighborhood size k = {k} must be smaller than the number of points ({cardinality})."
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NeighborParams;

    #[test]
    fn validation() {
        let params = NeighborParams::default();
        assert!(params.validate(10).is_ok());
        assert!(params.validate(5).is_err_and(|e| e.is_configuration()));
        assert!(params.clone().with_k(0).validate(10).is_err());
        assert!(params.clone().with_num_threads(0).validate(10).is_err());
        assert!(params.clone().with_laplace(-1.0).validate(10).is_err());
        assert!(params.with_laplace(f64::NAN).validate(10).is_err());
    }

    #[test]
    fn bytes() -> Result<(), String> {
        let params = NeighborParams::default()
            .with_k(7)
            .with_num_threads(4)
            .with_laplace(0.5)
            .with_extend_by_element(true);
        let decoded = NeighborParams::from_bytes(&params.to_bytes()?)?;
        assert_eq!(decoded, params);
        Ok(())
    }
}
