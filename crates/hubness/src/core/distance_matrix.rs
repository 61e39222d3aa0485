//! A symmetric distance matrix stored as its compressed upper triangle.

use std::io::{BufRead, BufWriter, Write};

use distances::Number;
use rayon::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{HubnessError, Metric};

/// The pairwise distances among `n` points.
///
/// Only the strict upper triangle is stored: row `i` holds the `n - i - 1`
/// distances to the points `j > i`, so the distance between `i < j` lives at
/// `rows[i][j - i - 1]`. The diagonal is implicitly zero. All callers go
/// through [`DistanceMatrix::get`] and never see the layout.
///
/// A matrix is immutable once built. Operations that change the set of
/// points return a new matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix<U> {
    /// The compressed rows of the upper triangle.
    rows: Vec<Vec<U>>,
    /// The number of points.
    cardinality: usize,
}

impl<U: Number> DistanceMatrix<U> {
    /// Creates a matrix from the rows of its upper triangle.
    ///
    /// `rows` must hold `n - 1` rows for `n` points with row `i` of length
    /// `n - i - 1`. A trailing empty row for the last point is accepted.
    ///
    /// # Errors
    ///
    /// * If the rows do not have the triangular shape.
    /// * If any distance is negative.
    pub fn from_rows(mut rows: Vec<Vec<U>>) -> Result<Self, HubnessError> {
        if rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        let cardinality = rows.len() + 1;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cardinality - i - 1 {
                return Err(HubnessError::config(format!(
                    "Row {i} of a distance matrix over {cardinality} points must hold {} distances, found {}.",
                    cardinality - i - 1,
                    row.len()
                )));
            }
        }
        let matrix = Self { rows, cardinality };
        matrix.check_non_negative().map_err(|e| HubnessError::config(e.to_string()))?;
        Ok(matrix)
    }

    /// Creates a matrix by evaluating `metric` on every pair of items.
    ///
    /// # Errors
    ///
    /// * If `items` is empty.
    /// * If the metric is not symmetric or not non-negative.
    pub fn from_metric<I, M: Metric<I, U>>(items: &[I], metric: &M) -> Result<Self, HubnessError> {
        Self::check_metric(items, metric)?;
        let n = items.len();
        ftlog::debug!("Computing {} pairwise {} distances.", n * (n - 1) / 2, metric.name());
        let rows = (0..(n - 1))
            .map(|i| {
                let a = &items[i];
                items[(i + 1)..].iter().map(|b| metric.distance(a, b)).collect()
            })
            .collect();
        Ok(Self { rows, cardinality: n })
    }

    /// Parallel version of [`DistanceMatrix::from_metric`].
    ///
    /// The rows are split into contiguous ranges, one per worker in a pool of
    /// exactly `num_threads` threads.
    ///
    /// # Errors
    ///
    /// * See [`DistanceMatrix::from_metric`].
    /// * If `num_threads` is zero or the thread pool cannot be built.
    pub fn par_from_metric<I: Send + Sync, M: Metric<I, U>>(
        items: &[I],
        metric: &M,
        num_threads: usize,
    ) -> Result<Self, HubnessError> {
        Self::check_metric(items, metric)?;
        let n = items.len();
        let pool = crate::utils::thread_pool(num_threads)?;
        ftlog::debug!(
            "Computing {} pairwise {} distances with {num_threads} threads.",
            n * (n - 1) / 2,
            metric.name()
        );
        let partitions = crate::utils::partitions(n - 1, num_threads);
        let blocks = pool.install(|| {
            partitions
                .into_par_iter()
                .map(|range| {
                    range
                        .map(|i| {
                            let a = &items[i];
                            items[(i + 1)..].iter().map(|b| metric.distance(a, b)).collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        });
        let rows = blocks.into_iter().flatten().collect();
        Ok(Self { rows, cardinality: n })
    }

    /// Checks the preconditions for building a matrix from a metric.
    fn check_metric<I, M: Metric<I, U>>(items: &[I], metric: &M) -> Result<(), HubnessError> {
        if items.is_empty() {
            Err(HubnessError::config("Cannot compute distances over an empty dataset."))
        } else if !metric.has_symmetry() {
            Err(HubnessError::config(format!(
                "The {} metric is not symmetric and cannot fill a triangular distance matrix.",
                metric.name()
            )))
        } else if !metric.has_non_negativity() {
            Err(HubnessError::config(format!(
                "The {} metric may produce negative distances.",
                metric.name()
            )))
        } else {
            Ok(())
        }
    }

    /// Returns the number of points.
    #[must_use]
    pub const fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Returns the distance between two points.
    ///
    /// # Panics
    ///
    /// * If either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> U {
        match i.cmp(&j) {
            core::cmp::Ordering::Less => self.rows[i][j - i - 1],
            core::cmp::Ordering::Greater => self.rows[j][i - j - 1],
            core::cmp::Ordering::Equal => U::default(),
        }
    }

    /// Returns the stored upper-triangle row of point `i`, i.e. the distances
    /// to the points `i + 1..n`.
    #[must_use]
    pub fn upper_row(&self, i: usize) -> &[U] {
        self.rows.get(i).map_or(&[][..], Vec::as_slice)
    }

    /// Returns the distances from point `i` to every point, including the
    /// zero distance to itself.
    #[must_use]
    pub fn full_row(&self, i: usize) -> Vec<U> {
        (0..self.cardinality).map(|j| self.get(i, j)).collect()
    }

    /// Returns the stored rows of the upper triangle.
    #[must_use]
    pub fn rows(&self) -> &[Vec<U>] {
        &self.rows
    }

    /// Returns the matrix restricted to the given points, in the given order.
    ///
    /// Point `a` of the new matrix is point `indices[a]` of this one.
    ///
    /// # Errors
    ///
    /// * If `indices` is empty, holds duplicates or is out of bounds.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, HubnessError> {
        if indices.is_empty() {
            return Err(HubnessError::config("Cannot restrict a distance matrix to zero points."));
        }
        if let Some(&i) = indices.iter().find(|&&i| i >= self.cardinality) {
            return Err(HubnessError::config(format!(
                "Index {i} is out of bounds for {} points.",
                self.cardinality
            )));
        }
        let mut seen = vec![false; self.cardinality];
        for &i in indices {
            if seen[i] {
                return Err(HubnessError::config(format!("Index {i} appears more than once.")));
            }
            seen[i] = true;
        }
        let rows = (0..(indices.len() - 1))
            .map(|a| {
                indices[(a + 1)..]
                    .iter()
                    .map(|&j| self.get(indices[a], j))
                    .collect()
            })
            .collect();
        Ok(Self {
            rows,
            cardinality: indices.len(),
        })
    }

    /// Returns a new matrix with one more point appended at index `n`.
    ///
    /// `distances[i]` is the distance from the new point to point `i`.
    ///
    /// # Errors
    ///
    /// * If `distances` does not hold exactly `n` values.
    /// * If any of the distances is negative.
    pub fn with_point_appended(&self, distances: &[U]) -> Result<Self, HubnessError> {
        if distances.len() != self.cardinality {
            return Err(HubnessError::config(format!(
                "Expected {} distances to the existing points, found {}.",
                self.cardinality,
                distances.len()
            )));
        }
        if distances.iter().any(|&d| d < U::default()) {
            return Err(HubnessError::config("Distances to a new point must be non-negative."));
        }
        let mut rows = self.rows.clone();
        rows.push(Vec::new());
        for (row, &d) in rows.iter_mut().zip(distances) {
            row.push(d);
        }
        Ok(Self {
            rows,
            cardinality: self.cardinality + 1,
        })
    }

    /// Checks that no stored distance is negative.
    ///
    /// # Errors
    ///
    /// * A `Consistency` error naming the first negative entry.
    pub fn check_non_negative(&self) -> Result<(), HubnessError> {
        for (i, row) in self.rows.iter().enumerate() {
            if let Some(c) = row.iter().position(|&d| d < U::default()) {
                return Err(HubnessError::consistency(format!(
                    "Negative distance {} between points {i} and {}.",
                    row[c],
                    i + c + 1
                )));
            }
        }
        Ok(())
    }

    /// Writes the matrix in the plain-text format: the number of points on
    /// the first line, then one comma-separated line per stored row.
    ///
    /// # Errors
    ///
    /// * If the file cannot be created or written.
    pub fn write_text<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), HubnessError> {
        let path = path.as_ref();
        let result = std::fs::File::create(path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{}", self.cardinality)?;
            for row in &self.rows {
                let line = row.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
                writeln!(writer, "{line}")?;
            }
            writer.flush()
        });
        result.map_err(|e| {
            ftlog::error!("Failed to write distance matrix to {path:?}: {e}");
            HubnessError::io(format!("{path:?}: {e}"))
        })
    }

    /// Reads a matrix written by [`DistanceMatrix::write_text`].
    ///
    /// # Errors
    ///
    /// * If the file cannot be read.
    /// * If the size line or any distance cannot be parsed.
    /// * If a row has the wrong number of distances or the file is truncated.
    pub fn read_text<P: AsRef<std::path::Path>>(path: P) -> Result<Self, HubnessError> {
        let path = path.as_ref();
        Self::parse_text(path).map_err(|e| {
            ftlog::error!("Failed to read distance matrix from {path:?}: {e}");
            e
        })
    }

    /// Parses the plain-text format.
    fn parse_text(path: &std::path::Path) -> Result<Self, HubnessError> {
        let file = std::fs::File::open(path).map_err(|e| HubnessError::io(format!("{path:?}: {e}")))?;
        let mut lines = std::io::BufReader::new(file).lines().enumerate();

        let cardinality = match lines.next() {
            Some((_, line)) => {
                let line = line.map_err(|e| HubnessError::io(format!("{path:?}: {e}")))?;
                line.trim()
                    .parse::<usize>()
                    .map_err(|e| HubnessError::io(format!("{path:?}:1: bad size {line:?}: {e}")))?
            }
            None => return Err(HubnessError::io(format!("{path:?}: the file is empty"))),
        };
        if cardinality == 0 {
            return Err(HubnessError::io(format!("{path:?}:1: a distance matrix needs at least one point")));
        }

        let mut rows = Vec::with_capacity(cardinality - 1);
        for i in 0..(cardinality - 1) {
            let (l, line) = lines
                .next()
                .ok_or_else(|| HubnessError::io(format!("{path:?}: truncated after {i} of {} rows", cardinality - 1)))?;
            let line = line.map_err(|e| HubnessError::io(format!("{path:?}: {e}")))?;
            let row = line
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| {
                    t.parse::<U>()
                        .map_err(|_| HubnessError::io(format!("{path:?}:{}: bad distance {t:?}", l + 1)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if row.len() != cardinality - i - 1 {
                return Err(HubnessError::io(format!(
                    "{path:?}:{}: expected {} distances, found {}",
                    l + 1,
                    cardinality - i - 1,
                    row.len()
                )));
            }
            rows.push(row);
        }

        let matrix = Self { rows, cardinality };
        matrix.check_non_negative().map_err(|e| HubnessError::io(e.to_string()))?;
        Ok(matrix)
    }
}

impl<U: Number + Serialize + DeserializeOwned> DistanceMatrix<U> {
    /// Encodes the matrix with `bincode`.
    ///
    /// # Errors
    ///
    /// * If the matrix cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HubnessError> {
        bincode::serialize(self).map_err(|e| HubnessError::io(e.to_string()))
    }

    /// Decodes a matrix encoded with [`DistanceMatrix::to_bytes`].
    ///
    /// # Errors
    ///
    /// * If the bytes cannot be decoded or do not describe a valid matrix.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HubnessError> {
        let matrix: Self = bincode::deserialize(bytes).map_err(|e| HubnessError::io(e.to_string()))?;
        Self::from_rows(matrix.rows).map_err(|e| HubnessError::io(e.to_string()))
    }
}
