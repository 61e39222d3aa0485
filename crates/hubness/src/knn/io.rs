//! Plain-text persistence of neighbor sets.
//!
//! The format is
//!
//! ```text
//! size:<N>
//! k:<K>
//! <neighbor indices of point 0, space-separated>
//! <distances to those neighbors, space-separated>
//! ...
//! ```
//!
//! with two lines per point. Lines may hold fewer than `K` entries, in which
//! case the list is partial.

use std::{
    io::{BufRead, BufWriter, Write},
    path::Path,
    sync::Arc,
};

use distances::Number;

use crate::{DistanceMatrix, HubnessError, LabeledDataset, SortedNeighbors};

use super::NeighborSetFinder;

impl<U: Number> NeighborSetFinder<U> {
    /// Writes the neighbor sets to `path`.
    ///
    /// # Errors
    ///
    /// * If the neighbor sets have not been computed.
    /// * If the file cannot be created or written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), HubnessError> {
        let path = path.as_ref();
        if self.k == 0 {
            return Err(HubnessError::config("The neighbor sets have not been computed."));
        }
        let result = std::fs::File::create(path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            writeln!(writer, "size:{}", self.cardinality())?;
            writeln!(writer, "k:{}", self.k)?;
            for knn in &self.neighbors {
                writeln!(writer, "{}", join(knn.indices()))?;
                writeln!(writer, "{}", join(knn.distances()))?;
            }
            writer.flush()
        });
        result.map_err(|e| {
            ftlog::error!("Failed to save neighbor sets to {path:?}: {e}");
            HubnessError::io(format!("{path:?}: {e}"))
        })?;
        ftlog::info!("Saved neighbor sets for k = {} to {path:?}.", self.k);
        Ok(())
    }

    /// Reads neighbor sets written by [`NeighborSetFinder::save`] for the
    /// points of `data`.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or is malformed.
    /// * If its size does not match `data`.
    /// * If a list violates an invariant of the neighbor sets.
    pub fn load<P: AsRef<Path>, D: LabeledDataset + ?Sized>(
        path: P,
        data: &D,
        matrix: Option<Arc<DistanceMatrix<U>>>,
    ) -> Result<Self, HubnessError> {
        let mut nsf = match matrix {
            Some(matrix) => Self::new(data, matrix)?,
            None => Self::without_matrix(data)?,
        };
        nsf.reload(path)?;
        Ok(nsf)
    }

    /// Replaces the neighbor sets with those stored at `path`.
    ///
    /// The file is parsed and checked completely before anything changes, so
    /// the finder is left as it was if loading fails.
    ///
    /// # Errors
    ///
    /// * See [`NeighborSetFinder::load`].
    pub fn reload<P: AsRef<Path>>(&mut self, path: P) -> Result<(), HubnessError> {
        let path = path.as_ref();
        let result = parse_file::<U>(path, self.cardinality())
            .and_then(|(k, lists)| self.import(k, lists).map_err(|e| HubnessError::io(format!("{path:?}: {e}"))));
        match result {
            Ok(()) => {
                ftlog::info!("Loaded neighbor sets for k = {} from {path:?}.", self.k);
                Ok(())
            }
            Err(e) => {
                ftlog::error!("Failed to load neighbor sets from {path:?}: {e}");
                Err(e)
            }
        }
    }
}

/// Joins the values with single spaces.
fn join<T: ToString>(values: &[T]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

/// Parses a neighbor-set file for `n` points into `k` and the lists.
fn parse_file<U: Number>(path: &Path, n: usize) -> Result<(usize, Vec<SortedNeighbors<U>>), HubnessError> {
    let file = std::fs::File::open(path).map_err(|e| HubnessError::io(format!("{path:?}: {e}")))?;
    let mut lines = std::io::BufReader::new(file).lines().enumerate();
    let mut next_line = |what: &str| -> Result<(usize, String), HubnessError> {
        match lines.next() {
            Some((l, Ok(line))) => Ok((l + 1, line)),
            Some((l, Err(e))) => Err(HubnessError::io(format!("{path:?}:{}: {e}", l + 1))),
            None => Err(HubnessError::io(format!("{path:?}: the file ends before the {what}"))),
        }
    };

    let size = header(path, next_line("size line")?, "size")?;
    if size != n {
        return Err(HubnessError::io(format!(
            "{path:?}: the file describes {size} points but the dataset has {n}"
        )));
    }
    let k = header(path, next_line("k line")?, "k")?;

    let mut lists = Vec::with_capacity(n);
    for i in 0..n {
        let (l, indices) = next_line(&format!("neighbors of point {i}"))?;
        let indices = tokens::<usize>(path, l, &indices)?;
        let (l, distances) = next_line(&format!("distances of point {i}"))?;
        let distances = tokens::<U>(path, l, &distances)?;

        let len = indices.len().min(distances.len()).min(k);
        let knn = SortedNeighbors::from_parts(indices[..len].to_vec(), distances[..len].to_vec(), k)
            .ok_or_else(|| HubnessError::io(format!("{path:?}:{l}: the distances of point {i} are unsorted")))?;
        lists.push(knn);
    }
    Ok((k, lists))
}

/// Parses a `name:<value>` header line.
fn header(path: &Path, (l, line): (usize, String), name: &str) -> Result<usize, HubnessError> {
    line.trim()
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| HubnessError::io(format!("{path:?}:{l}: expected `{name}:<integer>`, found {line:?}")))
}

/// Parses the whitespace-separated tokens of a line.
fn tokens<T: std::str::FromStr>(path: &Path, l: usize, line: &str) -> Result<Vec<T>, HubnessError> {
    line.split_whitespace()
        .map(|t| {
            t.parse::<T>()
                .map_err(|_| HubnessError::io(format!("{path:?}:{l}: cannot parse {t:?}")))
        })
        .collect()
}
