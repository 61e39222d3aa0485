//! A fixed-capacity list of the `k` best candidates seen so far, kept sorted
//! by insertion.

use distances::Number;
use serde::{Deserialize, Serialize};

/// A list of at most `k` `(index, distance)` pairs in non-decreasing order of
/// distance.
///
/// This is the primitive behind every neighbor search in the crate. A
/// candidate is inserted with an insertion-sort shift, so each push costs
/// `O(k)` in the worst case and `O(1)` when the candidate is rejected.
///
/// Comparisons are strict. A candidate whose distance equals that of the
/// current `k`-th entry of a full list is rejected, and a candidate whose
/// distance equals that of existing entries is placed after them. The list is
/// therefore stable with respect to the order in which candidates are pushed:
/// pushing candidates in index order yields the first `k` items of a stable
/// sort of all candidates by distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortedNeighbors<U> {
    /// The indices of the neighbors.
    indices: Vec<usize>,
    /// The distances to the neighbors, parallel to `indices`.
    distances: Vec<U>,
    /// The capacity of the list.
    k: usize,
}

impl<U: Number> SortedNeighbors<U> {
    /// Creates an empty list with capacity `k`.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            indices: Vec::with_capacity(k),
            distances: Vec::with_capacity(k),
            k,
        }
    }

    /// Creates a list from parallel vectors of indices and distances.
    ///
    /// Returns `None` if the vectors have different lengths, hold more than
    /// `k` entries or are not sorted by distance.
    #[must_use]
    pub fn from_parts(indices: Vec<usize>, distances: Vec<U>, k: usize) -> Option<Self> {
        let sorted = distances.windows(2).all(|w| !(w[1] < w[0]));
        if indices.len() == distances.len() && indices.len() <= k && sorted {
            Some(Self { indices, distances, k })
        } else {
            None
        }
    }

    /// Offers a candidate to the list.
    ///
    /// Returns whether the candidate was inserted. When the list is full, an
    /// insertion evicts the current farthest entry.
    pub fn push(&mut self, index: usize, distance: U) -> bool {
        !matches!(self.push_and_evict(index, distance), Insertion::Rejected)
    }

    /// Offers a candidate to the list and reports what happened to it.
    pub fn push_and_evict(&mut self, index: usize, distance: U) -> Insertion<U> {
        let mut evicted = None;
        if self.indices.len() == self.k {
            match self.distances.last() {
                Some(&last) if distance < last => {
                    evicted = self.indices.pop().zip(self.distances.pop());
                }
                _ => return Insertion::Rejected,
            }
        }

        let mut pos = self.indices.len();
        while pos > 0 && distance < self.distances[pos - 1] {
            pos -= 1;
        }
        self.indices.insert(pos, index);
        self.distances.insert(pos, distance);
        evicted.map_or(Insertion::Inserted, |(i, d)| Insertion::Replaced(i, d))
    }

    /// Returns the capacity of the list.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    /// Returns the number of neighbors currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns whether the list holds `k` neighbors.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.indices.len() == self.k
    }

    /// The neighbor indices, nearest first.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The neighbor distances, non-decreasing.
    #[must_use]
    pub fn distances(&self) -> &[U] {
        &self.distances
    }

    /// The distance to the farthest neighbor held, if any.
    #[must_use]
    pub fn last_distance(&self) -> Option<U> {
        self.distances.last().copied()
    }

    /// Whether `index` is among the neighbors. This is a linear scan.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Iterates over `(index, distance)` pairs, nearest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, U)> + '_ {
        self.indices.iter().copied().zip(self.distances.iter().copied())
    }

    /// Keeps only the nearest `k` neighbors and lowers the capacity to `k`.
    ///
    /// Capacities larger than the current one are ignored.
    pub fn truncate(&mut self, k: usize) {
        if k < self.k {
            self.indices.truncate(k);
            self.distances.truncate(k);
            self.k = k;
        }
    }

    /// Returns a copy restricted to the nearest `k` neighbors.
    #[must_use]
    pub fn truncated(&self, k: usize) -> Self {
        let mut other = self.clone();
        other.truncate(k);
        other
    }

    /// Raises the capacity of the list without changing its contents.
    pub fn grow(&mut self, k: usize) {
        if k > self.k {
            self.indices.reserve(k - self.k);
            self.distances.reserve(k - self.k);
            self.k = k;
        }
    }

    /// Maps the neighbor indices through `f`, keeping the distances.
    #[must_use]
    pub fn map_indices<F: Fn(usize) -> usize>(&self, f: F) -> Self {
        Self {
            indices: self.indices.iter().map(|&i| f(i)).collect(),
            distances: self.distances.clone(),
            k: self.k,
        }
    }

    /// Consumes the list and returns its indices and distances.
    #[must_use]
    pub fn into_parts(self) -> (Vec<usize>, Vec<U>) {
        (self.indices, self.distances)
    }
}

/// The outcome of offering a candidate to a [`SortedNeighbors`] list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion<U> {
    /// The candidate was not closer than the current `k`-th neighbor.
    Rejected,
    /// The candidate was added to a list that was not yet full.
    Inserted,
    /// The candidate was added and the previous farthest neighbor, with its
    /// distance, was evicted.
    Replaced(usize, U),
}
