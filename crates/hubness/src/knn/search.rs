//! A single exact k-NN search parameterized by where distances come from,
//! which candidates are allowed and what is being queried.

use std::collections::HashSet;

use distances::Number;

use crate::{DistanceMatrix, HubnessError, Metric, SortedNeighbors};

/// A set of indices that may not be returned as neighbors.
pub type TabuSet = HashSet<usize>;

/// The point whose neighbors are searched for.
#[derive(Clone, Copy, Debug)]
pub enum Query<'a, I> {
    /// A point of the dataset. It is never its own neighbor.
    Indexed(usize),
    /// A point outside the dataset.
    External(&'a I),
}

/// Where the distances to the candidates come from.
pub enum DistanceSource<'a, I, U> {
    /// A precomputed distance matrix. Only `Query::Indexed` can be answered.
    Matrix(&'a DistanceMatrix<U>),
    /// A metric evaluated on demand over the given items.
    Metric {
        /// The candidate items.
        items: &'a [I],
        /// The distance function.
        metric: &'a dyn Metric<I, U>,
    },
}

/// A `DistanceSource` that only ever reads from a matrix.
pub type MatrixSource<'a, U> = DistanceSource<'a, (), U>;

impl<'a, I, U: Number> DistanceSource<'a, I, U> {
    /// The number of candidate points.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        match self {
            Self::Matrix(matrix) => matrix.cardinality(),
            Self::Metric { items, .. } => items.len(),
        }
    }
}

/// Which candidates a search may consider.
#[derive(Clone, Copy, Debug, Default)]
pub enum CandidateFilter<'a> {
    /// Every point other than the query itself.
    #[default]
    All,
    /// Every point not in the tabu set. Tabu points are skipped before any
    /// distance is looked up.
    Tabu(&'a TabuSet),
}

impl CandidateFilter<'_> {
    /// Whether `index` may be a neighbor.
    #[must_use]
    pub fn allows(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Tabu(tabu) => !tabu.contains(&index),
        }
    }
}

/// An exact linear-scan k-NN search.
///
/// Candidates are visited in index order `0..n`, so ties are always broken in
/// favor of the smaller index.
///
/// # Examples
///
/// ```
/// use hubness::{knn::search::{KnnSearch, MatrixSource, Query}, DistanceMatrix};
///
/// let matrix = DistanceMatrix::from_rows(vec![vec![1, 4], vec![2]]).unwrap();
/// let search = KnnSearch::new(MatrixSource::Matrix(&matrix), 1);
/// let hits = search.search(&Query::Indexed(2)).unwrap();
/// assert_eq!(hits.indices(), &[1]);
/// ```
pub struct KnnSearch<'a, I, U> {
    /// The distances.
    source: DistanceSource<'a, I, U>,
    /// The candidates.
    filter: CandidateFilter<'a>,
    /// The number of neighbors.
    k: usize,
}

impl<'a, I, U: Number> KnnSearch<'a, I, U> {
    /// Creates a search for `k` neighbors among all candidates of `source`.
    #[must_use]
    pub const fn new(source: DistanceSource<'a, I, U>, k: usize) -> Self {
        Self {
            source,
            filter: CandidateFilter::All,
            k,
        }
    }

    /// Restricts the candidates of the search.
    #[must_use]
    pub const fn with_filter(mut self, filter: CandidateFilter<'a>) -> Self {
        self.filter = filter;
        self
    }

    /// The number of neighbors searched for.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    /// The number of candidate points, before filtering.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.source.cardinality()
    }

    /// Finds the `k` nearest allowed candidates of `query`.
    ///
    /// The result holds fewer than `k` neighbors only if fewer candidates
    /// are allowed.
    ///
    /// # Errors
    ///
    /// * If an indexed query is out of bounds.
    /// * If an external query is posed against a distance matrix.
    pub fn search(&self, query: &Query<'_, I>) -> Result<SortedNeighbors<U>, HubnessError> {
        let n = self.cardinality();
        let hits = SortedNeighbors::new(self.k);
        match (query, &self.source) {
            (&Query::Indexed(i), _) if i >= n => Err(HubnessError::config(format!(
                "Query index {i} is out of bounds for {n} points."
            ))),
            (Query::External(_), DistanceSource::Matrix(_)) => Err(HubnessError::config(
                "A distance matrix cannot answer queries for points outside the dataset.",
            )),
            (&Query::Indexed(i), DistanceSource::Matrix(matrix)) => {
                Ok(self.scan(hits, |j| j != i, |j| matrix.get(i, j)))
            }
            (&Query::Indexed(i), DistanceSource::Metric { items, metric }) => {
                Ok(self.scan(hits, |j| j != i, |j| metric.distance(&items[i], &items[j])))
            }
            (Query::External(q), DistanceSource::Metric { items, metric }) => {
                Ok(self.scan(hits, |_| true, |j| metric.distance(q, &items[j])))
            }
        }
    }

    /// Offers every allowed candidate to `hits`, in index order.
    fn scan<P, D>(&self, hits: SortedNeighbors<U>, is_candidate: P, distance: D) -> SortedNeighbors<U>
    where
        P: Fn(usize) -> bool,
        D: Fn(usize) -> U,
    {
        (0..self.cardinality())
            .filter(|&j| is_candidate(j) && self.filter.allows(j))
            .fold(hits, |mut hits, j| {
                hits.push(j, distance(j));
                hits
            })
    }
}
