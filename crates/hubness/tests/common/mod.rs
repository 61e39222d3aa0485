#![allow(dead_code)]

//! Utility functions for tests.

use core::cmp::Ordering;
use std::sync::Arc;

use distances::Number;
use hubness::{metric::Euclidean, DistanceMatrix, HubnessError, Labeled, NeighborSetFinder};
use rand::prelude::*;

/// Six points on a line, at 0, 1, 5, 6, 7 and 12, labeled `A A A B B B`.
///
/// For `k = 2` point 2 is a hub, point 5 is never a neighbor and point 3 is
/// equally far from points 2 and 4.
pub fn six_point_matrix() -> Result<DistanceMatrix<u32>, HubnessError> {
    DistanceMatrix::from_rows(vec![
        vec![1, 5, 6, 7, 12],
        vec![4, 5, 6, 11],
        vec![1, 2, 7],
        vec![1, 6],
        vec![5],
    ])
}

/// The labels of the six-point dataset.
pub fn six_point_labels() -> Vec<usize> {
    vec![0, 0, 0, 1, 1, 1]
}

/// A finder over the six-point dataset.
pub fn six_point_finder() -> Result<NeighborSetFinder<u32>, HubnessError> {
    NeighborSetFinder::new(&six_point_labels(), Arc::new(six_point_matrix()?))
}

/// Generates `cardinality` points in `num_classes` overlapping clusters.
///
/// Point `i` belongs to class `i % num_classes`, whose cluster is centered at
/// the class index in every dimension.
pub fn gen_labeled(cardinality: usize, dimensionality: usize, num_classes: usize, seed: u64) -> Labeled<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let labels = (0..cardinality).map(|i| i % num_classes).collect::<Vec<_>>();
    let items = labels
        .iter()
        .map(|&c| {
            (0..dimensionality)
                .map(|_| c.as_f32() + rng.gen_range(-1.0..1.0))
                .collect()
        })
        .collect();
    Labeled::with_num_classes(items, labels, num_classes)
        .unwrap_or_else(|e| unreachable!("{e}"))
        .with_name("test")
}

/// A finder over generated data, with Euclidean distances.
pub fn gen_finder(
    cardinality: usize,
    dimensionality: usize,
    num_classes: usize,
    seed: u64,
) -> Result<NeighborSetFinder<f32>, HubnessError> {
    let data = gen_labeled(cardinality, dimensionality, num_classes, seed);
    NeighborSetFinder::from_metric(&data, &Euclidean, 1)
}

/// The `k` nearest neighbors of `i` among the points accepted by `keep`, by
/// sorting all candidates. Ties go to the smaller index.
pub fn brute_force<U: Number>(
    matrix: &DistanceMatrix<U>,
    i: usize,
    k: usize,
    keep: impl Fn(usize) -> bool,
) -> Vec<usize> {
    let mut candidates = (0..matrix.cardinality())
        .filter(|&j| j != i && keep(j))
        .map(|j| (j, matrix.get(i, j)))
        .collect::<Vec<_>>();
    candidates.sort_by(|(a, x), (b, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal).then(a.cmp(b)));
    candidates.into_iter().take(k).map(|(j, _)| j).collect()
}
