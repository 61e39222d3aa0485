//! Tests for `SharedNeighborFinder`.

use float_cmp::approx_eq;
use hubness::{InstanceWeights, SharedNeighborFinder};
use test_case::test_case;

mod common;

#[test_case(4, 1 ; "k = 4 on one thread")]
#[test_case(8, 3 ; "k = 8 on three threads")]
fn counts_match_intersections(k: usize, num_threads: usize) -> Result<(), String> {
    let mut nsf = common::gen_finder(40, 5, 2, 61)?;
    nsf.calculate_neighbor_sets(8)?;

    let mut snf = SharedNeighborFinder::new(&nsf, k)?;
    snf.par_count_shared_neighbors(num_threads)?;

    let sub = nsf.sub_nsf(k)?;
    for i in 0..nsf.cardinality() {
        for j in 0..nsf.cardinality() {
            let expected = sub.kneighbors(i).iter().filter(|m| sub.kneighbors(j).contains(m)).count();
            let found = snf.shared_count(i, j)?;
            assert!(approx_eq!(f64, found, expected as f64, ulps = 2), "{i} and {j}");
        }
        for (rank, &m) in sub.kneighbors(i).iter().enumerate() {
            assert_eq!(snf.rank(i, m), Some(rank));
        }
    }

    let distances = snf.secondary_distances()?;
    for i in 0..nsf.cardinality() {
        for j in (i + 1)..nsf.cardinality() {
            let expected = (k as f64 - snf.shared_count(i, j)?) / k as f64;
            assert!(approx_eq!(f64, distances.get(i, j), expected, ulps = 4));
        }
    }
    Ok(())
}

#[test]
fn last_weights_win() -> Result<(), String> {
    let mut nsf = common::gen_finder(30, 3, 3, 5)?;
    nsf.calculate_neighbor_sets(5)?;
    let before = nsf.clone();

    let mut snf = SharedNeighborFinder::new(&nsf, 5)?;
    snf.set_weights(InstanceWeights::PenalizeHubness)?;
    snf.set_weights(InstanceWeights::HubnessInformation { theta: 0.3 })?;
    let (scheme, weights) = snf.weights().ok_or("no weights")?;
    assert_eq!(scheme, InstanceWeights::HubnessInformation { theta: 0.3 });
    let weights = weights.to_vec();
    assert!(weights.iter().all(|&w| w > 0.0 && w < 1.0));

    snf.count_shared_neighbors();
    for i in 0..nsf.cardinality() {
        for j in (i + 1)..nsf.cardinality() {
            let expected = nsf
                .kneighbors(i)
                .iter()
                .filter(|m| nsf.kneighbors(j).contains(m))
                .map(|&m| weights[m])
                .sum::<f64>();
            assert!(approx_eq!(f64, snf.shared_count(i, j)?, expected, epsilon = 1e-12));
        }
    }

    assert_eq!(nsf.neighbor_sets(), before.neighbor_sets());
    assert_eq!(nsf.stats(), before.stats());
    Ok(())
}

#[test]
fn weighted_self_counts_follow_list_order() -> Result<(), String> {
    let mut nsf = common::gen_finder(50, 4, 3, 23)?;
    nsf.calculate_neighbor_sets(7)?;

    let mut snf = SharedNeighborFinder::new(&nsf, 6)?;
    snf.set_weights(InstanceWeights::HubnessInformation { theta: 0.6 })?;
    snf.count_shared_neighbors();
    let weights = snf.weights().ok_or("no weights")?.1.to_vec();

    for i in 0..nsf.cardinality() {
        let expected = nsf.kneighbors(i).iter().take(6).map(|&m| weights[m]).sum::<f64>();
        assert_eq!(snf.shared_count(i, i)?.to_bits(), expected.to_bits(), "point {i}");
    }

    let first = snf.secondary_distances()?;
    for _ in 0..3 {
        let mut again = SharedNeighborFinder::new(&nsf, 6)?;
        again.set_weights(InstanceWeights::HubnessInformation { theta: 0.6 })?;
        again.count_shared_neighbors();
        assert_eq!(again.secondary_distances()?, first);
    }
    Ok(())
}
