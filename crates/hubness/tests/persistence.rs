//! Tests for saving and loading neighbor sets, distance matrices and
//! parameters.

use std::sync::Arc;

use hubness::{DistanceMatrix, NeighborParams, NeighborSetFinder};

mod common;

#[test]
fn neighbor_sets_round_trip() -> Result<(), String> {
    let mut nsf = common::gen_finder(20, 4, 2, 101)?;
    nsf.calculate_neighbor_sets(3)?;

    let dir = tempdir::TempDir::new("hubness").map_err(|e| e.to_string())?;
    let path = dir.path().join("twenty.nsf");
    nsf.save(&path)?;

    let matrix = Arc::new(nsf.matrix().ok_or("no matrix")?.clone());
    let loaded = NeighborSetFinder::load(&path, nsf.labels(), Some(matrix))?;
    assert_eq!(loaded.k(), 3);
    assert_eq!(loaded.neighbor_sets(), nsf.neighbor_sets());
    assert_eq!(loaded.reverse_neighbors(), nsf.reverse_neighbors());
    assert_eq!(loaded.stats(), nsf.stats());
    assert_eq!(loaded.reverse_entropies(3)?, nsf.reverse_entropies(3)?);
    loaded.validate()?;

    // without a matrix only the lists themselves are checked
    let bare = NeighborSetFinder::<f32>::load(&path, nsf.labels(), None)?;
    assert_eq!(bare.neighbor_sets(), nsf.neighbor_sets());
    assert!(bare.matrix().is_none());
    Ok(())
}

#[test]
fn rejected_files() -> Result<(), String> {
    let dir = tempdir::TempDir::new("hubness").map_err(|e| e.to_string())?;
    let labels = vec![0_usize, 1, 1];
    let cases = [
        ("header.nsf", "points:3\nk:1\n"),
        ("k.nsf", "size:3\nk:3\n1\n1\n0\n1\n0\n2\n"),
        ("float.nsf", "size:3\nk:1\n1\n1.5x\n0\n1\n0\n2\n"),
        ("unsorted.nsf", "size:3\nk:2\n1 2\n2 1\n0 2\n1 1\n0 1\n2 1\n"),
        ("repeated.nsf", "size:3\nk:2\n1 1\n1 1\n0 2\n1 1\n0 1\n2 1\n"),
    ];
    for (name, contents) in cases {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).map_err(|e| e.to_string())?;
        let result = NeighborSetFinder::<f32>::load(&path, &labels, None);
        assert!(result.is_err_and(|e| e.is_io()), "{name}");
    }
    Ok(())
}

#[test]
fn distance_matrix_round_trip() -> Result<(), String> {
    let data = common::gen_labeled(15, 3, 3, 7);
    let matrix = DistanceMatrix::<f32>::from_metric(data.items(), &hubness::metric::Euclidean)?;
    let dir = tempdir::TempDir::new("hubness").map_err(|e| e.to_string())?;

    let path = dir.path().join("matrix.txt");
    matrix.write_text(&path)?;
    assert_eq!(DistanceMatrix::<f32>::read_text(&path)?, matrix);

    let bytes = matrix.to_bytes()?;
    assert_eq!(DistanceMatrix::<f32>::from_bytes(&bytes)?, matrix);

    std::fs::write(&path, "3\n1,2\n").map_err(|e| e.to_string())?;
    assert!(DistanceMatrix::<f32>::read_text(&path).is_err_and(|e| e.is_io()));
    Ok(())
}

#[test]
fn parameters() -> Result<(), String> {
    let params = NeighborParams::default().with_k(3).with_num_threads(2).with_laplace(0.5);
    params.validate(20)?;
    assert_eq!(NeighborParams::from_bytes(&params.to_bytes()?)?, params);

    assert!(params.validate(3).is_err());
    assert!(params.clone().with_num_threads(0).validate(20).is_err());
    assert!(params.with_laplace(-1.0).validate(20).is_err());
    Ok(())
}
