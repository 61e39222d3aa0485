use std::sync::Arc;

use criterion::*;
use rand::prelude::*;

use hubness::{metric::Euclidean, DistanceMatrix, HitMissNetwork, NeighborSetFinder, SharedNeighborFinder};

fn gen_data(cardinality: usize, dimensionality: usize, num_classes: usize, seed: u64) -> (Vec<Vec<f32>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let labels = (0..cardinality).map(|i| i % num_classes).collect::<Vec<_>>();
    let data = labels
        .iter()
        .map(|&c| {
            (0..dimensionality)
                .map(|_| c as f32 + rng.gen_range(-1.0..1.0))
                .collect()
        })
        .collect();
    (data, labels)
}

fn knn_sets(c: &mut Criterion) {
    let seed = 42;
    let (cardinality, dimensionality, num_classes) = (2_000, 10, 4);
    let (data, labels) = gen_data(cardinality, dimensionality, num_classes, seed);
    let matrix = Arc::new(DistanceMatrix::<f32>::par_from_metric(&data, &Euclidean, 4).unwrap());

    let mut group = c.benchmark_group("knn-sets");
    group
        .sample_size(10)
        .sampling_mode(SamplingMode::Flat)
        .throughput(Throughput::Elements(cardinality as u64))
        .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for k in (0..=5).map(|v| 2usize.pow(v)) {
        for num_threads in [1, 4] {
            let id = BenchmarkId::new(format!("nsf-{num_threads}"), k);
            group.bench_with_input(id, &k, |b, &k| {
                b.iter_with_large_drop(|| {
                    let mut nsf = NeighborSetFinder::new(&labels, Arc::clone(&matrix)).unwrap();
                    nsf.par_calculate_neighbor_sets(k, num_threads).unwrap();
                    nsf
                });
            });
        }

        let id = BenchmarkId::new("hit-miss", k);
        group.bench_with_input(id, &k, |b, &k| {
            b.iter_with_large_drop(|| {
                let mut network = HitMissNetwork::new(&labels, Some(Arc::clone(&matrix)), k);
                network.par_generate_network(4).unwrap();
                network
            });
        });

        let mut nsf = NeighborSetFinder::new(&labels, Arc::clone(&matrix)).unwrap();
        nsf.par_calculate_neighbor_sets(k, 4).unwrap();
        let id = BenchmarkId::new("shared", k);
        group.bench_with_input(id, &k, |b, &k| {
            b.iter(|| {
                let mut snf = SharedNeighborFinder::new(&nsf, k).unwrap();
                snf.par_count_shared_neighbors(4).unwrap();
                snf.is_counted()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, knn_sets);
criterion_main!(benches);
