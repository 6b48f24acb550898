use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ht_nn::{HashFeatureField, HashGridConfig, Tensor};

#[track_caller]
fn unwrap_ok<T, E: core::fmt::Debug>(context: &str, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("{context}: {error:?}"),
    }
}

fn bench_hash_grid_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_grid_encode");

    let field = unwrap_ok(
        "field construction failed",
        HashFeatureField::new("bench", HashGridConfig::default(), Some(7)),
    );
    for batch in [256usize, 4096] {
        let coords = unwrap_ok(
            "coordinate batch failed",
            Tensor::random_uniform(batch, 3, 0.0, 1.0, Some(batch as u64)),
        );
        group.bench_function(format!("batch_{batch}"), |b| {
            b.iter_batched(
                || coords.clone(),
                |coords| {
                    black_box(unwrap_ok("encode failed", field.encode(&coords)));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hash_grid_encode);
criterion_main!(benches);
