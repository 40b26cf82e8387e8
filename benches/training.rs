use bracketology::pipeline::{assign_seeds, SeedCandidate};
use bracketology::training::{GradientBoosting, GradientBoostingConfig, Loss};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Resume-like matrix: a few hundred teams, a dozen rank columns
fn create_season_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 350.0);
    let y = Array1::from_iter(x.rows().into_iter().map(|row| {
        let strength = row.iter().take(3).sum::<f64>() / 3.0;
        (strength / 22.0).clamp(1.0, 16.0)
    }));
    (x, y)
}

fn bench_boosting_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("boosting_fit");
    group.sample_size(10);

    for n_rows in [350, 1400, 2800].iter() {
        let (x, y) = create_season_data(*n_rows, 12);

        group.bench_with_input(BenchmarkId::new("depth_4", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut model = GradientBoosting::new(GradientBoostingConfig {
                    loss: Loss::SquaredError,
                    n_estimators: 50,
                    max_depth: 4,
                    ..Default::default()
                });
                model.fit(black_box(x), black_box(y)).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_seed_assignment(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let names: Vec<String> = (0..68).map(|i| format!("team_{:02}", i)).collect();
    let candidates: Vec<SeedCandidate> = names
        .iter()
        .enumerate()
        .map(|(i, name)| SeedCandidate {
            team: name,
            score: rng.gen::<f64>() * 16.0 + 1.0,
            champion: i % 2 == 0,
        })
        .collect();

    c.bench_function("assign_seeds_68", |b| {
        b.iter(|| assign_seeds(black_box(&candidates)))
    });
}

criterion_group!(benches, bench_boosting_fit, bench_seed_assignment);
criterion_main!(benches);
