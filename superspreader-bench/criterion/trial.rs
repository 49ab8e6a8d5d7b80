use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use superspreader::rand::rngs::SmallRng;
use superspreader::rand::SeedableRng;
use superspreader::{run_batch, ModelVariant, Parameters, Trial};
use superspreader_bench::{batch_config, POPULATIONS, SEED};

pub fn criterion_benchmark(c: &mut Criterion) {
    let parameters = Parameters::default();
    let mut group = c.benchmark_group("trial");

    for variant in [ModelVariant::StrongInfectiousness, ModelVariant::Hub] {
        for population in POPULATIONS {
            group.bench_with_input(
                BenchmarkId::new(variant.to_string(), population),
                &population,
                |bencher, &population| {
                    bencher.iter(|| {
                        let rng = SmallRng::seed_from_u64(SEED);
                        let trial =
                            Trial::new(&parameters, variant, population, 0.2, rng).unwrap();
                        black_box(trial.run(100).unwrap())
                    });
                },
            );
        }
    }
    group.finish();

    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    for threads in [1, 4] {
        let config = superspreader::BatchConfig {
            threads: Some(threads),
            ..batch_config(500, ModelVariant::Hub, 32)
        };
        group.bench_function(format!("hub_500x32_threads_{threads}"), |bencher| {
            bencher.iter(|| black_box(run_batch(&parameters, &config).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
