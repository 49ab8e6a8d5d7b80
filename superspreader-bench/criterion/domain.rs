use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use superspreader::ModelVariant;
use superspreader_bench::uniform_domain;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain");

    let domain = uniform_domain(2000, ModelVariant::Hub);
    group.bench_function("neighbours_within_hub_radius", |bencher| {
        bencher.iter(|| {
            let mut total = 0;
            for id in (0..domain.len()).step_by(20) {
                total += domain
                    .neighbours_within(domain.position(id), 6.0_f64.sqrt(), |_| true)
                    .len();
            }
            black_box(total)
        });
    });

    group.bench_function("place_uniform_2000", |bencher| {
        bencher.iter(|| black_box(uniform_domain(2000, ModelVariant::StrongInfectiousness)));
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
