use criterion::{criterion_group, criterion_main, Criterion};
use pagefit::config::OptimizerConfig;
use pagefit::core_types::{ContentProfile, LayoutParameters};
use pagefit::optimizer::Optimizer;
use std::hint::black_box;

fn page_oracle(lines: f32, page_height: f32) -> impl FnMut(&LayoutParameters) -> bool {
    move |c: &LayoutParameters| {
        let rows = (lines / c.columns as f32).ceil();
        rows * c.font_size_px * (1.0 + c.line_spacing) > page_height
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let optimizer = Optimizer::new(ContentProfile::new(60, 6), OptimizerConfig::default())
        .expect("Failed to build optimizer");

    c.bench_function("solve (expansion)", |b| {
        b.iter(|| {
            let mut oracle = page_oracle(60.0, 800.0);
            optimizer.solve(
                black_box(LayoutParameters::new(10.0, 0.2, 2)),
                &mut oracle,
            )
        })
    });

    c.bench_function("solve (reduction)", |b| {
        b.iter(|| {
            let mut oracle = page_oracle(60.0, 800.0);
            optimizer.solve(
                black_box(LayoutParameters::new(30.0, 0.8, 2)),
                &mut oracle,
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
