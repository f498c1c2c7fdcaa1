use criterion::{Criterion, criterion_group, criterion_main};
use lib_game_aggregator::{data::Platform, get_detector};

fn main_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("main");

    group.bench_function("get_detector", |b| b.iter(get_detector));

    group.bench_function("get_detected_scanners", |b| {
        b.iter(|| get_detector().get_detected_scanners())
    });

    group.bench_function("scan_all", |b| b.iter(|| get_detector().scan_all()));

    group.finish();
}

fn per_platform_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("per_platform");
    let detector = get_detector();

    for platform in Platform::ALL {
        group.bench_function(platform.id_prefix(), |b| {
            b.iter(|| detector.get_all_detected_games_from_specific_platform(platform))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = main_benchmarks, per_platform_benchmark
}
criterion_main!(benches);
