//! Performance benchmarks for dispatch_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::forwarding::{ForwardCandidate, ForwardingStrategy, LeastLoadedForwarding};
use dispatch_core::hospital::HospitalId;
use dispatch_core::input::{parse_input, write_input};
use dispatch_core::scenario::{generate_input, DispatchConfig, GeneratorParams};

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![
        ("small", 3, 100),
        ("medium", 10, 1_000),
        ("large", 25, 10_000),
    ];

    let mut group = c.benchmark_group("simulation_run");
    for (name, hospitals, requests) in scenarios {
        let input = generate_input(
            &GeneratorParams::default()
                .with_seed(42)
                .with_hospitals(hospitals)
                .with_requests(requests, requests as u64 / 2),
        );
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| {
                let mut dispatcher =
                    Dispatcher::new(input, DispatchConfig::default()).expect("valid input");
                black_box(dispatcher.run().expect("run"));
            });
        });
    }
    group.finish();
}

fn bench_forwarding_selection(c: &mut Criterion) {
    let candidates: Vec<ForwardCandidate> = (2..=200)
        .map(|id| ForwardCandidate {
            hospital: HospitalId(id),
            emergency_queue_len: id % 7,
            distance: (id as u64 * 37) % 101,
        })
        .collect();
    let strategy = LeastLoadedForwarding;
    c.bench_function("least_loaded_200_hospitals", |b| {
        b.iter(|| black_box(strategy.select_target(HospitalId(1), 5, black_box(&candidates))));
    });
}

fn bench_input_parsing(c: &mut Criterion) {
    let input = generate_input(&GeneratorParams::default().with_requests(10_000, 5_000));
    let mut text = Vec::new();
    write_input(&input, &mut text).expect("render");
    let text = String::from_utf8(text).expect("utf8");
    c.bench_function("parse_10k_requests", |b| {
        b.iter(|| black_box(parse_input(black_box(&text)).expect("parse")));
    });
}

criterion_group!(
    benches,
    bench_simulation_run,
    bench_forwarding_selection,
    bench_input_parsing
);
criterion_main!(benches);
