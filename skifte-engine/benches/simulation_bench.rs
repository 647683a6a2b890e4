#[macro_use]
extern crate criterion;

use std::sync::Arc;

use criterion::{black_box, Criterion};

use skifte_config::SkifteConfig;
use skifte_core::net::ring;
use skifte_engine::SimulationRuntime;
use skifte_telemetry::MetricsRecorder;

/// Benchmark full-run throughput on a mid-size ring under the
/// alternating scheme.
fn benchmark_run_throughput(c: &mut Criterion) {
    let mut config = SkifteConfig::default();
    config.simulation.seed = 42;
    config.simulation.scheme = "alternating".into();
    config.adversary.attempt_cap = 5_000;

    let metrics = Arc::new(MetricsRecorder::new());

    c.bench_function("simulation_run_throughput", |b| {
        b.iter(|| {
            let runtime =
                SimulationRuntime::new(&config, ring(12), metrics.clone()).expect("valid config");
            black_box(runtime.run());
        })
    });
}

criterion_group!(benches, benchmark_run_throughput);
criterion_main!(benches);
