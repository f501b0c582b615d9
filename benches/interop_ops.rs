//! Benchmarks for coercion, unit application and replica dispatch.

use candle_core::{DType, Device, Tensor};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rust_ai_interop::{
    coerce, ArrayValue, CoercionConfig, Dense, DenseConfig, DeviceConfig, Initializer,
    MirroredStrategy, Unit,
};
use std::hint::black_box;

/// Benchmark coercion of each representation.
fn bench_coercion(c: &mut Criterion) {
    let mut group = c.benchmark_group("coercion");
    let config = CoercionConfig::default();

    for size in [16, 128, 512] {
        let native = ArrayValue::from(Tensor::ones((size, size), DType::F32, &Device::Cpu).unwrap());
        let compat = ArrayValue::from(Array2::<f32>::ones((size, size)));
        let literal = ArrayValue::from(vec![vec![1.0; size]; size]);

        group.bench_with_input(BenchmarkId::new("native", size), &native, |b, v| {
            b.iter(|| black_box(coerce(black_box(v), &config).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("compat", size), &compat, |b, v| {
            b.iter(|| black_box(coerce(black_box(v), &config).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("literal", size), &literal, |b, v| {
            b.iter(|| black_box(coerce(black_box(v), &config).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark a built dense unit (build cost excluded).
fn bench_dense_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_apply");

    for width in [64, 256] {
        let unit = Unit::new(
            Dense::from_config(
                DenseConfig::new(width).with_kernel_initializer(Initializer::glorot_uniform(0)),
            )
            .unwrap(),
        );
        let x = Tensor::ones((32, width), DType::F32, &Device::Cpu).unwrap();
        unit.build(x.dims()).unwrap();

        group.bench_with_input(BenchmarkId::new("native", width), &x, |b, x| {
            b.iter(|| black_box(unit.apply(black_box(x)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark fan-out/fan-in overhead.
fn bench_strategy_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_run");

    for replicas in [1, 4, 8] {
        let config = DeviceConfig::new()
            .with_force_cpu(true)
            .with_logical_devices(replicas);
        let parallel = MirroredStrategy::from_config(&config).unwrap();
        let sequential = parallel.clone().with_parallel(false);

        group.bench_function(BenchmarkId::new("parallel", replicas), |b| {
            b.iter(|| black_box(parallel.run(|ctx| Ok(ctx.replica_id() * 5)).unwrap()))
        });
        group.bench_function(BenchmarkId::new("sequential", replicas), |b| {
            b.iter(|| black_box(sequential.run(|ctx| Ok(ctx.replica_id() * 5)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_coercion, bench_dense_apply, bench_strategy_run);
criterion_main!(benches);
