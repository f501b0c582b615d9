//! Walkthrough: compat arrays, native tensors, layers and a mirrored strategy.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example interop_walkthrough
//! ```

use candle_core::{DType, Device, Tensor};
use ndarray::{array, Array2, Ix2};
use rust_ai_interop::{
    coerce, init_logging, log_replica_results, log_value, Activation, ActivationLayer, ArrayValue,
    CoercionConfig, CompatArray, Dense, DenseConfig, DeviceConfig, Initializer, Layer, LogConfig,
    MirroredStrategy, ReduceOp, Result, Sequential, Unit,
};
use std::sync::Arc;

// ============================================================================
// A user-defined layer that computes with ndarray
// ============================================================================

/// Projection whose forward pass stays in compat-array land.
struct ArrayProjection {
    units: usize,
}

impl Layer for ArrayProjection {
    type State = Array2<f32>;

    fn name(&self) -> &str {
        "array_projection"
    }

    fn min_rank(&self) -> usize {
        2
    }

    fn build(&self, input_shape: &[usize], _device: &Device) -> Result<Array2<f32>> {
        let input_dim = input_shape[input_shape.len() - 1];
        Ok(Array2::from_shape_fn((input_dim, self.units), |(r, c)| {
            0.1 * (r + c + 1) as f32
        }))
    }

    fn forward(&self, kernel: &Array2<f32>, input: &Tensor) -> Result<ArrayValue> {
        let x = CompatArray::from_tensor(input)?
            .to_f32()?
            .into_dimensionality::<Ix2>()?;
        Ok(CompatArray::from(x.dot(kernel)).into())
    }
}

fn main() -> Result<()> {
    init_logging(&LogConfig::walkthrough());

    // ------------------------------------------------------------------
    // 1. Representations and coercion
    // ------------------------------------------------------------------
    let config = CoercionConfig::default().prefer_float32();
    let compat = ArrayValue::from(array![[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
    let literal = ArrayValue::from([[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
    let native = ArrayValue::from(coerce(&literal, &config)?);
    for (label, value) in [("compat", &compat), ("literal", &literal), ("native", &native)] {
        log_value(label, value);
        println!("{label:>8}: {value}");
    }

    // ------------------------------------------------------------------
    // 2. A built-in layer accepts every representation
    // ------------------------------------------------------------------
    let dense = Unit::new(Dense::from_config(
        DenseConfig::new(2).with_kernel_initializer(Initializer::glorot_uniform(0)),
    )?);
    for value in [&compat, &literal, &native] {
        let y = dense.apply(value.clone())?;
        println!("dense({}) -> {y}", value.kind());
    }
    println!("dense built {} time(s)", dense.build_count());

    // ------------------------------------------------------------------
    // 3. A user-defined layer may return a compat array
    // ------------------------------------------------------------------
    let custom = Unit::new(ArrayProjection { units: 3 });
    let out = custom.apply(compat.clone())?;
    println!("custom -> {out}");

    // ------------------------------------------------------------------
    // 4. Composition: every unit accepts the previous unit's output
    // ------------------------------------------------------------------
    let model = Sequential::new()
        .add(Unit::new(ArrayProjection { units: 8 }))
        .add(Unit::new(ActivationLayer::new(Activation::Relu)))
        .add(Unit::new(Dense::new(2)?));
    let y = model.call(compat.clone())?;
    println!("model -> {y}");
    println!("{}", model.summary());

    // ------------------------------------------------------------------
    // 5. Mirrored strategy over three logical devices
    // ------------------------------------------------------------------
    let strategy = MirroredStrategy::from_config(
        &DeviceConfig::from_env()
            .with_force_cpu(true)
            .with_logical_devices(3),
    )?;
    for device in strategy.devices() {
        println!("logical device: {device}");
    }

    let ids = strategy.run(|ctx| Ok(ctx.replica_id() * 5))?;
    log_replica_results("replica_id * 5", &ids);
    println!("replica_id * 5 = {:?}", ids.values());

    let model = Arc::new(model);
    let outputs = strategy.run(|ctx| {
        let x = Tensor::ones((2, 4), DType::F32, ctx.device().device())?;
        let y = model.call(x)?;
        coerce(&y, &ctx.coercion())
    })?;
    for (replica, t) in outputs.iter().enumerate() {
        println!("replica {replica}: {:?}", t.to_vec2::<f32>()?);
    }
    let mean = strategy.reduce(ReduceOp::Mean, &outputs)?;
    println!("mean over replicas: {:?}", mean.to_vec2::<f32>()?);

    Ok(())
}
