// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Computation units with lazily built parameters.
//!
//! A [`Layer`] describes how to allocate parameters for an input shape and how
//! to transform a native tensor. A [`Unit`] owns one layer instance and drives
//! its lifecycle:
//!
//! 1. Every call coerces the input to a native tensor.
//! 2. The first call builds the layer for the input's shape, exactly once.
//! 3. Later calls must be shape-compatible with the built shape.
//!
//! ## Concurrency
//!
//! Build state lives in a `OnceCell`. Concurrent first calls from several
//! replicas block on a single initialization; the first shape to arrive wins
//! and incompatible shapes from other replicas fail with `ShapeMismatch`.
//! A unit shared across replicas therefore has one parameter set.
//!
//! [`Layer::build`] runs while the cell's init lock is held, and replicas run
//! on rayon workers. `build` must not block on rayon work: a worker waiting on
//! a join can pick up another replica of the same unit, which then waits on
//! the held lock forever.

use crate::coerce::{coerce, CoercionConfig};
use crate::error::{InteropError, Result};
use crate::traits::{Module, ValidatableConfig};
use crate::value::ArrayValue;
use candle_core::{Device, Tensor};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A named trainable tensor owned by a built layer.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    value: Tensor,
}

impl Parameter {
    /// Creates a new parameter with the provided tensor value.
    pub fn new(name: impl Into<String>, value: Tensor) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Returns the identifier assigned to the parameter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter tensor.
    #[must_use]
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Number of scalars in the parameter.
    #[must_use]
    pub fn elem_count(&self) -> usize {
        self.value.elem_count()
    }
}

/// Shape-dependent transform with parameters allocated on first use.
///
/// Implement this for custom layers and wrap the value in a [`Unit`].
/// Built-in layers return [`ArrayValue::Native`]; custom layers may return a
/// compat array instead.
///
/// # Example
///
/// ```rust
/// use candle_core::{Device, Tensor};
/// use rust_ai_interop::{ArrayValue, CompatArray, Layer, Result, Unit};
///
/// /// Doubles its input and hands it back as a compat array.
/// struct Double;
///
/// impl Layer for Double {
///     type State = ();
///
///     fn name(&self) -> &str {
///         "double"
///     }
///
///     fn build(&self, _input_shape: &[usize], _device: &Device) -> Result<()> {
///         Ok(())
///     }
///
///     fn forward(&self, _state: &(), input: &Tensor) -> Result<ArrayValue> {
///         Ok(CompatArray::from_tensor(&input.affine(2.0, 0.0)?)?.into())
///     }
/// }
///
/// let unit = Unit::new(Double);
/// let out = unit.apply([1.0, 2.0])?;
/// assert!(out.is_compat());
/// # Ok::<(), rust_ai_interop::InteropError>(())
/// ```
pub trait Layer: Send + Sync {
    /// Parameters and any other per-build state.
    type State: Send + Sync;

    /// Layer name.
    fn name(&self) -> &str;

    /// Minimum input rank accepted at build time.
    fn min_rank(&self) -> usize {
        0
    }

    /// Allocate state for `input_shape` on `device`.
    ///
    /// Called at most once per [`Unit`], under its build lock. Must not call
    /// into rayon (see the module docs).
    ///
    /// # Errors
    ///
    /// Returns a shape error when `input_shape` cannot be built for.
    fn build(&self, input_shape: &[usize], device: &Device) -> Result<Self::State>;

    /// Whether `input_shape` can be fed to a layer built for `built_shape`.
    ///
    /// Defaults to equal rank and equal non-batch dimensions.
    fn is_compatible(&self, built_shape: &[usize], input_shape: &[usize]) -> bool {
        built_shape.len() == input_shape.len() && built_shape.get(1..) == input_shape.get(1..)
    }

    /// Transform a coerced input.
    ///
    /// # Errors
    ///
    /// Propagates tensor operation failures.
    fn forward(&self, state: &Self::State, input: &Tensor) -> Result<ArrayValue>;

    /// Parameters held in `state`.
    fn parameters(&self, _state: &Self::State) -> Vec<Parameter> {
        Vec::new()
    }
}

struct Built<S> {
    input_shape: Vec<usize>,
    state: S,
}

/// A layer instance with one-time, thread-safe build.
pub struct Unit<L: Layer> {
    layer: L,
    coercion: CoercionConfig,
    built: OnceCell<Built<L::State>>,
    builds: AtomicUsize,
}

impl<L: Layer> Unit<L> {
    /// Wrap `layer`, coercing inputs onto the CPU.
    pub fn new(layer: L) -> Self {
        Self::from_parts(layer, CoercionConfig::default())
    }

    /// Wrap `layer` with an explicit coercion configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `coercion.float_dtype` is not a
    /// floating-point dtype.
    pub fn with_config(layer: L, coercion: CoercionConfig) -> Result<Self> {
        coercion.validate()?;
        Ok(Self::from_parts(layer, coercion))
    }

    fn from_parts(layer: L, coercion: CoercionConfig) -> Self {
        Self {
            layer,
            coercion,
            built: OnceCell::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// The wrapped layer.
    pub fn layer(&self) -> &L {
        &self.layer
    }

    /// Coercion applied to every input.
    pub fn coercion(&self) -> &CoercionConfig {
        &self.coercion
    }

    /// Build for `input_shape` if not built yet.
    ///
    /// Once built, a compatible shape is a no-op.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` when the rank is below the layer's minimum
    /// - `ShapeMismatch` when already built for an incompatible shape
    pub fn build(&self, input_shape: &[usize]) -> Result<()> {
        self.ensure_built(input_shape).map(|_| ())
    }

    fn ensure_built(&self, input_shape: &[usize]) -> Result<&L::State> {
        let built = self.built.get_or_try_init(|| {
            let min_rank = self.layer.min_rank();
            if input_shape.len() < min_rank {
                return Err(InteropError::dim_mismatch(format!(
                    "{} expects rank >= {min_rank}, got shape {input_shape:?}",
                    self.layer.name()
                )));
            }
            let state = self.layer.build(input_shape, &self.coercion.device)?;
            self.builds.fetch_add(1, Ordering::SeqCst);
            let params: usize = self
                .layer
                .parameters(&state)
                .iter()
                .map(Parameter::elem_count)
                .sum();
            tracing::debug!(
                target: "rust_ai_interop::layer",
                layer = self.layer.name(),
                input_shape = ?input_shape,
                params,
                "built layer"
            );
            Ok::<_, InteropError>(Built {
                input_shape: input_shape.to_vec(),
                state,
            })
        })?;

        if !self.layer.is_compatible(&built.input_shape, input_shape) {
            return Err(InteropError::shape_mismatch(
                built.input_shape.clone(),
                input_shape,
            ));
        }
        Ok(&built.state)
    }

    /// Coerce `input`, build on first use, and run the layer.
    ///
    /// # Errors
    ///
    /// `TypeConversion` from coercion, shape errors from build or the
    /// compatibility check, and any failure of the layer transform.
    pub fn apply(&self, input: impl Into<ArrayValue>) -> Result<ArrayValue> {
        let tensor = coerce(&input.into(), &self.coercion)?;
        let state = self.ensure_built(tensor.dims())?;
        self.layer.forward(state, &tensor)
    }

    /// Like [`apply`](Self::apply), with the output coerced to a native tensor.
    ///
    /// # Errors
    ///
    /// Same conditions as [`apply`](Self::apply).
    pub fn apply_native(&self, input: impl Into<ArrayValue>) -> Result<Tensor> {
        let output = self.apply(input)?;
        coerce(&output, &self.coercion)
    }

    /// Whether parameters have been allocated.
    pub fn is_built(&self) -> bool {
        self.built.get().is_some()
    }

    /// Number of times the layer's `build` has run (0 or 1).
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Input shape the unit was built for.
    pub fn built_shape(&self) -> Option<&[usize]> {
        self.built.get().map(|b| b.input_shape.as_slice())
    }

    /// Parameters of the built layer (empty before build).
    pub fn parameters(&self) -> Vec<Parameter> {
        self.built
            .get()
            .map(|b| self.layer.parameters(&b.state))
            .unwrap_or_default()
    }
}

impl<L: Layer> Module for Unit<L> {
    fn name(&self) -> &str {
        self.layer.name()
    }

    fn apply_value(&self, input: ArrayValue) -> Result<ArrayValue> {
        self.apply(input)
    }

    fn is_built(&self) -> bool {
        Unit::is_built(self)
    }

    fn parameter_count(&self) -> usize {
        self.parameters().iter().map(Parameter::elem_count).sum()
    }
}

impl<L: Layer> fmt::Debug for Unit<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("layer", &self.layer.name())
            .field("built_shape", &self.built_shape())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    /// Adds a learned offset vector sized from the last input axis.
    struct Offset;

    impl Layer for Offset {
        type State = Tensor;

        fn name(&self) -> &str {
            "offset"
        }

        fn min_rank(&self) -> usize {
            1
        }

        fn build(&self, input_shape: &[usize], device: &Device) -> Result<Tensor> {
            let width = input_shape[input_shape.len() - 1];
            Ok(Tensor::ones(width, DType::F64, device)?)
        }

        fn forward(&self, state: &Tensor, input: &Tensor) -> Result<ArrayValue> {
            let x = input.to_dtype(DType::F64)?;
            Ok(x.broadcast_add(state)?.into())
        }

        fn parameters(&self, state: &Tensor) -> Vec<Parameter> {
            vec![Parameter::new("offset::bias", state.clone())]
        }
    }

    #[test]
    fn test_builds_on_first_call_only() {
        let unit = Unit::new(Offset);
        assert!(!unit.is_built());
        assert_eq!(unit.build_count(), 0);

        for _ in 0..3 {
            unit.apply([[1.0, 2.0, 3.0]]).unwrap();
        }
        assert!(unit.is_built());
        assert_eq!(unit.build_count(), 1);
        assert_eq!(unit.built_shape(), Some(&[1usize, 3][..]));
    }

    #[test]
    fn test_explicit_build_then_apply() {
        let unit = Unit::new(Offset);
        unit.build(&[4, 2]).unwrap();
        unit.build(&[9, 2]).unwrap();
        assert_eq!(unit.build_count(), 1);
        let out = unit.apply_native([[1.0, 1.0]]).unwrap();
        assert_eq!(out.to_vec2::<f64>().unwrap(), vec![vec![2.0, 2.0]]);
    }

    #[test]
    fn test_rank_below_minimum() {
        let unit = Unit::new(Offset);
        let err = unit.apply(3.0).unwrap_err();
        assert!(matches!(err, InteropError::DimensionMismatch { .. }));
        assert!(!unit.is_built());
    }

    #[test]
    fn test_incompatible_after_build() {
        let unit = Unit::new(Offset);
        unit.apply([[1.0, 2.0]]).unwrap();
        let err = unit.apply([[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, InteropError::ShapeMismatch { .. }));
        assert_eq!(unit.built_shape(), Some(&[1usize, 2][..]));
    }

    #[test]
    fn test_parameters_exposed_after_build() {
        let unit = Unit::new(Offset);
        assert!(unit.parameters().is_empty());
        unit.apply([[0.0, 0.0, 0.0]]).unwrap();
        let params = unit.parameters();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(), "offset::bias");
        assert_eq!(Module::parameter_count(&unit), 3);
    }

    #[test]
    fn test_non_float_literal_dtype_rejected() {
        let config = CoercionConfig::default().with_float_dtype(DType::U8);
        let err = Unit::with_config(Offset, config).unwrap_err();
        assert!(matches!(err, InteropError::InvalidConfig(_)));

        let unit = Unit::with_config(Offset, CoercionConfig::default().prefer_float32()).unwrap();
        let out = unit.apply_native([[0.5, 1.5]]).unwrap();
        assert_eq!(out.to_vec2::<f64>().unwrap(), vec![vec![1.5, 2.5]]);
    }

    #[test]
    fn test_scalar_input_with_default_min_rank() {
        struct Square;

        impl Layer for Square {
            type State = ();

            fn name(&self) -> &str {
                "square"
            }

            fn build(&self, _input_shape: &[usize], _device: &Device) -> Result<()> {
                Ok(())
            }

            fn forward(&self, _state: &(), input: &Tensor) -> Result<ArrayValue> {
                Ok(input.sqr()?.into())
            }
        }

        let unit = Unit::new(Square);
        let out = unit.apply_native(3.0).unwrap();
        assert_eq!(out.to_scalar::<f64>().unwrap(), 9.0);
        assert_eq!(unit.built_shape(), Some(&[][..]));
    }

    #[test]
    fn test_concurrent_first_calls_build_once() {
        let unit = Unit::new(Offset);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| unit.apply([[1.0, 2.0]]).unwrap());
            }
        });
        assert_eq!(unit.build_count(), 1);
    }
}
