// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Densely connected (affine projection) layer.

use super::activation::Activation;
use super::init::Initializer;
use crate::dtype::{is_floating_point, DTypeExt};
use crate::error::{InteropError, Result};
use crate::layer::{Layer, Parameter};
use crate::traits::ValidatableConfig;
use crate::value::ArrayValue;
use candle_core::{DType, Device, Tensor};

/// Configuration for [`Dense`].
#[derive(Debug, Clone)]
pub struct DenseConfig {
    /// Output width.
    pub units: usize,
    /// Activation applied after the projection.
    pub activation: Activation,
    /// Whether a bias vector is added.
    pub use_bias: bool,
    /// Initializer for the `[input_dim, units]` kernel.
    pub kernel_initializer: Initializer,
    /// Initializer for the `[units]` bias.
    pub bias_initializer: Initializer,
    /// Parameter and compute dtype.
    pub dtype: DType,
}

impl DenseConfig {
    /// Linear projection to `units` outputs with bias, Glorot kernel, `f32`.
    #[must_use]
    pub fn new(units: usize) -> Self {
        Self {
            units,
            activation: Activation::Linear,
            use_bias: true,
            kernel_initializer: Initializer::GlorotUniform { seed: None },
            bias_initializer: Initializer::Zeros,
            dtype: DType::F32,
        }
    }

    /// Set the activation.
    #[must_use]
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Enable or disable the bias.
    #[must_use]
    pub fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    /// Set the kernel initializer.
    #[must_use]
    pub fn with_kernel_initializer(mut self, init: Initializer) -> Self {
        self.kernel_initializer = init;
        self
    }

    /// Set the bias initializer.
    #[must_use]
    pub fn with_bias_initializer(mut self, init: Initializer) -> Self {
        self.bias_initializer = init;
        self
    }

    /// Set the compute dtype.
    #[must_use]
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }
}

impl ValidatableConfig for DenseConfig {
    fn validate(&self) -> Result<()> {
        if self.units == 0 {
            return Err(InteropError::invalid_config("units must be > 0"));
        }
        if !is_floating_point(self.dtype) {
            return Err(InteropError::invalid_config(format!(
                "dense dtype must be floating-point, got {}",
                self.dtype.name()
            )));
        }
        self.kernel_initializer.validate()?;
        self.bias_initializer.validate()
    }
}

/// Built parameters of a [`Dense`] layer.
#[derive(Debug, Clone)]
pub struct DenseState {
    kernel: Parameter,
    bias: Option<Parameter>,
}

impl DenseState {
    /// `[input_dim, units]` kernel.
    #[must_use]
    pub fn kernel(&self) -> &Parameter {
        &self.kernel
    }

    /// `[units]` bias, if enabled.
    #[must_use]
    pub fn bias(&self) -> Option<&Parameter> {
        self.bias.as_ref()
    }
}

/// `activation(x · kernel + bias)` over the last axis.
///
/// Accepts inputs of rank 2 or more. The kernel is sized from the last axis
/// of the first input; later inputs must match that axis. Numeric inputs of
/// another dtype are cast to the layer dtype.
///
/// ```rust
/// use rust_ai_interop::{Dense, Unit};
///
/// let unit = Unit::new(Dense::new(2)?);
/// let y = unit.apply_native([[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]])?;
/// assert_eq!(y.dims(), &[2, 2]);
/// # Ok::<(), rust_ai_interop::InteropError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dense {
    name: String,
    config: DenseConfig,
}

impl Dense {
    /// Linear projection to `units` outputs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `units` is zero.
    pub fn new(units: usize) -> Result<Self> {
        Self::from_config(DenseConfig::new(units))
    }

    /// Create from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when validation fails.
    pub fn from_config(config: DenseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: "dense".to_string(),
            config,
        })
    }

    /// Rename the layer (parameter names follow).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Layer configuration.
    #[must_use]
    pub fn config(&self) -> &DenseConfig {
        &self.config
    }
}

impl Layer for Dense {
    type State = DenseState;

    fn name(&self) -> &str {
        &self.name
    }

    fn min_rank(&self) -> usize {
        2
    }

    fn build(&self, input_shape: &[usize], device: &Device) -> Result<DenseState> {
        let input_dim = input_shape.last().copied().unwrap_or(0);
        if input_dim == 0 {
            return Err(InteropError::dim_mismatch(format!(
                "{} needs a non-empty last axis, got shape {input_shape:?}",
                self.name
            )));
        }
        let units = self.config.units;
        let kernel = self.config.kernel_initializer.init(
            &[input_dim, units],
            input_dim,
            units,
            self.config.dtype,
            device,
        )?;
        let bias = if self.config.use_bias {
            let bias = self
                .config
                .bias_initializer
                .init(&[units], input_dim, units, self.config.dtype, device)?;
            Some(Parameter::new(format!("{}::bias", self.name), bias))
        } else {
            None
        };
        Ok(DenseState {
            kernel: Parameter::new(format!("{}::kernel", self.name), kernel),
            bias,
        })
    }

    fn is_compatible(&self, built_shape: &[usize], input_shape: &[usize]) -> bool {
        input_shape.len() >= self.min_rank() && input_shape.last() == built_shape.last()
    }

    fn forward(&self, state: &DenseState, input: &Tensor) -> Result<ArrayValue> {
        let x = if input.dtype() == self.config.dtype {
            input.contiguous()?
        } else {
            input.to_dtype(self.config.dtype)?.contiguous()?
        };
        let kernel = state.kernel.value();
        let y = if x.rank() == 2 {
            x.matmul(kernel)?
        } else {
            x.broadcast_matmul(kernel)?
        };
        let y = match &state.bias {
            Some(bias) => y.broadcast_add(bias.value())?,
            None => y,
        };
        Ok(self.config.activation.apply(&y)?.into())
    }

    fn parameters(&self, state: &DenseState) -> Vec<Parameter> {
        std::iter::once(state.kernel.clone())
            .chain(state.bias.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Unit;
    use ndarray::array;

    fn ones_dense(units: usize) -> Dense {
        Dense::from_config(
            DenseConfig::new(units)
                .with_kernel_initializer(Initializer::Ones)
                .with_bias_initializer(Initializer::Constant(0.5)),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_units_rejected() {
        assert!(matches!(Dense::new(0), Err(InteropError::InvalidConfig(_))));
    }

    #[test]
    fn test_integer_dtype_rejected() {
        let config = DenseConfig::new(2).with_dtype(DType::I64);
        assert!(Dense::from_config(config).is_err());
    }

    #[test]
    fn test_projection_values() {
        let unit = Unit::new(ones_dense(2));
        let y = unit.apply_native(array![[1.0f32, 2.0, 3.0, 4.0]]).unwrap();
        assert_eq!(y.to_vec2::<f32>().unwrap(), vec![vec![10.5, 10.5]]);
    }

    #[test]
    fn test_projection_shape() {
        let unit = Unit::new(Dense::new(2).unwrap());
        let y = unit
            .apply_native([[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]])
            .unwrap();
        assert_eq!(y.dims(), &[2, 2]);
        assert_eq!(y.dtype(), DType::F32);
    }

    #[test]
    fn test_parameters_named_and_sized() {
        let unit = Unit::new(Dense::new(3).unwrap().with_name("proj"));
        unit.build(&[5, 4]).unwrap();
        let params = unit.parameters();
        let names: Vec<&str> = params.iter().map(Parameter::name).collect();
        assert_eq!(names, ["proj::kernel", "proj::bias"]);
        assert_eq!(params[0].value().dims(), &[4, 3]);
        assert_eq!(params[1].value().dims(), &[3]);
    }

    #[test]
    fn test_without_bias() {
        let layer = Dense::from_config(
            DenseConfig::new(1)
                .with_bias(false)
                .with_kernel_initializer(Initializer::Ones),
        )
        .unwrap();
        let unit = Unit::new(layer);
        let y = unit.apply_native([[1, 2, 3]]).unwrap();
        assert_eq!(y.to_vec2::<f32>().unwrap(), vec![vec![6.0]]);
        assert_eq!(unit.parameters().len(), 1);
    }

    #[test]
    fn test_rank_three_input() {
        let unit = Unit::new(ones_dense(2));
        let x = Tensor::ones((2, 3, 4), DType::F32, &Device::Cpu).unwrap();
        let y = unit.apply_native(x).unwrap();
        assert_eq!(y.dims(), &[2, 3, 2]);
    }

    #[test]
    fn test_rank_one_rejected() {
        let unit = Unit::new(Dense::new(2).unwrap());
        let err = unit.apply([1.0, 2.0]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_last_axis_must_match_after_build() {
        let unit = Unit::new(ones_dense(2));
        unit.apply([[1.0, 2.0, 3.0, 4.0]]).unwrap();
        unit.apply([[0.0; 4]; 7]).unwrap();
        let err = unit.apply([[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, InteropError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_relu_activation() {
        let layer = Dense::from_config(
            DenseConfig::new(1)
                .with_kernel_initializer(Initializer::Constant(-1.0))
                .with_activation(Activation::Relu),
        )
        .unwrap();
        let unit = Unit::new(layer);
        let y = unit.apply_native([[1.0, 1.0], [-1.0, -2.0]]).unwrap();
        assert_eq!(y.to_vec2::<f32>().unwrap(), vec![vec![0.0], vec![3.0]]);
    }
}
