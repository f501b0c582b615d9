// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Elementwise activations.

use crate::dtype::is_floating_point;
use crate::error::Result;
use crate::layer::Layer;
use crate::value::ArrayValue;
use candle_core::{DType, Device, Tensor};

/// Elementwise nonlinearity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Identity.
    #[default]
    Linear,
    /// `max(x, 0)`.
    Relu,
    /// Hyperbolic tangent.
    Tanh,
    /// `1 / (1 + exp(-x))`.
    Sigmoid,
}

impl Activation {
    /// Apply the activation to `x`.
    ///
    /// # Errors
    ///
    /// Propagates Candle errors (e.g. unsupported dtype for the op).
    pub fn apply(&self, x: &Tensor) -> Result<Tensor> {
        Ok(match self {
            Self::Linear => x.clone(),
            Self::Relu => x.relu()?,
            Self::Tanh => x.tanh()?,
            Self::Sigmoid => x.neg()?.exp()?.affine(1.0, 1.0)?.recip()?,
        })
    }

    /// Lowercase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
        }
    }
}

/// Parameter-free layer applying an [`Activation`].
///
/// Integer inputs are cast to `f32` first.
#[derive(Debug, Clone)]
pub struct ActivationLayer {
    name: String,
    activation: Activation,
}

impl ActivationLayer {
    /// Create an activation layer named after its activation.
    #[must_use]
    pub fn new(activation: Activation) -> Self {
        Self {
            name: activation.name().to_string(),
            activation,
        }
    }

    /// The activation applied.
    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl Layer for ActivationLayer {
    type State = ();

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, _input_shape: &[usize], _device: &Device) -> Result<()> {
        Ok(())
    }

    fn is_compatible(&self, _built_shape: &[usize], _input_shape: &[usize]) -> bool {
        true
    }

    fn forward(&self, _state: &(), input: &Tensor) -> Result<ArrayValue> {
        let x = if is_floating_point(input.dtype()) {
            input.clone()
        } else {
            input.to_dtype(DType::F32)?
        };
        Ok(self.activation.apply(&x)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Unit;
    use approx::assert_relative_eq;

    fn row(values: &[f32]) -> Tensor {
        Tensor::new(values, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_relu() {
        let y = Activation::Relu.apply(&row(&[-1.0, 0.0, 2.0])).unwrap();
        assert_eq!(y.to_vec1::<f32>().unwrap(), vec![0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_sigmoid_and_tanh() {
        let y = Activation::Sigmoid.apply(&row(&[0.0, 2.0])).unwrap();
        let y = y.to_vec1::<f32>().unwrap();
        assert_relative_eq!(y[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(y[1], 1.0 / (1.0 + (-2.0f32).exp()), epsilon = 1e-6);

        let t = Activation::Tanh.apply(&row(&[0.5])).unwrap();
        assert_relative_eq!(t.to_vec1::<f32>().unwrap()[0], 0.5f32.tanh(), epsilon = 1e-6);
    }

    #[test]
    fn test_layer_accepts_any_shape_and_casts_ints() {
        let unit = Unit::new(ActivationLayer::new(Activation::Relu));
        let out = unit.apply_native([-3, 4]).unwrap();
        assert_eq!(out.dtype(), DType::F32);
        assert_eq!(out.to_vec1::<f32>().unwrap(), vec![0.0, 4.0]);

        let out = unit.apply_native([[1.5, -1.5]]).unwrap();
        assert_eq!(out.dims(), &[1, 2]);
        assert_eq!(unit.build_count(), 1);
    }
}
