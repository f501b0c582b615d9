// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Parameter initializers.

use crate::error::{InteropError, Result};
use candle_core::{DType, Device, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How a parameter tensor is filled at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initializer {
    /// All zeros.
    Zeros,
    /// All ones.
    Ones,
    /// Every element set to the value.
    Constant(f64),
    /// Uniform in `[-limit, limit)`, `limit = sqrt(6 / (fan_in + fan_out))`.
    ///
    /// With a seed the draw is reproducible; without one it is seeded from
    /// the thread RNG.
    GlorotUniform {
        /// Optional RNG seed.
        seed: Option<u64>,
    },
}

impl Initializer {
    /// Seeded Glorot-uniform initializer.
    #[must_use]
    pub fn glorot_uniform(seed: u64) -> Self {
        Self::GlorotUniform { seed: Some(seed) }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Constant(v) if !v.is_finite() => Err(InteropError::invalid_config(format!(
                "constant initializer must be finite, got {v}"
            ))),
            _ => Ok(()),
        }
    }

    /// Create a tensor of `shape`.
    ///
    /// `fan_in` and `fan_out` only matter for Glorot initialization.
    ///
    /// # Errors
    ///
    /// Propagates Candle allocation errors.
    #[allow(clippy::cast_precision_loss)]
    pub fn init(
        &self,
        shape: &[usize],
        fan_in: usize,
        fan_out: usize,
        dtype: DType,
        device: &Device,
    ) -> Result<Tensor> {
        let tensor = match self {
            Self::Zeros => Tensor::zeros(shape, dtype, device)?,
            Self::Ones => Tensor::ones(shape, dtype, device)?,
            Self::Constant(v) => Tensor::ones(shape, dtype, device)?.affine(*v, 0.0)?,
            Self::GlorotUniform { seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
                let count: usize = shape.iter().product();
                let values: Vec<f64> = (0..count).map(|_| rng.gen_range(-limit..limit)).collect();
                Tensor::from_vec(values, shape, device)?.to_dtype(dtype)?
            }
        };
        Ok(tensor)
    }
}
