// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Coercion of any accepted value into a native tensor.
//!
//! [`coerce`] is the single entry point every computation unit goes through.
//! It is deterministic and side-effect free: the same input and configuration
//! always produce a bit-identical tensor.
//!
//! | Input | Result dtype |
//! |-------|--------------|
//! | `Native` | unchanged (moved to the configured device) |
//! | `Compat` | lossless mapping, see [`CompatDType::native_dtype`] |
//! | `Literal`, any float or empty | `CoercionConfig::float_dtype` |
//! | `Literal`, all integers | `i64` |
//! | anything boolean | `TypeConversion` error |

use crate::compat::CompatArray;
use crate::dtype::{is_floating_point, unsupported_bool, CompatDType, DTypeExt};
use crate::error::{InteropError, Result};
use crate::traits::ValidatableConfig;
use crate::value::{ArrayValue, Literal};
use candle_core::{DType, Device, Tensor};

/// Where and how values are materialized as native tensors.
#[derive(Debug, Clone)]
pub struct CoercionConfig {
    /// Target device for coerced tensors.
    pub device: Device,
    /// Dtype for floating-point literals.
    pub float_dtype: DType,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            float_dtype: DType::F64,
        }
    }
}

impl CoercionConfig {
    /// Create a configuration targeting `device` with `float64` literals.
    #[must_use]
    pub fn new(device: Device) -> Self {
        Self {
            device,
            ..Self::default()
        }
    }

    /// Materialize floating-point literals as `float32`.
    #[must_use]
    pub fn prefer_float32(mut self) -> Self {
        self.float_dtype = DType::F32;
        self
    }

    /// Set the dtype for floating-point literals.
    #[must_use]
    pub fn with_float_dtype(mut self, dtype: DType) -> Self {
        self.float_dtype = dtype;
        self
    }

    /// Set the target device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

impl ValidatableConfig for CoercionConfig {
    fn validate(&self) -> Result<()> {
        if !is_floating_point(self.float_dtype) {
            return Err(InteropError::invalid_config(format!(
                "float_dtype must be a floating-point dtype, got {}",
                self.float_dtype.name()
            )));
        }
        Ok(())
    }
}

/// Coerce an accepted value into a native tensor.
///
/// Coercing a native tensor that already lives on the target device returns a
/// handle to the same storage, so coercion is idempotent.
///
/// # Errors
///
/// - `TypeConversion` when an element type is not representable natively
/// - `DimensionMismatch` for ragged literals
/// - `InvalidConfig` when `config.float_dtype` is not a floating-point dtype
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use rust_ai_interop::{coerce, ArrayValue, CoercionConfig};
///
/// let config = CoercionConfig::default();
/// let t = coerce(&ArrayValue::from(array![[1.0f32, 2.0]]), &config)?;
/// assert_eq!(t.dims(), &[1, 2]);
/// # Ok::<(), rust_ai_interop::InteropError>(())
/// ```
pub fn coerce(value: &ArrayValue, config: &CoercionConfig) -> Result<Tensor> {
    config.validate()?;
    match value {
        ArrayValue::Native(t) => Ok(t.to_device(&config.device)?),
        ArrayValue::Compat(a) => compat_to_tensor(a, &config.device),
        ArrayValue::Literal(l) => literal_to_tensor(l, config),
    }
}

fn compat_to_tensor(array: &CompatArray, device: &Device) -> Result<Tensor> {
    let shape = array.shape().to_vec();
    let tensor = match array {
        CompatArray::F32(a) => Tensor::from_vec(a.iter().copied().collect::<Vec<_>>(), shape, device)?,
        CompatArray::F64(a) => Tensor::from_vec(a.iter().copied().collect::<Vec<_>>(), shape, device)?,
        CompatArray::I32(a) => {
            Tensor::from_vec(a.iter().map(|&v| i64::from(v)).collect::<Vec<_>>(), shape, device)?
        }
        CompatArray::I64(a) => Tensor::from_vec(a.iter().copied().collect::<Vec<_>>(), shape, device)?,
        CompatArray::U8(a) => Tensor::from_vec(a.iter().copied().collect::<Vec<_>>(), shape, device)?,
        CompatArray::U32(a) => Tensor::from_vec(a.iter().copied().collect::<Vec<_>>(), shape, device)?,
        CompatArray::Bool(_) => return Err(unsupported_bool()),
    };
    Ok(tensor)
}

fn literal_to_tensor(literal: &Literal, config: &CoercionConfig) -> Result<Tensor> {
    let shape = literal.shape()?;
    let scalars = literal.scalars();

    if scalars.iter().any(|s| matches!(s, Literal::Bool(_))) {
        return Err(InteropError::type_conversion(
            "bool literal",
            "native tensors have no boolean dtype",
        ));
    }

    let all_ints = !scalars.is_empty() && scalars.iter().all(|s| matches!(s, Literal::Int(_)));
    if all_ints {
        let values: Vec<i64> = scalars
            .iter()
            .filter_map(|s| match s {
                Literal::Int(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Ok(Tensor::from_vec(values, shape, &config.device)?);
    }

    #[allow(clippy::cast_precision_loss)]
    let values: Vec<f64> = scalars
        .iter()
        .filter_map(|s| match s {
            Literal::Float(v) => Some(*v),
            Literal::Int(v) => Some(*v as f64),
            _ => None,
        })
        .collect();
    let tensor = Tensor::from_vec(values, shape, &config.device)?;
    if config.float_dtype == DType::F64 {
        Ok(tensor)
    } else {
        Ok(tensor.to_dtype(config.float_dtype)?)
    }
}

/// Native dtype a value will have after coercion, without materializing it.
///
/// # Errors
///
/// Same conditions as [`coerce`].
pub fn coerced_dtype(value: &ArrayValue, config: &CoercionConfig) -> Result<DType> {
    config.validate()?;
    match value {
        ArrayValue::Native(t) => Ok(t.dtype()),
        ArrayValue::Compat(a) => a.dtype().native_dtype(),
        ArrayValue::Literal(l) => {
            l.shape()?;
            let scalars = l.scalars();
            if scalars.iter().any(|s| matches!(s, Literal::Bool(_))) {
                Err(InteropError::type_conversion(
                    "bool literal",
                    "native tensors have no boolean dtype",
                ))
            } else if !scalars.is_empty() && scalars.iter().all(|s| matches!(s, Literal::Int(_))) {
                Ok(CompatDType::I64.native_dtype()?)
            } else {
                Ok(config.float_dtype)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cpu() -> CoercionConfig {
        CoercionConfig::default()
    }

    #[test]
    fn test_native_is_idempotent() {
        let t = Tensor::new(&[[1.0f32, 2.0], [3.0, 4.0]], &Device::Cpu).unwrap();
        let once = coerce(&ArrayValue::from(&t), &cpu()).unwrap();
        let twice = coerce(&ArrayValue::from(&once), &cpu()).unwrap();
        assert_eq!(twice.dims(), t.dims());
        assert_eq!(twice.dtype(), t.dtype());
        assert_eq!(
            twice.to_vec2::<f32>().unwrap(),
            t.to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn test_compat_keeps_values_and_dtype() {
        let value = ArrayValue::from(array![[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let t = coerce(&value, &cpu()).unwrap();
        assert_eq!(t.dtype(), DType::F64);
        assert_eq!(
            t.to_vec2::<f64>().unwrap(),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn test_i32_widens_to_i64() {
        let t = coerce(&ArrayValue::from(array![1i32, -7]), &cpu()).unwrap();
        assert_eq!(t.dtype(), DType::I64);
        assert_eq!(t.to_vec1::<i64>().unwrap(), vec![1, -7]);
    }

    #[test]
    fn test_bool_array_fails() {
        let err = coerce(&ArrayValue::from(array![true, false]), &cpu()).unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn test_literal_dtypes() {
        let ints = coerce(&ArrayValue::from([1, 2, 3]), &cpu()).unwrap();
        assert_eq!(ints.dtype(), DType::I64);

        let mixed = coerce(&ArrayValue::from(Literal::List(vec![1.into(), 2.5.into()])), &cpu()).unwrap();
        assert_eq!(mixed.dtype(), DType::F64);
        assert_eq!(mixed.to_vec1::<f64>().unwrap(), vec![1.0, 2.5]);

        let f32s = coerce(&ArrayValue::from([0.5, 1.5]), &cpu().prefer_float32()).unwrap();
        assert_eq!(f32s.dtype(), DType::F32);
    }

    #[test]
    fn test_scalar_literal() {
        let t = coerce(&ArrayValue::from(4.0), &cpu()).unwrap();
        assert_eq!(t.rank(), 0);
        assert_eq!(t.to_scalar::<f64>().unwrap(), 4.0);
    }

    #[test]
    fn test_bool_literal_fails() {
        let err = coerce(&ArrayValue::from([true, false]), &cpu()).unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn test_ragged_literal_fails() {
        let ragged = Literal::List(vec![vec![1, 2].into(), vec![3].into()]);
        let err = coerce(&ArrayValue::from(ragged), &cpu()).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_deterministic() {
        let value = ArrayValue::from([[0.1, 0.2], [0.3, 0.4]]);
        let a = coerce(&value, &cpu()).unwrap().to_vec2::<f64>().unwrap();
        let b = coerce(&value, &cpu()).unwrap().to_vec2::<f64>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_coerced_dtype_matches_coerce() {
        let config = cpu().prefer_float32();
        for value in [
            ArrayValue::from([1, 2]),
            ArrayValue::from([1.0, 2.0]),
            ArrayValue::from(array![1u8, 2]),
        ] {
            let expected = coerce(&value, &config).unwrap().dtype();
            assert_eq!(coerced_dtype(&value, &config).unwrap(), expected);
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(cpu().validate().is_ok());
        let bad = cpu().with_float_dtype(DType::I64);
        assert!(matches!(bad.validate(), Err(InteropError::InvalidConfig(_))));
    }

    #[test]
    fn test_integer_float_dtype_rejected_instead_of_truncating() {
        let bad = cpu().with_float_dtype(DType::U8);
        let value = ArrayValue::from([0.5, 1.7, 2.9]);
        assert!(matches!(coerce(&value, &bad), Err(InteropError::InvalidConfig(_))));
        assert!(matches!(coerced_dtype(&value, &bad), Err(InteropError::InvalidConfig(_))));

        // Native inputs go through the same check.
        let t = Tensor::new(&[1.0f32], &Device::Cpu).unwrap();
        assert!(coerce(&ArrayValue::from(&t), &bad).is_err());
    }
}
