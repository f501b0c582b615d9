// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! NumPy-style arrays backed by `ndarray`.
//!
//! [`CompatArray`] presents the same data a native tensor holds through an
//! `ndarray` surface. Conversion to a native tensor goes through
//! [`coerce`](crate::coerce); [`CompatArray::from_tensor`] goes the other way.
//!
//! ```rust
//! use ndarray::array;
//! use rust_ai_interop::CompatArray;
//!
//! let x = CompatArray::from(array![[1.0f32, 2.0], [3.0, 4.0]]);
//! assert_eq!(x.shape(), &[2, 2]);
//! assert_eq!(x.dtype().name(), "float32");
//! ```

use crate::dtype::{unsupported_bool, CompatDType};
use crate::error::{InteropError, Result};
use candle_core::{DType, Tensor};
use ndarray::{Array, ArrayD, Dimension, IxDyn};

/// An n-dimensional array with a NumPy-style element type.
#[derive(Debug, Clone, PartialEq)]
pub enum CompatArray {
    /// `float32` elements.
    F32(ArrayD<f32>),
    /// `float64` elements.
    F64(ArrayD<f64>),
    /// `int32` elements.
    I32(ArrayD<i32>),
    /// `int64` elements.
    I64(ArrayD<i64>),
    /// `uint8` elements.
    U8(ArrayD<u8>),
    /// `uint32` elements.
    U32(ArrayD<u32>),
    /// `bool` elements.
    Bool(ArrayD<bool>),
}

macro_rules! dispatch {
    ($self:expr, $array:ident => $body:expr) => {
        match $self {
            CompatArray::F32($array) => $body,
            CompatArray::F64($array) => $body,
            CompatArray::I32($array) => $body,
            CompatArray::I64($array) => $body,
            CompatArray::U8($array) => $body,
            CompatArray::U32($array) => $body,
            CompatArray::Bool($array) => $body,
        }
    };
}

macro_rules! impl_from_array {
    ($($elem:ty => $variant:ident),* $(,)?) => {
        $(
            impl<D: Dimension> From<Array<$elem, D>> for CompatArray {
                fn from(array: Array<$elem, D>) -> Self {
                    Self::$variant(array.into_dyn())
                }
            }
        )*
    };
}

impl_from_array! {
    f32 => F32,
    f64 => F64,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u32 => U32,
    bool => Bool,
}

impl CompatArray {
    /// Element type of the array.
    #[must_use]
    pub fn dtype(&self) -> CompatDType {
        match self {
            Self::F32(_) => CompatDType::F32,
            Self::F64(_) => CompatDType::F64,
            Self::I32(_) => CompatDType::I32,
            Self::I64(_) => CompatDType::I64,
            Self::U8(_) => CompatDType::U8,
            Self::U32(_) => CompatDType::U32,
            Self::Bool(_) => CompatDType::Bool,
        }
    }

    /// Dimensions of the array.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    /// Number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        dispatch!(self, a => a.ndim())
    }

    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    /// Whether the array holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expose a native tensor as a compat array.
    ///
    /// Half-precision floats widen to `float32`.
    ///
    /// # Errors
    ///
    /// Returns `TypeConversion` for native dtypes with no compat element type.
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        let shape = IxDyn(tensor.dims());
        let flat = tensor.reshape((tensor.elem_count(),))?;
        let array = match CompatDType::from_native(tensor.dtype())? {
            CompatDType::F32 => Self::F32(ArrayD::from_shape_vec(
                shape,
                flat.to_dtype(DType::F32)?.to_vec1::<f32>()?,
            )?),
            CompatDType::F64 => Self::F64(ArrayD::from_shape_vec(shape, flat.to_vec1::<f64>()?)?),
            CompatDType::I64 => Self::I64(ArrayD::from_shape_vec(shape, flat.to_vec1::<i64>()?)?),
            CompatDType::U8 => Self::U8(ArrayD::from_shape_vec(shape, flat.to_vec1::<u8>()?)?),
            CompatDType::U32 => Self::U32(ArrayD::from_shape_vec(shape, flat.to_vec1::<u32>()?)?),
            other => {
                return Err(InteropError::type_conversion(
                    format!("{} tensor", tensor.dtype().as_str()),
                    format!("{other} is not produced from native tensors"),
                ))
            }
        };
        Ok(array)
    }

    /// Numeric view as `float64`.
    ///
    /// # Errors
    ///
    /// Returns `TypeConversion` for boolean arrays.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Result<ArrayD<f64>> {
        Ok(match self {
            Self::F32(a) => a.mapv(f64::from),
            Self::F64(a) => a.clone(),
            Self::I32(a) => a.mapv(f64::from),
            Self::I64(a) => a.mapv(|v| v as f64),
            Self::U8(a) => a.mapv(f64::from),
            Self::U32(a) => a.mapv(f64::from),
            Self::Bool(_) => return Err(unsupported_bool()),
        })
    }

    /// Numeric view as `float32`.
    ///
    /// # Errors
    ///
    /// Returns `TypeConversion` for boolean arrays.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn to_f32(&self) -> Result<ArrayD<f32>> {
        Ok(match self {
            Self::F32(a) => a.clone(),
            Self::F64(a) => a.mapv(|v| v as f32),
            Self::I32(a) => a.mapv(|v| v as f32),
            Self::I64(a) => a.mapv(|v| v as f32),
            Self::U8(a) => a.mapv(f32::from),
            Self::U32(a) => a.mapv(|v| v as f32),
            Self::Bool(_) => return Err(unsupported_bool()),
        })
    }
}
