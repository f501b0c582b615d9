// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Element type mapping between compat arrays and native tensors.
//!
//! ## Why This Module Exists
//!
//! Compat arrays carry NumPy-style element types (`i32`, `bool`, ...) while
//! native tensors only know the Candle [`DType`] set. Coercion needs one place
//! that decides which element types are representable and how:
//!
//! 1. **Forward mapping**: [`CompatDType::native_dtype`] for array → tensor
//! 2. **Reverse mapping**: [`CompatDType::from_native`] for tensor → array
//! 3. **Queries**: [`DTypeExt`] for readable names and float/integer checks
//!
//! ## Design Decisions
//!
//! - **Lossless only**: `i32` widens to `i64` and half floats widen to `f32`.
//!   Anything that would need a narrowing or semantic change (booleans) is a
//!   `TypeConversion` error.

use crate::error::{InteropError, Result};
use candle_core::DType;

/// Check if a dtype is a floating-point type.
///
/// ## Example
///
/// ```rust
/// use rust_ai_interop::is_floating_point;
/// use candle_core::DType;
///
/// assert!(is_floating_point(DType::F32));
/// assert!(!is_floating_point(DType::I64));
/// ```
#[must_use]
pub fn is_floating_point(dtype: DType) -> bool {
    matches!(dtype, DType::F16 | DType::BF16 | DType::F32 | DType::F64)
}

/// Extension trait adding utility methods to `candle_core::DType`.
pub trait DTypeExt {
    /// Check if this dtype is an integer type.
    fn is_integer(&self) -> bool;

    /// Get a human-readable name for this dtype.
    ///
    /// Error messages and value summaries read better with "f32" than "`DType::F32`".
    fn name(&self) -> &'static str;
}

impl DTypeExt for DType {
    fn is_integer(&self) -> bool {
        // Matched by name so integer dtypes added in newer Candle releases are covered.
        matches!(self.as_str(), "u8" | "u32" | "i16" | "i32" | "i64")
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

/// Element types a compat array can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompatDType {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 8-bit unsigned integer.
    U8,
    /// 32-bit unsigned integer.
    U32,
    /// Boolean.
    Bool,
}

impl CompatDType {
    /// NumPy-style name of the element type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U32 => "uint32",
            Self::Bool => "bool",
        }
    }

    /// Native dtype that stores this element type without loss.
    ///
    /// # Errors
    ///
    /// Returns `TypeConversion` for element types the native type system
    /// cannot represent.
    pub fn native_dtype(&self) -> Result<DType> {
        match self {
            Self::F32 => Ok(DType::F32),
            Self::F64 => Ok(DType::F64),
            Self::I32 | Self::I64 => Ok(DType::I64),
            Self::U8 => Ok(DType::U8),
            Self::U32 => Ok(DType::U32),
            Self::Bool => Err(unsupported_bool()),
        }
    }

    /// Compat element type used to expose a native tensor of `dtype`.
    ///
    /// # Errors
    ///
    /// Returns `TypeConversion` for native dtypes without a compat counterpart.
    pub fn from_native(dtype: DType) -> Result<Self> {
        match dtype {
            DType::F16 | DType::BF16 | DType::F32 => Ok(Self::F32),
            DType::F64 => Ok(Self::F64),
            DType::I64 => Ok(Self::I64),
            DType::U8 => Ok(Self::U8),
            DType::U32 => Ok(Self::U32),
            other => Err(InteropError::type_conversion(
                format!("{} tensor", other.name()),
                "no compat array element type",
            )),
        }
    }

    /// Check if this is a floating-point element type.
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

pub(crate) fn unsupported_bool() -> InteropError {
    InteropError::type_conversion("bool array", "native tensors have no boolean dtype")
}

impl std::fmt::Display for CompatDType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_floating_point() {
        assert!(is_floating_point(DType::F32));
        assert!(is_floating_point(DType::F16));
        assert!(is_floating_point(DType::BF16));
        assert!(is_floating_point(DType::F64));
        assert!(!is_floating_point(DType::U8));
        assert!(!is_floating_point(DType::I64));
    }

    #[test]
    fn test_dtype_ext() {
        assert!(DType::I64.is_integer());
        assert!(DType::U8.is_integer());
        assert!(!DType::F32.is_integer());
        assert_eq!(DType::F32.name(), "f32");
        assert_eq!(DType::BF16.name(), "bf16");
    }

    #[test]
    fn test_native_mapping_is_lossless() {
        assert_eq!(CompatDType::F32.native_dtype().unwrap(), DType::F32);
        assert_eq!(CompatDType::F64.native_dtype().unwrap(), DType::F64);
        assert_eq!(CompatDType::I32.native_dtype().unwrap(), DType::I64);
        assert_eq!(CompatDType::U32.native_dtype().unwrap(), DType::U32);
    }

    #[test]
    fn test_bool_is_not_representable() {
        let err = CompatDType::Bool.native_dtype().unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn test_reverse_mapping_widens_half_floats() {
        assert_eq!(CompatDType::from_native(DType::F16).unwrap(), CompatDType::F32);
        assert_eq!(CompatDType::from_native(DType::BF16).unwrap(), CompatDType::F32);
        assert_eq!(CompatDType::from_native(DType::I64).unwrap(), CompatDType::I64);
    }

    #[test]
    fn test_compat_names() {
        assert_eq!(CompatDType::F64.to_string(), "float64");
        assert_eq!(CompatDType::Bool.name(), "bool");
        assert!(CompatDType::F32.is_float());
        assert!(!CompatDType::I64.is_float());
    }
}
