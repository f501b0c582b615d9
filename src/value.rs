// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Accepted input representations.
//!
//! Every computation unit accepts an [`ArrayValue`]: a native tensor, a compat
//! array, or a scalar/sequence [`Literal`]. Units coerce the value to a native
//! tensor at entry (see [`coerce`](crate::coerce)).

use crate::compat::CompatArray;
use crate::dtype::DTypeExt;
use crate::error::{InteropError, Result};
use candle_core::Tensor;
use ndarray::{Array, Dimension};
use std::fmt;

/// Scalar or (possibly nested) sequence literal.
///
/// ```rust
/// use rust_ai_interop::Literal;
///
/// let lit = Literal::from([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(lit.shape()?, vec![2, 2]);
/// # Ok::<(), rust_ai_interop::InteropError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Floating-point scalar.
    Float(f64),
    /// Integer scalar.
    Int(i64),
    /// Boolean scalar.
    Bool(bool),
    /// Sequence of literals; must be rectangular to be coerced.
    List(Vec<Literal>),
}

impl Literal {
    /// Shape implied by the nesting.
    ///
    /// Scalars have shape `[]`, an empty list has shape `[0]`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for ragged sequences.
    pub fn shape(&self) -> Result<Vec<usize>> {
        let Self::List(items) = self else {
            return Ok(Vec::new());
        };
        let Some((first, rest)) = items.split_first() else {
            return Ok(vec![0]);
        };
        let inner = first.shape()?;
        for item in rest {
            let other = item.shape()?;
            if other != inner {
                return Err(InteropError::dim_mismatch(format!(
                    "ragged nested sequence: element shapes {inner:?} and {other:?}"
                )));
            }
        }
        let mut shape = Vec::with_capacity(inner.len() + 1);
        shape.push(items.len());
        shape.extend(inner);
        Ok(shape)
    }

    /// Scalars in row-major order.
    pub(crate) fn scalars(&self) -> Vec<&Literal> {
        fn walk<'a>(lit: &'a Literal, out: &mut Vec<&'a Literal>) {
            match lit {
                Literal::List(items) => items.iter().for_each(|item| walk(item, out)),
                scalar => out.push(scalar),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Literal>, const N: usize> From<[T; N]> for Literal {
    fn from(items: [T; N]) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Tagged union of the representations a unit accepts.
#[derive(Debug, Clone)]
pub enum ArrayValue {
    /// Native Candle tensor.
    Native(Tensor),
    /// NumPy-style array.
    Compat(CompatArray),
    /// Scalar or sequence literal.
    Literal(Literal),
}

impl ArrayValue {
    /// Representation name used in summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Native(_) => "NativeTensor",
            Self::Compat(_) => "CompatArray",
            Self::Literal(_) => "Literal",
        }
    }

    /// Logical shape of the value.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for ragged literals.
    pub fn shape(&self) -> Result<Vec<usize>> {
        match self {
            Self::Native(t) => Ok(t.dims().to_vec()),
            Self::Compat(a) => Ok(a.shape().to_vec()),
            Self::Literal(l) => l.shape(),
        }
    }

    /// Whether this is a native tensor.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Whether this is a compat array.
    #[must_use]
    pub fn is_compat(&self) -> bool {
        matches!(self, Self::Compat(_))
    }

    /// Borrow the native tensor, if this is one.
    #[must_use]
    pub fn as_native(&self) -> Option<&Tensor> {
        match self {
            Self::Native(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow the compat array, if this is one.
    #[must_use]
    pub fn as_compat(&self) -> Option<&CompatArray> {
        match self {
            Self::Compat(a) => Some(a),
            _ => None,
        }
    }
}

impl From<Tensor> for ArrayValue {
    fn from(t: Tensor) -> Self {
        Self::Native(t)
    }
}

impl From<&Tensor> for ArrayValue {
    fn from(t: &Tensor) -> Self {
        Self::Native(t.clone())
    }
}

impl From<CompatArray> for ArrayValue {
    fn from(a: CompatArray) -> Self {
        Self::Compat(a)
    }
}

impl From<Literal> for ArrayValue {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

macro_rules! impl_value_from {
    (array: $($elem:ty),*; scalar: $($scalar:ty),*) => {
        $(
            impl<D: Dimension> From<Array<$elem, D>> for ArrayValue {
                fn from(array: Array<$elem, D>) -> Self {
                    Self::Compat(array.into())
                }
            }
        )*
        $(
            impl From<$scalar> for ArrayValue {
                fn from(v: $scalar) -> Self {
                    Self::Literal(v.into())
                }
            }
        )*
    };
}

impl_value_from!(array: f32, f64, i32, i64, u8, u32, bool; scalar: f32, f64, i32, i64, bool);

impl<T: Into<Literal>> From<Vec<T>> for ArrayValue {
    fn from(items: Vec<T>) -> Self {
        Self::Literal(items.into())
    }
}

impl<T: Into<Literal>, const N: usize> From<[T; N]> for ArrayValue {
    fn from(items: [T; N]) -> Self {
        Self::Literal(items.into())
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(t) => write!(
                f,
                "NativeTensor(shape={:?}, dtype={}, device={:?})",
                t.dims(),
                t.dtype().name(),
                t.device().location()
            ),
            Self::Compat(a) => write!(f, "CompatArray(shape={:?}, dtype={})", a.shape(), a.dtype()),
            Self::Literal(l) => match l.shape() {
                Ok(shape) => write!(f, "Literal(shape={shape:?})"),
                Err(_) => f.write_str("Literal(ragged)"),
            },
        }
    }
}
