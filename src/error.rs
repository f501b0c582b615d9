// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Unified error type for value coercion, layers and replica dispatch.
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are surfaced
//! synchronously to the immediate caller; nothing is retried or recovered
//! internally.
//!
//! ## Error Hierarchy
//!
//! ```text
//! InteropError
//! ├── TypeConversion      - Value cannot become a native tensor (or back)
//! ├── ShapeMismatch       - Input shape incompatible with a built unit
//! ├── DimensionMismatch   - Wrong rank / arity, ragged nested literals
//! ├── ReplicaFailure      - A replica callable failed; the whole run fails
//! ├── InvalidConfig       - Configuration validation failures
//! ├── DeviceNotAvailable  - Requested device unavailable
//! └── Candle              - Underlying Candle errors
//! ```

use thiserror::Error;

/// Result type alias for rust-ai-interop operations.
pub type Result<T> = std::result::Result<T, InteropError>;

/// Errors raised while moving values between representations, applying units
/// or dispatching work across replicas.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InteropError {
    /// A value could not be coerced to a native tensor, or a native tensor
    /// could not be exposed as a compat array.
    #[error("cannot convert {from}: {reason}")]
    TypeConversion {
        /// Description of the source value (e.g. `bool array`).
        from: String,
        /// Why the conversion is impossible.
        reason: String,
    },

    /// Input shape does not match the shape a unit was built for.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape the unit was built for.
        expected: Vec<usize>,
        /// Shape received.
        actual: Vec<usize>,
    },

    /// Rank or arity violation.
    #[error("dimension mismatch: {message}")]
    DimensionMismatch {
        /// Descriptive error message.
        message: String,
    },

    /// One replica failed during a strategy run.
    ///
    /// No partial collection is returned when this is raised.
    #[error("replica {replica} on {device} failed: {source}")]
    ReplicaFailure {
        /// Index of the failing replica.
        replica: usize,
        /// Name of the logical device the replica ran on.
        device: String,
        /// Error raised by the replica callable.
        #[source]
        source: Box<InteropError>,
    },

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Requested device not available.
    #[error("device not available: {device}")]
    DeviceNotAvailable {
        /// Description of the unavailable device.
        device: String,
    },

    /// Underlying Candle error.
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl InteropError {
    /// Create a type conversion error.
    pub fn type_conversion(from: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeConversion {
            from: from.into(),
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: impl Into<Vec<usize>>, actual: impl Into<Vec<usize>>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a dimension mismatch error.
    pub fn dim_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            message: msg.into(),
        }
    }

    /// Wrap the error of a single replica.
    pub fn replica_failure(replica: usize, device: impl Into<String>, source: InteropError) -> Self {
        Self::ReplicaFailure {
            replica,
            device: device.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a device not available error.
    pub fn device_not_available(device: impl Into<String>) -> Self {
        Self::DeviceNotAvailable {
            device: device.into(),
        }
    }

    /// Whether this is one of the shape-family errors.
    #[must_use]
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. } | Self::DimensionMismatch { .. }
        )
    }

    /// Whether this is a type conversion error.
    #[must_use]
    pub fn is_type_conversion(&self) -> bool {
        matches!(self, Self::TypeConversion { .. })
    }
}

impl From<ndarray::ShapeError> for InteropError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::dim_mismatch(err.to_string())
    }
}
