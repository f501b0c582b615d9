// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Common traits shared across the crate.
//!
//! ## Core Traits
//!
//! - [`ValidatableConfig`] - Configuration validation interface
//! - [`Module`] - Object-safe view of a callable computation unit, used by
//!   [`Sequential`](crate::Sequential) to compose heterogeneous layers
//!
//! Layer authors implement [`Layer`](crate::Layer) instead; wrapping it in a
//! [`Unit`](crate::Unit) provides the `Module` implementation.

use crate::error::Result;
use crate::value::ArrayValue;

/// Configuration validation trait.
///
/// All configuration structs implement this trait; constructors call
/// `validate()` before using a config.
///
/// # Example
///
/// ```rust
/// use rust_ai_interop::{ValidatableConfig, InteropError, Result};
///
/// #[derive(Clone)]
/// struct ProjectionConfig {
///     width: usize,
/// }
///
/// impl ValidatableConfig for ProjectionConfig {
///     fn validate(&self) -> Result<()> {
///         if self.width == 0 {
///             return Err(InteropError::invalid_config("width must be > 0"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ValidatableConfig: Clone + Send + Sync {
    /// Validate the configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns `InteropError::InvalidConfig` if validation fails.
    fn validate(&self) -> Result<()>;
}

/// A computation unit that can be called with any accepted representation.
pub trait Module: Send + Sync {
    /// Unit name, used in summaries and log events.
    fn name(&self) -> &str;

    /// Coerce `input`, build on first use, and run the unit.
    ///
    /// # Errors
    ///
    /// Propagates `TypeConversion` and shape errors unchanged.
    fn apply_value(&self, input: ArrayValue) -> Result<ArrayValue>;

    /// Whether the unit has allocated its parameters.
    fn is_built(&self) -> bool;

    /// Number of scalar parameters (zero before build).
    fn parameter_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InteropError;

    #[derive(Clone)]
    struct TestConfig {
        value: i32,
    }

    impl ValidatableConfig for TestConfig {
        fn validate(&self) -> Result<()> {
            if self.value < 0 {
                return Err(InteropError::invalid_config("value must be non-negative"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_validatable_config() {
        let valid = TestConfig { value: 10 };
        assert!(valid.validate().is_ok());

        let invalid = TestConfig { value: -1 };
        assert!(invalid.validate().is_err());
    }
}
