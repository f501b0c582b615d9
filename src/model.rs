// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Ordered composition of computation units.
//!
//! ```rust
//! use rust_ai_interop::{Activation, ActivationLayer, Dense, Sequential, Unit};
//!
//! let model = Sequential::new()
//!     .add(Unit::new(Dense::new(8)?))
//!     .add(Unit::new(ActivationLayer::new(Activation::Relu)))
//!     .add(Unit::new(Dense::new(2)?));
//! let y = model.call([[1.0, 2.0, 3.0]])?;
//! assert_eq!(y.shape()?, vec![1, 2]);
//! # Ok::<(), rust_ai_interop::InteropError>(())
//! ```

use crate::error::Result;
use crate::traits::Module;
use crate::value::ArrayValue;
use std::fmt::Write as _;

/// A model that feeds each unit's output to the next.
#[derive(Default)]
pub struct Sequential {
    units: Vec<Box<dyn Module>>,
}

impl Sequential {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit (builder style).
    #[must_use]
    pub fn add(mut self, unit: impl Module + 'static) -> Self {
        self.push(unit);
        self
    }

    /// Append a unit.
    pub fn push(&mut self, unit: impl Module + 'static) {
        self.units.push(Box::new(unit));
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the model has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in call order.
    pub fn units(&self) -> impl Iterator<Item = &dyn Module> {
        self.units.iter().map(AsRef::as_ref)
    }

    /// Run `input` through every unit in order.
    ///
    /// An empty model returns its input unchanged.
    ///
    /// # Errors
    ///
    /// The first unit failure is returned as-is; no partial result is kept.
    pub fn call(&self, input: impl Into<ArrayValue>) -> Result<ArrayValue> {
        self.units
            .iter()
            .try_fold(input.into(), |value, unit| unit.apply_value(value))
    }

    /// Whether every unit has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.units.iter().all(|u| u.is_built())
    }

    /// Total scalar parameters across built units.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.units.iter().map(|u| u.parameter_count()).sum()
    }

    /// One line per unit with its parameter count.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (i, unit) in self.units.iter().enumerate() {
            let _ = writeln!(
                out,
                "{i:>3}  {:<16} params={}{}",
                unit.name(),
                unit.parameter_count(),
                if unit.is_built() { "" } else { " (unbuilt)" }
            );
        }
        let _ = write!(out, "total params={}", self.parameter_count());
        out
    }
}

impl Module for Sequential {
    fn name(&self) -> &str {
        "sequential"
    }

    fn apply_value(&self, input: ArrayValue) -> Result<ArrayValue> {
        self.call(input)
    }

    fn is_built(&self) -> bool {
        Sequential::is_built(self)
    }

    fn parameter_count(&self) -> usize {
        Sequential::parameter_count(self)
    }
}
