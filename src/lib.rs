// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! # rust-ai-interop
//!
//! NumPy-style arrays and Candle tensors used interchangeably by layers,
//! sequential models and a mirrored multi-device strategy.
//!
//! ## Design
//!
//! Inputs are modelled as one tagged union, [`ArrayValue`]
//! (`Native` tensor, `Compat` array, or `Literal`), and a single explicit
//! coercion function, [`coerce`], turns any of them into a native tensor at
//! unit boundaries. Nothing relies on implicit interface satisfaction.
//!
//! ## Modules
//!
//! - [`value`] / [`compat`] / [`coerce`](mod@coerce) - value representations and coercion
//! - [`layer`] - the [`Layer`] trait and the lazily built [`Unit`]
//! - [`nn`] - built-in layers ([`Dense`], [`ActivationLayer`])
//! - [`model`] - [`Sequential`] composition
//! - [`device`] / [`strategy`] - logical devices and [`MirroredStrategy`]
//! - [`error`] - the crate-wide [`InteropError`]
//! - [`logging`] - `tracing-subscriber` setup and value summaries
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use rust_ai_interop::{Dense, DeviceConfig, MirroredStrategy, Result, Unit};
//!
//! fn main() -> Result<()> {
//!     let unit = Unit::new(Dense::new(2)?);
//!
//!     // Compat array in, native tensor out.
//!     let y = unit.apply_native(array![[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]])?;
//!     assert_eq!(y.dims(), &[2, 2]);
//!
//!     // Same unit on three logical devices.
//!     let config = DeviceConfig::new().with_force_cpu(true).with_logical_devices(3);
//!     let strategy = MirroredStrategy::from_config(&config)?;
//!     let outputs = strategy.run(|_ctx| unit.apply_native([[1.0, 1.0, 1.0, 1.0]]))?;
//!     assert_eq!(outputs.len(), 3);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cuda` - Enable CUDA devices via Candle

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod coerce;
pub mod compat;
pub mod device;
pub mod dtype;
pub mod error;
pub mod layer;
pub mod logging;
pub mod model;
pub mod nn;
pub mod strategy;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use coerce::{coerce, coerced_dtype, CoercionConfig};
pub use compat::CompatArray;
pub use device::{get_device, list_logical_devices, warn_if_cpu, DeviceConfig, LogicalDevice};
pub use dtype::{is_floating_point, CompatDType, DTypeExt};
pub use error::{InteropError, Result};
pub use layer::{Layer, Parameter, Unit};
pub use logging::{init_logging, log_replica_results, log_value, LogConfig, LogLevel};
pub use model::Sequential;
pub use nn::{Activation, ActivationLayer, Dense, DenseConfig, DenseState, Initializer};
pub use strategy::{MirroredStrategy, PerReplica, ReduceOp, ReplicaContext};
pub use traits::{Module, ValidatableConfig};
pub use value::{ArrayValue, Literal};
