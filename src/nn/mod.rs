// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Built-in layers.
//!
//! - [`Dense`] - affine projection with optional bias and activation
//! - [`ActivationLayer`] - elementwise [`Activation`]
//!
//! Both return native tensors from `forward`.

mod activation;
mod dense;
mod init;

pub use activation::{Activation, ActivationLayer};
pub use dense::{Dense, DenseConfig, DenseState};
pub use init::Initializer;
