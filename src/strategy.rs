// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Mirrored replica dispatch.
//!
//! [`MirroredStrategy::run`] invokes one callable once per logical device and
//! collects the per-replica results in replica order. Replicas run in parallel
//! on the rayon pool by default. If any replica fails the run fails with
//! `ReplicaFailure` and no partial results are returned.
//!
//! ```rust
//! use rust_ai_interop::{DeviceConfig, MirroredStrategy};
//!
//! let config = DeviceConfig::new().with_force_cpu(true).with_logical_devices(3);
//! let strategy = MirroredStrategy::from_config(&config)?;
//! let out = strategy.run(|ctx| Ok(ctx.replica_id() * 5))?;
//! assert_eq!(out.values(), &[0, 5, 10]);
//! # Ok::<(), rust_ai_interop::InteropError>(())
//! ```

use crate::coerce::CoercionConfig;
use crate::device::{list_logical_devices, DeviceConfig, LogicalDevice};
use crate::error::{InteropError, Result};
use candle_core::Tensor;
use rayon::prelude::*;
use std::ops::Index;

/// Identity of one replica invocation.
#[derive(Debug, Clone, Copy)]
pub struct ReplicaContext<'a> {
    replica_id: usize,
    num_replicas: usize,
    device: &'a LogicalDevice,
}

impl<'a> ReplicaContext<'a> {
    /// Index of this replica, equal to its device's position.
    #[must_use]
    pub fn replica_id(&self) -> usize {
        self.replica_id
    }

    /// Total number of replicas in the run.
    #[must_use]
    pub fn num_replicas(&self) -> usize {
        self.num_replicas
    }

    /// Logical device this replica runs on.
    #[must_use]
    pub fn device(&self) -> &'a LogicalDevice {
        self.device
    }

    /// Coercion configuration placing values on this replica's device.
    #[must_use]
    pub fn coercion(&self) -> CoercionConfig {
        CoercionConfig::new(self.device.device().clone())
    }
}

/// Results of a strategy run, one per replica, in replica order.
#[derive(Debug, Clone, PartialEq)]
pub struct PerReplica<T> {
    values: Vec<T>,
}

impl<T> PerReplica<T> {
    /// Number of replicas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value produced by `replica`.
    #[must_use]
    pub fn get(&self, replica: usize) -> Option<&T> {
        self.values.get(replica)
    }

    /// All values in replica order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate values in replica order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Take ownership of the values.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T> Index<usize> for PerReplica<T> {
    type Output = T;

    fn index(&self, replica: usize) -> &T {
        &self.values[replica]
    }
}

impl<T> IntoIterator for PerReplica<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PerReplica<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Cross-replica reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Elementwise sum.
    Sum,
    /// Elementwise mean.
    Mean,
}

/// Fan-out/fan-in executor over a fixed, ordered set of logical devices.
#[derive(Debug, Clone)]
pub struct MirroredStrategy {
    devices: Vec<LogicalDevice>,
    parallel: bool,
}

impl MirroredStrategy {
    /// Create a strategy over `devices`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `devices` is empty.
    pub fn new(devices: Vec<LogicalDevice>) -> Result<Self> {
        if devices.is_empty() {
            return Err(InteropError::invalid_config(
                "a strategy needs at least one device",
            ));
        }
        tracing::info!(
            target: "rust_ai_interop::strategy",
            replicas = devices.len(),
            devices = ?devices.iter().map(LogicalDevice::name).collect::<Vec<_>>(),
            "created mirrored strategy"
        );
        Ok(Self {
            devices,
            parallel: true,
        })
    }

    /// Create a strategy over the logical devices described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an invalid device configuration.
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        Self::new(list_logical_devices(config)?)
    }

    /// Run replicas on the rayon pool (`true`, default) or one after another.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of replicas per run.
    #[must_use]
    pub fn num_replicas(&self) -> usize {
        self.devices.len()
    }

    /// Devices in replica order.
    #[must_use]
    pub fn devices(&self) -> &[LogicalDevice] {
        &self.devices
    }

    /// Invoke `f` once per device and collect the results in replica order.
    ///
    /// # Errors
    ///
    /// Returns `ReplicaFailure` wrapping the error of a failing replica. When
    /// several replicas fail in a parallel run, which one is reported is
    /// unspecified.
    pub fn run<T, F>(&self, f: F) -> Result<PerReplica<T>>
    where
        T: Send,
        F: Fn(&ReplicaContext<'_>) -> Result<T> + Sync,
    {
        let num_replicas = self.devices.len();
        let contexts: Vec<ReplicaContext<'_>> = self
            .devices
            .iter()
            .enumerate()
            .map(|(replica_id, device)| ReplicaContext {
                replica_id,
                num_replicas,
                device,
            })
            .collect();

        tracing::debug!(
            target: "rust_ai_interop::strategy",
            replicas = num_replicas,
            parallel = self.parallel,
            "dispatching replicas"
        );

        let call = |ctx: &ReplicaContext<'_>| {
            f(ctx).map_err(|err| {
                tracing::warn!(
                    target: "rust_ai_interop::strategy",
                    replica = ctx.replica_id,
                    device = ctx.device.name(),
                    error = %err,
                    "replica failed"
                );
                InteropError::replica_failure(ctx.replica_id, ctx.device.name(), err)
            })
        };

        let values = if self.parallel {
            contexts.par_iter().map(call).collect::<Result<Vec<T>>>()?
        } else {
            contexts.iter().map(call).collect::<Result<Vec<T>>>()?
        };
        Ok(PerReplica { values })
    }

    /// Combine per-replica tensors on the first device.
    ///
    /// `Mean` divides in the replicas' dtype, so integer replicas get a
    /// truncated integer mean.
    ///
    /// # Errors
    ///
    /// Propagates Candle errors, e.g. when replica shapes differ.
    pub fn reduce(&self, op: ReduceOp, values: &PerReplica<Tensor>) -> Result<Tensor> {
        if values.is_empty() {
            return Err(InteropError::invalid_config("nothing to reduce"));
        }
        let target = self.devices[0].device();
        let gathered = values
            .iter()
            .map(|t| t.to_device(target))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let summed = Tensor::stack(&gathered, 0)?.sum(0)?;
        match op {
            ReduceOp::Sum => Ok(summed),
            ReduceOp::Mean => {
                let count = u32::try_from(values.len()).map_err(|_| {
                    InteropError::invalid_config("too many replicas to average")
                })?;
                let count = Tensor::new(count, target)?.to_dtype(summed.dtype())?;
                Ok(summed.broadcast_div(&count)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn strategy(n: usize) -> MirroredStrategy {
        MirroredStrategy::from_config(
            &DeviceConfig::new()
                .with_force_cpu(true)
                .with_logical_devices(n),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_device_list_rejected() {
        assert!(MirroredStrategy::new(Vec::new()).is_err());
    }

    #[test]
    fn test_results_in_replica_order() {
        let out = strategy(3).run(|ctx| Ok(ctx.replica_id() * 5)).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.values(), &[0, 5, 10]);
        assert_eq!(out[2], 10);
    }

    #[test]
    fn test_order_independent_of_completion_time() {
        let out = strategy(4)
            .run(|ctx| {
                let delay = (ctx.num_replicas() - ctx.replica_id()) as u64 * 5;
                std::thread::sleep(std::time::Duration::from_millis(delay));
                Ok(ctx.replica_id())
            })
            .unwrap();
        assert_eq!(out.into_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sequential_mode() {
        let out = strategy(2)
            .with_parallel(false)
            .run(|ctx| Ok(ctx.device().name().to_string()))
            .unwrap();
        assert_eq!(out.values(), &["/device:CPU:0", "/device:CPU:1"]);
    }

    #[test]
    fn test_one_failure_fails_run() {
        let err = strategy(3)
            .run(|ctx| {
                if ctx.replica_id() == 1 {
                    Err(InteropError::dim_mismatch("boom"))
                } else {
                    Ok(ctx.replica_id())
                }
            })
            .unwrap_err();
        match err {
            InteropError::ReplicaFailure { replica, device, .. } => {
                assert_eq!(replica, 1);
                assert_eq!(device, "/device:CPU:1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reduce_sum_and_mean() {
        let s = strategy(3);
        let out = s
            .run(|ctx| {
                let v = ctx.replica_id() as f32;
                Ok(Tensor::new(&[v, 2.0 * v], &Device::Cpu)?)
            })
            .unwrap();
        let sum = s.reduce(ReduceOp::Sum, &out).unwrap();
        assert_eq!(sum.to_vec1::<f32>().unwrap(), vec![3.0, 6.0]);
        let mean = s.reduce(ReduceOp::Mean, &out).unwrap();
        let mean = mean.to_vec1::<f32>().unwrap();
        approx::assert_relative_eq!(mean[0], 1.0, epsilon = 1e-6);
        approx::assert_relative_eq!(mean[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reduce_mean_of_integer_replicas() {
        let s = strategy(3);
        let out = s
            .run(|_ctx| Ok(Tensor::new(&[3i64, 6], &Device::Cpu)?))
            .unwrap();
        let mean = s.reduce(ReduceOp::Mean, &out).unwrap();
        assert_eq!(mean.dtype(), DType::I64);
        assert_eq!(mean.to_vec1::<i64>().unwrap(), vec![3, 6]);

        let uneven = s
            .run(|ctx| Ok(Tensor::new(&[ctx.replica_id() as u32], &Device::Cpu)?))
            .unwrap();
        // (0 + 1 + 2) / 3
        let mean = s.reduce(ReduceOp::Mean, &uneven).unwrap();
        assert_eq!(mean.to_vec1::<u32>().unwrap(), vec![1]);
    }

    #[test]
    fn test_replica_coercion_targets_device() {
        let out = strategy(2)
            .run(|ctx| {
                let t = crate::coerce(&[1.0, 2.0].into(), &ctx.coercion())?;
                Ok(t.dtype())
            })
            .unwrap();
        assert!(out.iter().all(|d| *d == DType::F64));
    }
}
