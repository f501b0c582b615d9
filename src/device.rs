// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Device selection and logical device partitioning.
//!
//! A physical device is chosen CUDA-first (CPU fallback warns once), then split
//! into an ordered list of [`LogicalDevice`] contexts. A mirrored strategy runs
//! one replica per logical device.
//!
//! ## Environment Variables
//!
//! - `RUST_AI_FORCE_CPU` - Set to `1` or `true` to force CPU execution
//! - `RUST_AI_CUDA_DEVICE` - Set to device ordinal (e.g., `0`, `1`) to select GPU
//! - `RUST_AI_LOGICAL_DEVICES` - Number of logical devices to partition into
//!
//! ## Example
//!
//! ```rust
//! use rust_ai_interop::{list_logical_devices, DeviceConfig};
//!
//! let config = DeviceConfig::new().with_force_cpu(true).with_logical_devices(3);
//! let devices = list_logical_devices(&config)?;
//! assert_eq!(devices.len(), 3);
//! assert_eq!(devices[2].name(), "/device:CPU:2");
//! # Ok::<(), rust_ai_interop::InteropError>(())
//! ```

use crate::error::{InteropError, Result};
use crate::traits::ValidatableConfig;
use candle_core::Device;
use std::fmt;
use std::sync::Once;

/// Configuration for device selection.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Preferred CUDA device ordinal.
    pub cuda_device: usize,
    /// Force CPU execution (disables GPU).
    pub force_cpu: bool,
    /// Number of logical devices carved out of the physical device.
    pub logical_devices: usize,
    /// Crate name for logging (appears in warnings).
    pub crate_name: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            cuda_device: 0,
            force_cpu: false,
            logical_devices: 1,
            crate_name: None,
        }
    }
}

impl DeviceConfig {
    /// Create a new device configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preferred CUDA device ordinal.
    #[must_use]
    pub fn with_cuda_device(mut self, ordinal: usize) -> Self {
        self.cuda_device = ordinal;
        self
    }

    /// Force CPU execution.
    #[must_use]
    pub fn with_force_cpu(mut self, force: bool) -> Self {
        self.force_cpu = force;
        self
    }

    /// Set the number of logical devices.
    #[must_use]
    pub fn with_logical_devices(mut self, count: usize) -> Self {
        self.logical_devices = count;
        self
    }

    /// Set crate name for logging.
    #[must_use]
    pub fn with_crate_name(mut self, name: impl Into<String>) -> Self {
        self.crate_name = Some(name.into());
        self
    }

    /// Build configuration from environment variables.
    ///
    /// Reads `RUST_AI_FORCE_CPU`, `RUST_AI_CUDA_DEVICE` and
    /// `RUST_AI_LOGICAL_DEVICES`. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RUST_AI_FORCE_CPU") {
            if val == "1" || val.eq_ignore_ascii_case("true") {
                config.force_cpu = true;
            }
        }

        if let Ok(Ok(ordinal)) = std::env::var("RUST_AI_CUDA_DEVICE").map(|v| v.parse::<usize>()) {
            config.cuda_device = ordinal;
        }

        if let Ok(Ok(count)) =
            std::env::var("RUST_AI_LOGICAL_DEVICES").map(|v| v.parse::<usize>())
        {
            config.logical_devices = count;
        }

        config
    }
}

impl ValidatableConfig for DeviceConfig {
    fn validate(&self) -> Result<()> {
        if self.logical_devices == 0 {
            return Err(InteropError::invalid_config(
                "logical_devices must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Get a device according to configuration, preferring CUDA.
///
/// 1. If `force_cpu` is set, returns CPU device with warning
/// 2. Otherwise, attempts to get CUDA device at specified ordinal
/// 3. Falls back to CPU with warning if CUDA unavailable
///
/// # Errors
///
/// Returns error only if device creation fails entirely (rare).
pub fn get_device(config: &DeviceConfig) -> Result<Device> {
    let crate_name = config.crate_name.as_deref().unwrap_or("rust-ai-interop");

    if config.force_cpu {
        tracing::warn!("{crate_name}: CPU device forced via configuration");
        return Ok(Device::Cpu);
    }

    match Device::cuda_if_available(config.cuda_device) {
        Ok(Device::Cuda(cuda)) => {
            tracing::info!(
                "{crate_name}: using CUDA device {}",
                config.cuda_device
            );
            Ok(Device::Cuda(cuda))
        }
        Ok(Device::Cpu) | Err(_) => {
            warn_if_cpu(&Device::Cpu, crate_name);
            Ok(Device::Cpu)
        }
        Ok(device) => Ok(device),
    }
}

/// One execution context in an ordered device list.
///
/// Several logical devices may share the same physical [`Device`].
#[derive(Debug, Clone)]
pub struct LogicalDevice {
    index: usize,
    name: String,
    device: Device,
}

impl LogicalDevice {
    /// Create a logical device with a placement-style name derived from `device`.
    #[must_use]
    pub fn new(index: usize, device: Device) -> Self {
        let kind = if device.is_cuda() {
            "GPU"
        } else if device.is_metal() {
            "METAL"
        } else {
            "CPU"
        };
        Self {
            index,
            name: format!("/device:{kind}:{index}"),
            device,
        }
    }

    /// Position in the device list.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Placement name, e.g. `/device:CPU:1`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical device backing this context.
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl fmt::Display for LogicalDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Partition the configured physical device into ordered logical devices.
///
/// # Errors
///
/// Returns `InvalidConfig` when `logical_devices` is zero.
pub fn list_logical_devices(config: &DeviceConfig) -> Result<Vec<LogicalDevice>> {
    config.validate()?;
    let device = get_device(config)?;
    let devices: Vec<LogicalDevice> = (0..config.logical_devices)
        .map(|index| LogicalDevice::new(index, device.clone()))
        .collect();
    tracing::debug!(
        target: "rust_ai_interop::device",
        count = devices.len(),
        "partitioned logical devices"
    );
    Ok(devices)
}

/// Emit a one-time warning if running on CPU.
///
/// The warning is emitted only once per process to avoid log spam.
pub fn warn_if_cpu(device: &Device, crate_name: &str) {
    static WARN_ONCE: Once = Once::new();

    if matches!(device, Device::Cpu) {
        WARN_ONCE.call_once(|| {
            tracing::warn!(
                "{crate_name}: CPU device in use. \
                 Set RUST_AI_FORCE_CPU=1 to make this choice explicit."
            );
        });
    }
}
