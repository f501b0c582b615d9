// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Logging setup and value rendering.
//!
//! Coercion, unit builds and strategy runs emit `tracing` events under the
//! `rust_ai_interop::*` targets. This module installs a `tracing-subscriber`
//! formatter for them and provides helpers that render values the way the
//! walkthrough displays shapes and results.
//!
//! - **Environment-driven**: `RUST_LOG` overrides the configured default level
//! - **Idempotent init**: repeated [`init_logging`] calls are no-ops

use crate::strategy::PerReplica;
use crate::value::ArrayValue;
use std::sync::Once;

/// Target prefix shared by every event this crate emits.
pub const INTEROP_TARGET: &str = "rust_ai_interop";

/// Configuration for logging initialization.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for everything outside this crate when `RUST_LOG` is not set.
    pub default_level: LogLevel,
    /// Level for `rust_ai_interop::*` targets; `None` follows `default_level`.
    pub interop_level: Option<LogLevel>,
    /// Include timestamps in log output.
    pub with_timestamps: bool,
    /// Include the event target, e.g. `rust_ai_interop::strategy`.
    pub with_target: bool,
    /// Use ANSI colors.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            interop_level: None,
            with_timestamps: true,
            with_target: true,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Create a new logging configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level for targets outside this crate.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Set the level for this crate's build, coercion and replica events.
    #[must_use]
    pub fn with_interop_level(mut self, level: LogLevel) -> Self {
        self.interop_level = Some(level);
        self
    }

    /// Enable or disable timestamps.
    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.with_timestamps = enable;
        self
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    /// Unit builds and replica dispatch at `debug`, everything else at `warn`.
    ///
    /// Used by the walkthrough demo to show when layers build and how replicas
    /// fan out without Candle's own chatter.
    #[must_use]
    pub fn walkthrough() -> Self {
        Self {
            default_level: LogLevel::Warn,
            interop_level: Some(LogLevel::Debug),
            with_timestamps: false,
            with_target: true,
            with_ansi: true,
        }
    }

    /// Only warnings, e.g. replica failures and the CPU fallback notice.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            default_level: LogLevel::Warn,
            interop_level: None,
            with_timestamps: false,
            with_target: false,
            with_ansi: false,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(&self) -> String {
        let base = self.default_level.as_str();
        match self.interop_level {
            Some(level) if level != self.default_level => {
                format!("{base},{INTEROP_TARGET}={}", level.as_str())
            }
            _ => base.to_string(),
        }
    }
}

/// Log level enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and above.
    Warn,
    /// Informational messages and above.
    #[default]
    Info,
    /// Debug messages and above.
    Debug,
    /// All messages including trace.
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

/// Guard ensuring logging is only initialized once.
static INIT_LOGGING: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Call once at startup; later calls do nothing. `RUST_LOG`, when set, replaces
/// [`LogConfig::directives`] entirely.
///
/// ## Example
///
/// ```rust
/// use rust_ai_interop::{init_logging, LogConfig, LogLevel};
///
/// init_logging(&LogConfig::new().with_interop_level(LogLevel::Debug));
/// ```
pub fn init_logging(config: &LogConfig) {
    INIT_LOGGING.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.directives());

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target);

        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = if config.with_timestamps {
            builder.try_init()
        } else {
            builder.without_time().try_init()
        };
    });
}

/// Log a one-line summary of a value at `info` level.
///
/// Renders shape, dtype and (for native tensors) device, the way the
/// walkthrough prints intermediate results.
///
/// ## Example
///
/// ```rust
/// use rust_ai_interop::{log_value, ArrayValue};
///
/// log_value("input", &ArrayValue::from([[1.0, 2.0]]));
/// ```
pub fn log_value(label: &str, value: &ArrayValue) {
    tracing::info!(
        target: "rust_ai_interop::values",
        label,
        kind = value.kind(),
        summary = %value,
        "value"
    );
}

/// Log the outcome of a strategy run at `debug` level.
pub fn log_replica_results<T: std::fmt::Debug>(label: &str, results: &PerReplica<T>) {
    tracing::debug!(
        target: "rust_ai_interop::strategy",
        label,
        replicas = results.len(),
        values = ?results.values(),
        "replica results"
    );
}
