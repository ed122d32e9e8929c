// src/exit.rs
//! Standardized process exit codes for `metricmap`.
//!
//! Provides a stable contract for CI gates and scripts.

use std::process::Termination;

use crate::error::MetricMapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MetricMapExit {
    /// Run completed and no gate was tripped.
    Success = 0,
    /// Unexpected runtime failure (output sink, serialization).
    Error = 1,
    /// Invalid configuration or missing root path. Nothing was scanned.
    ConfigError = 2,
    /// The report contains entries at or above the configured severity gate.
    GateFailed = 3,
}

impl MetricMapExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps a fatal error to its exit status.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<MetricMapError>() {
            Some(e) if e.is_config() => Self::ConfigError,
            _ => Self::Error,
        }
    }
}

impl Termination for MetricMapExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}
