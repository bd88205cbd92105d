//! Bridge Configuration
//!
//! Tunables for queue diagnostics and readiness monitoring. None of these
//! settings change delivery semantics: every call accepted before readiness
//! is delivered exactly once after it.

use core::time::Duration;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Bridge Configuration
// ----------------------------------------------------------------------------

/// Configuration for a bridge instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of pending entries above which a warning is logged
    ///
    /// Thousands of calls queued before the transport is ready usually point
    /// at an application bug. The queue keeps accepting entries regardless.
    pub queue_warning_threshold: usize,
    /// Log every operation that gets queued at debug level
    pub log_queued_operations: bool,
    /// Interval after which a still-missing readiness signal is reported
    pub ready_warning_after_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_warning_threshold: 1000,
            log_queued_operations: true,
            ready_warning_after_secs: 10,
        }
    }
}

impl BridgeConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            queue_warning_threshold: 64,
            log_queued_operations: true,
            ready_warning_after_secs: 1,
        }
    }

    /// Create configuration without per-operation logging
    pub fn quiet() -> Self {
        Self {
            log_queued_operations: false,
            ..Self::default()
        }
    }

    /// Readiness warning interval as a `Duration`
    pub fn ready_warning_after(&self) -> Duration {
        Duration::from_secs(self.ready_warning_after_secs)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_warning_threshold == 0 {
            return Err("queue_warning_threshold must be greater than 0".to_string());
        }

        if self.ready_warning_after_secs == 0 {
            return Err("ready_warning_after_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
