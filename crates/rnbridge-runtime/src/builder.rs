//! Bridge Builder API
//!
//! Wires a `Bridge` to the transport's readiness channel. The builder spawns a
//! watcher task that waits for the `ReadySignal`, reports a transport that is
//! slow to come up, and opens the bridge once the backend arrives.

use core::time::Duration;

use rnbridge_core::{BridgeConfig, BridgeError, BridgeResult, ReadySignal};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bridge::{Bridge, FlushReport};

// ----------------------------------------------------------------------------
// Bridge Builder
// ----------------------------------------------------------------------------

/// Builder for a readiness-gated bridge
#[derive(Debug, Clone, Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
}

impl BridgeBuilder {
    /// Create a new bridge builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bridge configuration
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the pending-entry count above which a warning is logged
    pub fn queue_warning_threshold(mut self, threshold: usize) -> Self {
        self.config.queue_warning_threshold = threshold;
        self
    }

    /// Set how often a missing readiness signal is reported
    pub fn ready_warning_after_secs(mut self, secs: u64) -> Self {
        self.config.ready_warning_after_secs = secs;
        self
    }

    /// Enable/disable debug logging of every queued operation
    pub fn log_queued_operations(mut self, enabled: bool) -> Self {
        self.config.log_queued_operations = enabled;
        self
    }

    /// Build a bridge that the caller opens manually
    pub fn build(self) -> BridgeResult<Bridge> {
        self.config.validate().map_err(BridgeError::config_error)?;
        Ok(Bridge::new(self.config))
    }

    /// Build the bridge and open it as soon as `signal` fires
    pub async fn build_and_start(self, signal: ReadySignal) -> BridgeResult<BridgeHandle> {
        let warn_after = self.config.ready_warning_after();
        let bridge = self.build()?;

        info!("Starting bridge, waiting for the transport to become ready");
        let watcher = tokio::spawn(watch_readiness(bridge.clone(), signal, warn_after));

        Ok(BridgeHandle {
            bridge,
            watcher: Some(watcher),
            report: None,
        })
    }
}

async fn watch_readiness(
    bridge: Bridge,
    signal: ReadySignal,
    warn_after: Duration,
) -> BridgeResult<FlushReport> {
    let ready = signal.wait();
    tokio::pin!(ready);

    let mut ticker = tokio::time::interval(warn_after);
    // The first tick completes immediately
    ticker.tick().await;
    let mut waited = Duration::ZERO;

    let backend = loop {
        tokio::select! {
            backend = &mut ready => break backend,
            _ = ticker.tick() => {
                waited += warn_after;
                warn!(
                    "Transport still not ready after {:?}; {} bridge operations queued",
                    waited,
                    bridge.pending().total()
                );
            }
        }
    };

    let Some(backend) = backend else {
        error!("Transport dropped its ready notifier; queued bridge operations will not be delivered");
        return Err(BridgeError::channel_error(
            "Ready notifier dropped before the transport became ready",
        ));
    };

    // Backend calls are synchronous; keep the flush off the async workers
    tokio::task::spawn_blocking(move || bridge.open(backend))
        .await
        .map_err(|e| BridgeError::channel_error(format!("Bridge flush task panicked: {}", e)))?
}

// ----------------------------------------------------------------------------
// Bridge Handle
// ----------------------------------------------------------------------------

/// Handle to a bridge whose readiness is being watched
pub struct BridgeHandle {
    bridge: Bridge,
    watcher: Option<JoinHandle<BridgeResult<FlushReport>>>,
    report: Option<FlushReport>,
}

impl BridgeHandle {
    /// Get a bridge handle for issuing calls
    pub fn bridge(&self) -> Bridge {
        self.bridge.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.bridge.is_ready()
    }

    /// Check if the readiness watcher is still running
    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the transport to become ready and the flush to complete
    pub async fn wait_ready(&mut self) -> BridgeResult<FlushReport> {
        if let Some(report) = self.report {
            return Ok(report);
        }

        let Some(handle) = self.watcher.take() else {
            return Err(BridgeError::channel_error("Readiness watcher is not running"));
        };

        let report = match handle.await {
            Ok(result) => result?,
            Err(e) => {
                return Err(BridgeError::Channel {
                    message: format!("Readiness watcher panicked: {}", e),
                })
            }
        };
        self.report = Some(report);
        Ok(report)
    }

    /// Stop watching for readiness
    ///
    /// Queued operations stay queued; the bridge can still be opened manually.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.watcher.take() {
            handle.abort();
            info!("Bridge readiness watcher stopped");
        }
    }
}

impl core::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("bridge", &self.bridge)
            .field("watching", &self.is_watching())
            .field("report", &self.report)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Convenience Functions
// ----------------------------------------------------------------------------

/// Create an unopened bridge with testing configuration
pub fn create_test_bridge() -> Bridge {
    Bridge::new(BridgeConfig::testing())
}
