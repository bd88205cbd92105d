//! rnbridge Harness
//!
//! Provides an in-process `TransportBackend` and recording callbacks that
//! tests, demos and higher-level crates use to observe what the bridge
//! delivers and in which order.

pub mod loopback;
pub mod recorders;

pub use loopback::{BackendCall, LoopbackBackend, NO_HANDLER_CODE};
pub use recorders::{EchoHandler, FailingHandler, RecordingListener, RecordingResponder};

/// Install a `tracing` subscriber that writes through the test harness
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
