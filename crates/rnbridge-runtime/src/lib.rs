//! rnbridge Runtime Engine
//!
//! This crate contains the queuing engine behind the bridge:
//! - `Bridge`: the facade application code calls, queuing until ready
//! - `QueueState`: the handler, listener, request and event queues
//! - `ReadinessGate`: the one-way `NotReady -> Flushing -> Ready` switch
//! - `BridgeBuilder`: wiring to the transport's readiness channel
//!
//! `rnbridge-core` provides the stable API definitions this engine works with.

pub mod bridge;
pub mod builder;
pub mod gate;
pub mod queue;

pub use bridge::{Bridge, FlushReport};
pub use builder::{create_test_bridge, BridgeBuilder, BridgeHandle};
pub use gate::GateState;
pub use queue::{FlushPhase, PendingSummary};

// Re-export core types for convenience
pub use rnbridge_core::{
    ready_channel, BridgeConfig, BridgeError, BridgeEvent, BridgeRequest, BridgeResponse,
    BridgeResult, EventListener, EventListenerRef, FailureMessage, Identifier, ReadyNotifier,
    ReadySignal, RequestHandler, RequestHandlerRef, ResponseCallback, ResponseListener,
    ResponseListenerRef, TransportBackend, TransportBackendRef,
};
