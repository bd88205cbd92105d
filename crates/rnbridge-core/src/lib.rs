//! rnbridge Core API
//!
//! This crate provides the stable definitions shared by every rnbridge component:
//! registration identifiers, request/event/response payloads, the callback traits
//! handlers and listeners implement, the `TransportBackend` contract the bridge
//! forwards to once it is ready, the one-shot readiness channel, configuration
//! and errors.
//!
//! The queuing engine itself lives in `rnbridge-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod errors;
pub mod listener;
pub mod message;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::BridgeConfig;
pub use errors::{BridgeError, BridgeResult, Result};
pub use listener::{
    EventListener, EventListenerRef, RequestHandler, RequestHandlerRef, ResponseCallback,
    ResponseListener, ResponseListenerRef,
};
pub use message::{BridgeEvent, BridgeRequest, BridgeResponse, FailureMessage};
pub use transport::{
    ready_channel, ReadyNotifier, ReadySignal, TransportBackend, TransportBackendRef,
};
pub use types::Identifier;
