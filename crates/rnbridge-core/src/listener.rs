//! Callback traits for handlers and listeners
//!
//! Handlers service incoming requests by name, listeners observe events by
//! name, and response listeners receive the outcome of a sent request. All
//! of them are shared through `Arc` so the bridge can hand the same instance
//! to the transport and back to the caller on removal.

use std::sync::Arc;

use crate::message::{BridgeEvent, BridgeRequest, BridgeResponse, FailureMessage};

// ----------------------------------------------------------------------------
// Callback Traits
// ----------------------------------------------------------------------------

/// Services requests registered under a request name
pub trait RequestHandler: Send + Sync {
    /// Handle a request and report its outcome through `responder`
    fn on_request(&self, request: BridgeRequest, responder: ResponseListenerRef);
}

/// Receives events emitted under an event name
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &BridgeEvent);
}

/// Receives the outcome of a request sent through the bridge
pub trait ResponseListener: Send + Sync {
    fn on_success(&self, response: BridgeResponse);

    fn on_failure(&self, failure: FailureMessage);
}

pub type RequestHandlerRef = Arc<dyn RequestHandler>;
pub type EventListenerRef = Arc<dyn EventListener>;
pub type ResponseListenerRef = Arc<dyn ResponseListener>;

// ----------------------------------------------------------------------------
// Closure Adapters
// ----------------------------------------------------------------------------

impl<F> RequestHandler for F
where
    F: Fn(BridgeRequest, ResponseListenerRef) + Send + Sync,
{
    fn on_request(&self, request: BridgeRequest, responder: ResponseListenerRef) {
        self(request, responder)
    }
}

impl<F> EventListener for F
where
    F: Fn(&BridgeEvent) + Send + Sync,
{
    fn on_event(&self, event: &BridgeEvent) {
        self(event)
    }
}

/// Adapts a single closure over the request outcome into a `ResponseListener`
pub struct ResponseCallback<F> {
    callback: F,
}

impl<F> ResponseCallback<F>
where
    F: Fn(Result<BridgeResponse, FailureMessage>) + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }

    /// Wrap the closure into a shareable listener handle
    pub fn shared(callback: F) -> ResponseListenerRef {
        Arc::new(Self::new(callback))
    }
}

impl<F> ResponseListener for ResponseCallback<F>
where
    F: Fn(Result<BridgeResponse, FailureMessage>) + Send + Sync,
{
    fn on_success(&self, response: BridgeResponse) {
        (self.callback)(Ok(response))
    }

    fn on_failure(&self, failure: FailureMessage) {
        (self.callback)(Err(failure))
    }
}
